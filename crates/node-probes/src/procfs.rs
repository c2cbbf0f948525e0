// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::str::FromStr;

use crate::probe::ProbeError;

pub(crate) async fn read_to_string(path: &Path) -> Result<String, ProbeError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProbeError::Read {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn parse_field<T>(path: &Path, field: &str, raw: &str) -> Result<T, ProbeError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ProbeError::Parse {
        path: path.to_path_buf(),
        reason: format!("invalid value {raw:?} for {field}: {e}"),
    })
}

pub(crate) fn parse_error(path: &Path, reason: impl Into<String>) -> ProbeError {
    ProbeError::Parse {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
