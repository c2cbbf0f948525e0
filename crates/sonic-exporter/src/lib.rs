// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod admin;
pub mod aggregator;
pub mod build_info;
pub mod config;
pub mod config_store;
pub mod error;
pub mod exporter;
pub mod exposition;
pub mod http_utils;
pub mod listener;
pub mod log_adapter;
pub mod logging;
pub mod runner;
pub mod settings;
pub mod watcher;
