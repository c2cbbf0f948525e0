// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Build script for sonic-exporter.
//!
//! Embeds build metadata as compile-time environment variables read by `build_info.rs`:
//!
//! - `SONIC_EXPORTER_VERSION`: release version. The build pipeline may override it through the
//!   `SONIC_EXPORTER_VERSION` environment variable, otherwise the crate version is used.
//! - `SONIC_EXPORTER_GIT_HASH`: source revision from `GIT_HASH`, falling back to
//!   `git rev-parse --short HEAD`, and to `(no hash)` outside a checkout.
//! - `SONIC_EXPORTER_RUSTC_VERSION`: version of the compiler building the crate.

use std::env;
use std::process::Command;

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=SONIC_EXPORTER_VERSION");
    println!("cargo:rerun-if-env-changed=GIT_HASH");

    let version = env::var("SONIC_EXPORTER_VERSION")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "(devel)".into()));

    let git_hash = env::var("GIT_HASH")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "(no hash)".to_string());

    // "rustc 1.78.0 (9b00956e5 2024-04-29)" -> "1.78.0"
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = command_output(&rustc, &["--version"])
        .and_then(|v| v.split_whitespace().nth(1).map(str::to_string))
        .unwrap_or_else(|| "(unknown)".to_string());

    println!("cargo:rustc-env=SONIC_EXPORTER_VERSION={version}");
    println!("cargo:rustc-env=SONIC_EXPORTER_GIT_HASH={git_hash}");
    println!("cargo:rustc-env=SONIC_EXPORTER_RUSTC_VERSION={rustc_version}");
}
