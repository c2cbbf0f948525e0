// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Listening socket pinned to a VRF.
//!
//! A SONiC VRF is a Linux VRF device. Binding a socket to that device with `SO_BINDTODEVICE`
//! makes it accept and answer traffic only through the VRF's interfaces and routes.

use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket};
use tracing::debug;

use crate::config::ExporterConfig;
use crate::error::ExporterError;

const LISTEN_BACKLOG: u32 = 1024;

/// Binds the exporter's listener on the configured port, inside the configured VRF.
pub fn bind(config: &ExporterConfig) -> Result<TcpListener, ExporterError> {
    bind_with_hook(config.listen_addr(), attach_to_vrf(&config.vrf)).map_err(|source| {
        ExporterError::Bind {
            port: config.port,
            vrf: config.vrf.clone(),
            source,
        }
    })
}

/// Creates a listener, running `hook` on the raw socket exactly once before it is bound.
pub fn bind_with_hook<F>(addr: SocketAddr, hook: F) -> io::Result<TcpListener>
where
    F: FnOnce(&TcpSocket) -> io::Result<()>,
{
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    hook(&socket)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// Returns the bind hook for `vrf`. An empty name leaves the socket in the default VRF.
pub fn attach_to_vrf(vrf: &str) -> impl FnOnce(&TcpSocket) -> io::Result<()> + '_ {
    move |socket| {
        if vrf.is_empty() {
            return Ok(());
        }
        debug!("Binding listener to VRF device {vrf}");
        bind_device(socket, vrf)
    }
}

#[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
fn bind_device(socket: &TcpSocket, device: &str) -> io::Result<()> {
    socket.bind_device(Some(device.as_bytes()))
}

#[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
fn bind_device(_socket: &TcpSocket, device: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot bind to VRF {device}: SO_BINDTODEVICE is not available on this platform"),
    ))
}
