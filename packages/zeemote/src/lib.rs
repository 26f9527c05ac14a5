//! Crate for talking to Zeemote controllers over a serial-profile (RFCOMM) link. Not affiliated
//! with Zeemote Inc.
//!
//! The wire format lives in [`protocol`]. This crate adds the pieces around it: finding a
//! controller ([`Discovery`]), the byte stream to it ([`Transport`]), and a
//! [`ZeemoteConnection`] that owns the link, decodes reports from it, sends configuration
//! commands and reconnects when the link drops.

pub use zeemote_protocol as protocol;

use std::{fmt, future::Future, io};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

pub mod config;
pub mod connection;
pub mod sink;

#[cfg(feature = "serial")]
pub mod serial;

pub use config::ZeemoteConfig;
pub use connection::{ConnectionStatus, Incoming, ZeemoteConnection, ZeemoteError};

/// The serial-profile service record Zeemote controllers advertise.
pub const ZEEMOTE_SERVICE: Uuid = Uuid::from_u128(0x8e1f0cf7_508f_4875_b62c_fbb67fd34812);

/// An ordered, reliable byte stream to a controller.
///
/// Implemented for every tokio stream, so sockets, serial ports and in-memory pipes can all be
/// used directly.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Writes all of `data` to the stream.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>>;

    /// Fills `buf` completely or fails.
    fn recv_exact(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<()>>;

    /// Shuts the stream down.
    fn close(&mut self) -> impl Future<Output = io::Result<()>>;
}

impl<S: AsyncRead + AsyncWrite + Unpin> Transport for S {
    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data).await?;
        self.flush().await
    }

    async fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf).await?;
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.shutdown().await
    }
}

/// A place a controller's service can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Endpoint {
    /// Device address, or the path of an already bound serial node.
    pub address: String,
    /// RFCOMM channel. `None` when `address` already refers to a bound channel.
    pub port: Option<u8>,
    pub name: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.address)?;
        if let Some(port) = self.port {
            write!(f, ", {port}")?;
        }
        write!(f, ")")
    }
}

/// Service lookup plus stream establishment.
#[allow(async_fn_in_trait)]
pub trait Discovery {
    type Transport: Transport;

    /// Returns every endpoint currently offering `service`, in discovery order.
    fn find_services(
        &mut self,
        service: Uuid,
    ) -> impl Future<Output = io::Result<Vec<Endpoint>>>;

    /// Opens a stream to `endpoint`.
    fn open(&mut self, endpoint: &Endpoint) -> impl Future<Output = io::Result<Self::Transport>>;
}
