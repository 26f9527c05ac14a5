//! The connection manager.
//!
//! [`ZeemoteConnection`] owns the link to one controller. Reports are read with
//! [`ZeemoteConnection::decode_one`] and configuration commands are sent with the `set_*`
//! methods. The transport is only reachable through these methods, and any operation that is
//! interrupted part way through (a failed read, a dropped future) leaves the manager
//! disconnected rather than on a stream of unknown alignment.

use std::{io, mem, time::Duration};

use log::{debug, error, info, trace, warn};
use thiserror::Error;
use tokio::{select, time::sleep};
use zeemote_protocol::{
    command::{
        SetDeviceLocalNamePacket, SetIdlePacket, SetKeepAliveIntervalPacket,
        SetReportTypeEnablePacket,
    },
    report::HEADER_SIZE,
    DecodeError, Encode, HandshakeResult, LengthMismatch, ParameterError, Report, ReportHeader,
};

use crate::{
    config::ZeemoteConfig,
    sink::{mirror, DebugSink, FileSink, NullSink},
    Discovery, Endpoint, Transport,
};

/// Observable connection state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// The outcome of a successful [`ZeemoteConnection::decode_one`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete report.
    Report(Report),

    /// A report with an unrecognized identifier. Only its header was read.
    Ignored { report_id: u8, length: u8 },

    /// The link dropped and was re-established. Whatever report was in flight is lost.
    Reconnected,
}

struct Link<T> {
    transport: T,
    endpoint: Endpoint,
}

enum State<T> {
    Disconnected,
    Connecting,
    Connected(Link<T>),
}

/// Puts the state into `Connecting` for the duration of a connect attempt and falls back to
/// `Disconnected` unless the attempt completes.
struct ConnectingGuard<'a, T> {
    state: &'a mut State<T>,
}

impl<'a, T> ConnectingGuard<'a, T> {
    fn new(state: &'a mut State<T>) -> Self {
        *state = State::Connecting;
        Self { state }
    }

    fn connected(self, link: Link<T>) {
        *self.state = State::Connected(link);
    }
}

impl<T> Drop for ConnectingGuard<'_, T> {
    fn drop(&mut self) {
        if matches!(self.state, State::Connecting) {
            *self.state = State::Disconnected;
        }
    }
}

/// A managed connection to a Zeemote controller.
pub struct ZeemoteConnection<D: Discovery> {
    discovery: D,
    config: ZeemoteConfig,
    state: State<D::Transport>,
    retries: u32,
    sink: Box<dyn DebugSink>,
}

impl<D: Discovery> ZeemoteConnection<D> {
    /// Creates a disconnected manager.
    ///
    /// If the config names a capture file it is opened here. Failing to open it only disables
    /// capture for this session.
    pub fn new(discovery: D, config: ZeemoteConfig) -> Self {
        let sink: Box<dyn DebugSink> = match &config.capture_path {
            Some(path) => match FileSink::open(path) {
                Ok(sink) => {
                    debug!("Capturing raw traffic to {}", path.display());
                    Box::new(sink)
                }
                Err(e) => {
                    warn!("No debug capture for this session: {}", e);
                    Box::new(NullSink)
                }
            },
            None => Box::new(NullSink),
        };

        Self {
            discovery,
            retries: config.retry_budget,
            config,
            state: State::Disconnected,
            sink,
        }
    }

    /// Replaces the debug sink.
    pub fn with_sink(mut self, sink: impl DebugSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            State::Disconnected => ConnectionStatus::Disconnected,
            State::Connecting => ConnectionStatus::Connecting,
            State::Connected(_) => ConnectionStatus::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// The endpoint of the current connection.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match &self.state {
            State::Connected(link) => Some(&link.endpoint),
            _ => None,
        }
    }

    /// Retry budget left, shared by discovery and reconnects. This is never replenished.
    pub fn retries_remaining(&self) -> u32 {
        self.retries
    }

    pub fn config(&self) -> &ZeemoteConfig {
        &self.config
    }

    /// Finds a controller and opens a stream to it.
    ///
    /// Discovery is repeated until it returns at least one endpoint, with every fruitless
    /// attempt spending one unit of the retry budget. The first endpoint returned is used.
    /// Does nothing if already connected.
    ///
    /// # Errors
    ///
    /// - [`ZeemoteError::DeviceNotFound`] once the retry budget is spent.
    /// - [`ZeemoteError::ConnectFailed`] if the stream could not be opened.
    ///
    /// The manager is disconnected after any error, and also if this future is dropped before
    /// it completes.
    pub async fn connect(&mut self) -> Result<(), ZeemoteError> {
        if let State::Connected(_) = self.state {
            return Ok(());
        }

        let guard = ConnectingGuard::new(&mut self.state);

        debug!("Trying to find a Zeemote device...");
        let endpoint = loop {
            if self.retries == 0 {
                warn!("Couldn't find any Zeemote device");
                return Err(ZeemoteError::DeviceNotFound);
            }

            match self.discovery.find_services(self.config.service).await {
                Ok(endpoints) => {
                    if let Some(first) = endpoints.into_iter().next() {
                        break first;
                    }
                    debug!("No device offers service {}", self.config.service);
                }
                Err(e) => warn!("Service discovery failed: {}", e),
            }

            self.retries -= 1;
            debug!("{} discovery attempts left", self.retries);

            if let Some(backoff) = self.config.discovery_backoff {
                if self.retries > 0 {
                    sleep(backoff).await;
                }
            }
        };

        debug!("One Zeemote device found: {}", endpoint);

        let transport = match self.discovery.open(&endpoint).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Unable to connect to {}: {}", endpoint, e);
                return Err(ZeemoteError::ConnectFailed(e));
            }
        };

        info!("Connected to {}", endpoint);
        guard.connected(Link {
            transport,
            endpoint,
        });

        Ok(())
    }

    /// Closes the stream and the debug sink. Does nothing when already disconnected.
    pub async fn disconnect(&mut self) {
        if let State::Connected(link) = mem::replace(&mut self.state, State::Disconnected) {
            self.shutdown(link).await;
        }
    }

    async fn shutdown(&mut self, mut link: Link<D::Transport>) {
        if let Err(e) = link.transport.close().await {
            debug!("Error while closing stream to {}: {}", link.endpoint, e);
        }

        if let Err(e) = self.sink.close() {
            debug!("Failed to close debug sink: {}", e);
        }

        info!("Disconnected from {}", link.endpoint);
    }

    /// Moves the link out of the state for the duration of an operation. The caller puts it
    /// back on success; if the operation fails or is dropped the manager stays disconnected.
    fn take_link(&mut self) -> Result<Link<D::Transport>, ZeemoteError> {
        match mem::replace(&mut self.state, State::Disconnected) {
            State::Connected(link) => Ok(link),
            other => {
                self.state = other;
                Err(ZeemoteError::NotConnected)
            }
        }
    }

    /// Reads one report from the controller.
    ///
    /// If the stream fails, the partial report is discarded and the manager reconnects,
    /// returning [`Incoming::Reconnected`] on success. Each reconnect costs one unit of the
    /// retry budget on top of any fruitless discovery attempts it makes, and none is attempted
    /// once the budget is spent.
    ///
    /// # Errors
    ///
    /// - [`ZeemoteError::NotConnected`] if there is no link.
    /// - [`ZeemoteError::LengthMismatch`] if a header declares a length its identifier does
    ///   not allow. The stream cannot be resynchronised, so the manager disconnects.
    /// - [`ZeemoteError::DeviceNotFound`] or [`ZeemoteError::ConnectFailed`] if the link was
    ///   lost and could not be re-established, including when the retry budget is spent.
    pub async fn decode_one(&mut self) -> Result<Incoming, ZeemoteError> {
        let mut link = self.take_link()?;

        match read_report(&mut link.transport, self.sink.as_mut()).await {
            Ok(incoming) => {
                self.state = State::Connected(link);
                Ok(incoming)
            }
            Err(ZeemoteError::ConnectionLost(e)) => {
                warn!("Lost connection to {}: {}", link.endpoint, e);
                self.shutdown(link).await;

                if self.retries == 0 {
                    warn!("Retry budget spent, not reconnecting");
                    return Err(ZeemoteError::DeviceNotFound);
                }

                info!("Reconnecting...");
                self.connect().await?;

                // A successful connect leaves at least one unit of budget.
                self.retries -= 1;
                debug!("{} reconnect attempts left", self.retries);

                Ok(Incoming::Reconnected)
            }
            Err(e) => {
                error!("{}", e);
                self.shutdown(link).await;
                Err(e)
            }
        }
    }

    /// Sets the device idle time. `time` must be exactly one byte.
    pub async fn set_idle(&mut self, time: &[u8]) -> Result<HandshakeResult, ZeemoteError> {
        let packet = SetIdlePacket::from_bytes(time)?;
        self.command(&packet, None).await
    }

    /// Enables or disables an input report type. `enable` and `raw` must be 0 or 1 and
    /// `reserved` must fit in a byte.
    pub async fn set_report_type_enable(
        &mut self,
        report_id: u8,
        enable: u8,
        raw: u8,
        reserved: u16,
    ) -> Result<HandshakeResult, ZeemoteError> {
        let packet = SetReportTypeEnablePacket::new(report_id, enable, raw, reserved)?;
        self.command(&packet, None).await
    }

    /// Sets the name the device advertises, at most 32 bytes.
    ///
    /// Devices that do not support this request ignore it, so the reply is only awaited for
    /// `reply_timeout`. Running out of time yields [`ZeemoteError::NoReply`] and leaves the
    /// connection up.
    ///
    /// A device that does answer after the timeout leaves its handshake byte on the stream,
    /// where the next [`decode_one`](Self::decode_one) takes it for a report length and
    /// fails with a framing error. Pick a timeout well above the link's round trip.
    pub async fn set_device_local_name(
        &mut self,
        name: &str,
        reply_timeout: Duration,
    ) -> Result<HandshakeResult, ZeemoteError> {
        let packet = SetDeviceLocalNamePacket::new(name)?;
        self.command(&packet, Some(reply_timeout)).await
    }

    /// Sets the keep-alive interval, which must be in `0..=65535`.
    pub async fn set_keep_alive_interval(
        &mut self,
        interval: i64,
    ) -> Result<HandshakeResult, ZeemoteError> {
        let packet = SetKeepAliveIntervalPacket::new(interval)?;
        self.command(&packet, None).await
    }

    async fn command(
        &mut self,
        packet: &impl Encode,
        reply_timeout: Option<Duration>,
    ) -> Result<HandshakeResult, ZeemoteError> {
        let mut link = self.take_link()?;

        let result = exchange(
            &mut link.transport,
            self.sink.as_mut(),
            packet,
            reply_timeout,
        )
        .await;

        if let Err(ZeemoteError::ConnectionLost(e)) = &result {
            warn!("Lost connection to {} during a command: {}", link.endpoint, e);
            self.shutdown(link).await;
        } else {
            self.state = State::Connected(link);
        }

        result
    }
}

async fn read_report<T: Transport>(
    transport: &mut T,
    sink: &mut dyn DebugSink,
) -> Result<Incoming, ZeemoteError> {
    let mut header = [0u8; HEADER_SIZE];
    transport
        .recv_exact(&mut header)
        .await
        .map_err(ZeemoteError::ConnectionLost)?;

    trace!("received header: {:x?}", header);
    mirror(sink, &header);

    let header = ReportHeader::new(header);
    let Some(kind) = header.kind() else {
        warn!(
            "Ignoring report with unrecognized identifier 0x{:02x}",
            header.report_id
        );
        return Ok(Incoming::Ignored {
            report_id: header.report_id,
            length: header.length,
        });
    };

    kind.check_length(header.length)?;

    let mut body = vec![0; kind.body_size()];
    transport
        .recv_exact(&mut body)
        .await
        .map_err(ZeemoteError::ConnectionLost)?;

    trace!("received body: {:x?}", body);
    mirror(sink, &body);

    let report = Report::decode_body(kind, &mut body.as_slice())?;
    debug!("Decoded {:?} report", kind);

    Ok(Incoming::Report(report))
}

async fn exchange<T: Transport>(
    transport: &mut T,
    sink: &mut dyn DebugSink,
    packet: &impl Encode,
    reply_timeout: Option<Duration>,
) -> Result<HandshakeResult, ZeemoteError> {
    let encoded = packet.to_bytes();

    trace!("sent command: {:x?}", encoded);
    transport
        .send(&encoded)
        .await
        .map_err(ZeemoteError::ConnectionLost)?;
    mirror(sink, &encoded);

    let mut reply = [0u8; 1];
    let received = match reply_timeout {
        Some(timeout) => select! {
            result = transport.recv_exact(&mut reply) => result,
            _ = sleep(timeout) => {
                warn!("No handshake within {:?}, the device may have ignored the command", timeout);
                return Err(ZeemoteError::NoReply);
            }
        },
        None => transport.recv_exact(&mut reply).await,
    };
    received.map_err(ZeemoteError::ConnectionLost)?;

    trace!("received handshake: {:x?}", reply);
    mirror(sink, &reply);

    Ok(HandshakeResult::try_from(reply[0])?)
}

#[derive(Error, Debug)]
pub enum ZeemoteError {
    #[error("No Zeemote device found")]
    DeviceNotFound,

    #[error("Unable to connect to the Zeemote controller: {0}")]
    ConnectFailed(#[source] io::Error),

    #[error("Connection to the Zeemote controller lost: {0}")]
    ConnectionLost(#[source] io::Error),

    #[error(transparent)]
    LengthMismatch(#[from] LengthMismatch),

    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error("The controller did not answer the command")]
    NoReply,

    #[error("Not connected to a Zeemote controller")]
    NotConnected,

    #[error("Packet decoding error: {0}")]
    Decode(#[from] DecodeError),
}
