//! Discovery over serial-profile ports the operating system has already bound, such as
//! `/dev/rfcomm0` on Linux or the outgoing Bluetooth COM ports on Windows.
//!
//! The OS exposes no service records for these ports, so every candidate port is assumed to
//! carry the Zeemote service.

use std::{io, path::Path, time::Duration};

use log::{debug, trace};
use serialport::{SerialPortInfo, SerialPortType};
use tokio_serial::SerialStream;
use uuid::Uuid;

use crate::{Discovery, Endpoint};

/// Baud rate used when opening a port. Bluetooth serial ports ignore it.
pub const ZEEMOTE_SERIAL_BAUDRATE: u32 = 115200;

/// Name prefix of RFCOMM nodes on Linux.
pub const RFCOMM_PORT_PREFIX: &str = "rfcomm";

/// Finds controllers among the available serial ports.
#[derive(Debug, Clone)]
pub struct SerialDiscovery {
    baud_rate: u32,
    port_prefix: String,
    timeout: Duration,
    fixed_port: Option<String>,
}

impl Default for SerialDiscovery {
    fn default() -> Self {
        Self {
            baud_rate: ZEEMOTE_SERIAL_BAUDRATE,
            port_prefix: RFCOMM_PORT_PREFIX.to_string(),
            timeout: Duration::from_secs(5),
            fixed_port: None,
        }
    }
}

impl SerialDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Ports whose file name starts with `prefix` are candidates even when the OS does not
    /// report them as Bluetooth ports.
    pub fn with_port_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.port_prefix = prefix.into();
        self
    }

    /// Read and write timeout of opened ports.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skips enumeration and only ever offers `port`.
    pub fn with_fixed_port(mut self, port: impl Into<String>) -> Self {
        self.fixed_port = Some(port.into());
        self
    }

    fn is_candidate(&self, port: &SerialPortInfo) -> bool {
        if let SerialPortType::BluetoothPort = port.port_type {
            return true;
        }

        Path::new(&port.port_name)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.port_prefix))
    }
}

fn endpoint_for(port_name: &str) -> Endpoint {
    Endpoint {
        address: port_name.to_string(),
        port: None,
        name: port_name.to_string(),
    }
}

impl Discovery for SerialDiscovery {
    type Transport = SerialStream;

    async fn find_services(&mut self, service: Uuid) -> io::Result<Vec<Endpoint>> {
        trace!("Looking for serial ports offering {}", service);

        if let Some(port) = &self.fixed_port {
            return Ok(if Path::new(port).exists() {
                vec![endpoint_for(port)]
            } else {
                debug!("Port {} does not exist", port);
                Vec::new()
            });
        }

        let ports = tokio_serial::available_ports()?;
        trace!("Found {} serial ports", ports.len());

        let endpoints: Vec<Endpoint> = ports
            .iter()
            .filter(|port| self.is_candidate(port))
            .map(|port| endpoint_for(&port.port_name))
            .collect();

        for endpoint in &endpoints {
            debug!("Candidate serial port: {}", endpoint.address);
        }

        Ok(endpoints)
    }

    async fn open(&mut self, endpoint: &Endpoint) -> io::Result<SerialStream> {
        debug!("Opening {} at {} baud", endpoint.address, self.baud_rate);

        let stream = SerialStream::open(
            &tokio_serial::new(&endpoint.address, self.baud_rate)
                .parity(tokio_serial::Parity::None)
                .stop_bits(tokio_serial::StopBits::One)
                .timeout(self.timeout),
        )?;

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, port_type: SerialPortType) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type,
        }
    }

    #[test]
    fn candidates() {
        let discovery = SerialDiscovery::new();

        assert!(discovery.is_candidate(&port("/dev/rfcomm0", SerialPortType::Unknown)));
        assert!(discovery.is_candidate(&port("COM7", SerialPortType::BluetoothPort)));
        assert!(!discovery.is_candidate(&port("/dev/ttyS0", SerialPortType::Unknown)));
        assert!(!discovery.is_candidate(&port("/dev/ttyUSB0", SerialPortType::PciPort)));

        let discovery = discovery.with_port_prefix("ttyZ");
        assert!(discovery.is_candidate(&port("/dev/ttyZ1", SerialPortType::Unknown)));
        assert!(!discovery.is_candidate(&port("/dev/rfcomm0", SerialPortType::Unknown)));
    }

    #[tokio::test]
    async fn missing_fixed_port_is_not_found() {
        let mut discovery = SerialDiscovery::new()
            .with_fixed_port(format!("/nonexistent/zeemote-{}", std::process::id()));

        let endpoints = discovery.find_services(crate::ZEEMOTE_SERVICE).await.unwrap();
        assert!(endpoints.is_empty());
    }
}
