//! Device-bound configuration commands.
//!
//! Each command is a short fixed-layout packet. The device answers every command with a single
//! [`HandshakeResult`](crate::HandshakeResult) byte. Arguments are validated when a packet is
//! constructed, so an invalid command never reaches the wire.

use bitflags::bitflags;
use thiserror::Error;

use crate::encode::Encode;

/// Marker byte preceding the output report identifier in `SET_REPORT` style commands.
pub const OUTPUT_REPORT: u8 = 0xA2;

/// Output report identifiers and request codes.
pub mod ids {
    pub const SET_IDLE: u8 = 0x90;
    pub const REPORT_TYPE_ENABLE: u8 = 0x06;
    pub const DEVICE_LOCAL_NAME: u8 = 0x18;
    pub const KEEP_ALIVE_INTERVAL: u8 = 0x19;
}

/// Name the controller advertises out of the box.
pub const DEFAULT_LOCAL_NAME: &str = "Zeemote";

/// Maximum length of a local name, in bytes.
pub const MAX_LOCAL_NAME_LEN: usize = 32;

/// An argument to a command was outside of the range the protocol allows.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Invalid {parameter}: found {value}, expected {expected}.")]
pub struct ParameterError {
    pub parameter: &'static str,
    pub value: i64,
    pub expected: &'static str,
}

// MARK: SetIdle

/// Sets the device idle time.
///
/// | Field  | Size | Value |
/// |--------|------|-------|
/// | prefix | 2    | `02 90` |
/// | `time` | 1    | Idle time |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetIdlePacket {
    pub time: u8,
}

impl SetIdlePacket {
    pub const PREFIX: [u8; 2] = [0x02, ids::SET_IDLE];

    pub const fn new(time: u8) -> Self {
        Self { time }
    }

    /// Builds the packet from a raw payload, which must be exactly one byte long.
    pub fn from_bytes(time: &[u8]) -> Result<Self, ParameterError> {
        match time {
            [time] => Ok(Self::new(*time)),
            _ => Err(ParameterError {
                parameter: "time",
                value: time.len() as i64,
                expected: "a payload of exactly 1 byte",
            }),
        }
    }
}

impl Encode for SetIdlePacket {
    fn size(&self) -> usize {
        3
    }

    fn encode(&self, data: &mut [u8]) {
        Self::PREFIX.encode(data);
        data[2] = self.time;
    }
}

// MARK: SetReportTypeEnable

bitflags! {
    /// Low bits of the `SetReportTypeEnable` options byte. The upper six bits are reserved.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct ReportTypeFlags: u8 {
        /// The report type should be sent.
        const ENABLE = 1 << 0;
        /// The report type should be sent without device-side processing.
        const RAW = 1 << 1;
    }
}

/// Enables or disables one input report type.
///
/// | Field       | Size | Value |
/// |-------------|------|-------|
/// | prefix      | 3    | `04 A2 06` |
/// | `report_id` | 1    | Input report identifier |
/// | options     | 1    | `(reserved & 0xFC) \| flags` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetReportTypeEnablePacket {
    pub report_id: u8,
    pub flags: ReportTypeFlags,
    reserved: u8,
}

fn bit(parameter: &'static str, value: u8) -> Result<bool, ParameterError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ParameterError {
            parameter,
            value: value.into(),
            expected: "0 or 1",
        }),
    }
}

impl SetReportTypeEnablePacket {
    pub const PREFIX: [u8; 3] = [0x04, OUTPUT_REPORT, ids::REPORT_TYPE_ENABLE];

    /// Validates and builds the packet. `enable` and `raw` must be 0 or 1, and `reserved` must
    /// fit in one byte. The two low bits of `reserved` are discarded.
    pub fn new(report_id: u8, enable: u8, raw: u8, reserved: u16) -> Result<Self, ParameterError> {
        let mut flags = ReportTypeFlags::empty();
        flags.set(ReportTypeFlags::ENABLE, bit("enable", enable)?);
        flags.set(ReportTypeFlags::RAW, bit("raw", raw)?);

        let reserved = u8::try_from(reserved).map_err(|_| ParameterError {
            parameter: "reserved",
            value: reserved.into(),
            expected: "0..=255",
        })?;

        Ok(Self {
            report_id,
            flags,
            reserved: reserved & !ReportTypeFlags::all().bits(),
        })
    }

    /// The options byte as it is sent.
    pub const fn options(&self) -> u8 {
        self.reserved | self.flags.bits()
    }
}

impl Encode for SetReportTypeEnablePacket {
    fn size(&self) -> usize {
        5
    }

    fn encode(&self, data: &mut [u8]) {
        Self::PREFIX.encode(data);
        data[3] = self.report_id;
        data[4] = self.options();
    }
}

// MARK: SetDeviceLocalName

/// Sets the name the device advertises.
///
/// Devices that do not support this request drop it silently, so a reply may never arrive.
///
/// | Field  | Size | Value |
/// |--------|------|-------|
/// | prefix | 3    | `23 A2 18` |
/// | `len`  | 1    | Number of name bytes sent |
/// | `name` | 31   | Name bytes, zero padded |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetDeviceLocalNamePacket {
    len: u8,
    name: [u8; MAX_LOCAL_NAME_LEN],
}

impl SetDeviceLocalNamePacket {
    pub const PREFIX: [u8; 3] = [0x23, OUTPUT_REPORT, ids::DEVICE_LOCAL_NAME];

    /// Total size of the packet on the wire.
    pub const SIZE: usize = 35;

    pub fn new(name: &str) -> Result<Self, ParameterError> {
        let bytes = name.as_bytes();
        if bytes.len() > MAX_LOCAL_NAME_LEN {
            return Err(ParameterError {
                parameter: "name",
                value: bytes.len() as i64,
                expected: "at most 32 bytes",
            });
        }

        let mut buf = [0; MAX_LOCAL_NAME_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            len: bytes.len() as u8,
            name: buf,
        })
    }

    pub fn name(&self) -> &[u8] {
        &self.name[..self.len as usize]
    }
}

impl Default for SetDeviceLocalNamePacket {
    fn default() -> Self {
        let mut name = [0; MAX_LOCAL_NAME_LEN];
        name[..DEFAULT_LOCAL_NAME.len()].copy_from_slice(DEFAULT_LOCAL_NAME.as_bytes());

        Self {
            len: DEFAULT_LOCAL_NAME.len() as u8,
            name,
        }
    }
}

impl Encode for SetDeviceLocalNamePacket {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        Self::PREFIX.encode(data);

        // The packet is fixed at 35 bytes, so a full 32 byte name loses its last byte. The
        // length byte counts what is actually sent.
        let room = Self::SIZE - 4;
        let name = self.name();
        let copied = name.len().min(room);
        data[3] = copied as u8;
        data[4..4 + copied].copy_from_slice(&name[..copied]);
        data[4 + copied..Self::SIZE].fill(0);
    }
}

// MARK: SetKeepAliveInterval

/// Sets the keep-alive interval.
///
/// | Field      | Size | Value |
/// |------------|------|-------|
/// | prefix     | 3    | `04 A2 19` |
/// | `interval` | 2    | Interval, big-endian |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetKeepAliveIntervalPacket {
    pub interval: u16,
}

impl SetKeepAliveIntervalPacket {
    pub const PREFIX: [u8; 3] = [0x04, OUTPUT_REPORT, ids::KEEP_ALIVE_INTERVAL];

    pub fn new(interval: i64) -> Result<Self, ParameterError> {
        let interval = u16::try_from(interval).map_err(|_| ParameterError {
            parameter: "interval",
            value: interval,
            expected: "0..=65535",
        })?;

        Ok(Self { interval })
    }
}

impl Encode for SetKeepAliveIntervalPacket {
    fn size(&self) -> usize {
        5
    }

    fn encode(&self, data: &mut [u8]) {
        Self::PREFIX.encode(data);
        self.interval.to_be_bytes().encode(&mut data[3..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn set_idle() {
        assert_eq!(SetIdlePacket::new(0x20).to_bytes(), vec![0x02, 0x90, 0x20]);
        assert_eq!(
            SetIdlePacket::from_bytes(&[0x05]).unwrap(),
            SetIdlePacket::new(0x05)
        );

        assert!(SetIdlePacket::from_bytes(&[]).is_err());
        let err = SetIdlePacket::from_bytes(&[1, 2]).unwrap_err();
        assert_eq!(err.parameter, "time");
        assert_eq!(err.value, 2);
    }

    #[test]
    fn report_type_enable_packs_options() {
        let packet = SetReportTypeEnablePacket::new(0x08, 1, 0, 0xFF).unwrap();
        assert_eq!(packet.options(), 0xFD);
        assert_eq!(packet.to_bytes(), vec![0x04, 0xA2, 0x06, 0x08, 0xFD]);

        let packet = SetReportTypeEnablePacket::new(0x11, 0, 1, 0).unwrap();
        assert_eq!(packet.to_bytes(), vec![0x04, 0xA2, 0x06, 0x11, 0x02]);

        let packet = SetReportTypeEnablePacket::new(0x11, 1, 1, 0x03).unwrap();
        assert_eq!(packet.options(), 0x03);
    }

    #[test]
    fn report_type_enable_rejects_out_of_domain() {
        assert_eq!(
            SetReportTypeEnablePacket::new(0x08, 2, 0, 0).unwrap_err().parameter,
            "enable"
        );
        assert_eq!(
            SetReportTypeEnablePacket::new(0x08, 0, 7, 0).unwrap_err().parameter,
            "raw"
        );
        assert_eq!(
            SetReportTypeEnablePacket::new(0x08, 0, 0, 256).unwrap_err().parameter,
            "reserved"
        );
    }

    #[test]
    fn default_local_name() {
        let mut expected = vec![0x23, 0xA2, 0x18, 0x07];
        expected.extend_from_slice(b"Zeemote");
        expected.resize(35, 0);

        let encoded = SetDeviceLocalNamePacket::default().to_bytes();
        assert_eq!(encoded.len(), 35);
        assert_eq!(encoded, expected);
        assert_eq!(
            SetDeviceLocalNamePacket::new(DEFAULT_LOCAL_NAME).unwrap(),
            SetDeviceLocalNamePacket::default()
        );
    }

    #[test]
    fn local_name_limits() {
        let longest = "x".repeat(32);
        let packet = SetDeviceLocalNamePacket::new(&longest).unwrap();
        let encoded = packet.to_bytes();
        assert_eq!(encoded.len(), 35);
        assert_eq!(packet.name().len(), 32);
        assert_eq!(encoded[3], 31);
        assert!(encoded[4..].iter().all(|&b| b == b'x'));

        let encoded = SetDeviceLocalNamePacket::new(&"x".repeat(31)).unwrap().to_bytes();
        assert_eq!(encoded[3], 31);

        let err = SetDeviceLocalNamePacket::new(&"x".repeat(33)).unwrap_err();
        assert_eq!(err.parameter, "name");
        assert_eq!(err.value, 33);
    }

    #[test]
    fn keep_alive_interval() {
        assert_eq!(
            SetKeepAliveIntervalPacket::new(300).unwrap().to_bytes(),
            vec![0x04, 0xA2, 0x19, 0x01, 0x2C]
        );
        assert_eq!(
            SetKeepAliveIntervalPacket::new(65535).unwrap().to_bytes()[3..],
            [0xFF, 0xFF]
        );
        assert!(SetKeepAliveIntervalPacket::new(65536).is_err());
        assert!(SetKeepAliveIntervalPacket::new(-1).is_err());
    }
}
