//! Host-bound input reports.
//!
//! # Framing
//!
//! | Field       | Size | Description |
//! |-------------|------|-------------|
//! | `length`    | 1    | Total report length, including these two header bytes. |
//! | `report_id` | 1    | A [report identifier](ids). |
//! | `body`      | n    | `length - 2` bytes laid out according to the identifier. |
//!
//! Every recognized identifier has exactly one valid `length` (see [`ReportKind::expected_length`]).
//! Identifiers outside of [`ReportKind`] are not part of this protocol revision and have no known
//! body size, so callers should skip them after the header.

use alloc::vec::Vec;
use thiserror::Error;

use crate::decode::{Decode, DecodeError, DecodeWithLength};

/// Size of the `[length, report_id]` header that starts every report.
pub const HEADER_SIZE: usize = 2;

/// Identifiers of the input reports understood by this crate.
///
/// 0x06, 0x18, 0x19 and 0xFE are output report identifiers and never arrive from the device.
pub mod ids {
    pub const DEVICE_INFO: u8 = 0x03;
    pub const BUTTON_INFO: u8 = 0x04;
    pub const PROPERTY: u8 = 0x05;
    pub const KEY_CODES: u8 = 0x07;
    pub const JOYSTICK_8: u8 = 0x08;
    pub const JOYSTICK_16: u8 = 0x09;
    pub const JOYSTICK_32: u8 = 0x0A;
    pub const BATTERY: u8 = 0x11;
    pub const BARE: u8 = 0x1A;
    pub const PROTOCOL_VERSION: u8 = 0x1B;

    // Diagnostic reports used for device testing.
    pub const DIAGNOSTIC_FD: u8 = 0xFD;
    pub const DIAGNOSTIC_FF: u8 = 0xFF;
}

/// The closed set of report identifiers this protocol revision defines.
///
/// The discriminant of each variant is its wire identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReportKind {
    DeviceInfo = ids::DEVICE_INFO,
    ButtonInfo = ids::BUTTON_INFO,
    Property = ids::PROPERTY,
    KeyCodes = ids::KEY_CODES,
    Joystick8 = ids::JOYSTICK_8,
    Joystick16 = ids::JOYSTICK_16,
    Joystick32 = ids::JOYSTICK_32,
    Passthrough0B = 0x0B,
    Passthrough0C = 0x0C,
    Passthrough0D = 0x0D,
    Passthrough0E = 0x0E,
    Passthrough0F = 0x0F,
    Passthrough10 = 0x10,
    Battery = ids::BATTERY,
    Passthrough12 = 0x12,
    Passthrough13 = 0x13,
    Passthrough14 = 0x14,
    Passthrough15 = 0x15,
    Passthrough16 = 0x16,
    Passthrough17 = 0x17,
    Bare = ids::BARE,
    ProtocolVersion = ids::PROTOCOL_VERSION,
    DiagnosticFD = ids::DIAGNOSTIC_FD,
    DiagnosticFF = ids::DIAGNOSTIC_FF,
}

impl ReportKind {
    /// Every recognized report kind, in identifier order.
    pub const ALL: [ReportKind; 24] = [
        Self::DeviceInfo,
        Self::ButtonInfo,
        Self::Property,
        Self::KeyCodes,
        Self::Joystick8,
        Self::Joystick16,
        Self::Joystick32,
        Self::Passthrough0B,
        Self::Passthrough0C,
        Self::Passthrough0D,
        Self::Passthrough0E,
        Self::Passthrough0F,
        Self::Passthrough10,
        Self::Battery,
        Self::Passthrough12,
        Self::Passthrough13,
        Self::Passthrough14,
        Self::Passthrough15,
        Self::Passthrough16,
        Self::Passthrough17,
        Self::Bare,
        Self::ProtocolVersion,
        Self::DiagnosticFD,
        Self::DiagnosticFF,
    ];

    /// Looks up the kind for a wire identifier, or `None` if the identifier is unrecognized.
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0x03 => Self::DeviceInfo,
            0x04 => Self::ButtonInfo,
            0x05 => Self::Property,
            0x07 => Self::KeyCodes,
            0x08 => Self::Joystick8,
            0x09 => Self::Joystick16,
            0x0A => Self::Joystick32,
            0x0B => Self::Passthrough0B,
            0x0C => Self::Passthrough0C,
            0x0D => Self::Passthrough0D,
            0x0E => Self::Passthrough0E,
            0x0F => Self::Passthrough0F,
            0x10 => Self::Passthrough10,
            0x11 => Self::Battery,
            0x12 => Self::Passthrough12,
            0x13 => Self::Passthrough13,
            0x14 => Self::Passthrough14,
            0x15 => Self::Passthrough15,
            0x16 => Self::Passthrough16,
            0x17 => Self::Passthrough17,
            0x1A => Self::Bare,
            0x1B => Self::ProtocolVersion,
            0xFD => Self::DiagnosticFD,
            0xFF => Self::DiagnosticFF,
            _ => return None,
        })
    }

    /// The wire identifier of this kind.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The only valid value of the header's `length` byte for this kind.
    ///
    /// Report 0x1A has no body and its length byte is not checked.
    pub const fn expected_length(self) -> Option<u8> {
        Some(match self {
            Self::DeviceInfo => 0x2D,
            Self::ButtonInfo => 0x25,
            Self::Property => 0x07,
            Self::KeyCodes => 0x08,
            Self::Joystick8 => 0x05,
            Self::Joystick16 => 0x07,
            Self::Joystick32 => 0x0B,
            Self::Passthrough0B => 0x06,
            Self::Passthrough0C => 0x09,
            Self::Passthrough0D => 0x0F,
            Self::Passthrough0E => 0x04,
            Self::Passthrough0F => 0x05,
            Self::Passthrough10 => 0x07,
            Self::Battery => 0x04,
            Self::Passthrough12 => 0x05,
            Self::Passthrough13 => 0x07,
            Self::Passthrough14 => 0x0B,
            Self::Passthrough15 => 0x04,
            Self::Passthrough16 => 0x05,
            Self::Passthrough17 => 0x07,
            Self::Bare => return None,
            Self::ProtocolVersion => 0x08,
            Self::DiagnosticFD => 0x07,
            Self::DiagnosticFF => 0x06,
        })
    }

    /// Number of body bytes following the header.
    pub const fn body_size(self) -> usize {
        match self.expected_length() {
            Some(length) => length as usize - HEADER_SIZE,
            None => 0,
        }
    }

    /// Returns true for kinds whose body is carried through uninterpreted.
    pub const fn is_passthrough(self) -> bool {
        matches!(
            self,
            Self::Passthrough0B
                | Self::Passthrough0C
                | Self::Passthrough0D
                | Self::Passthrough0E
                | Self::Passthrough0F
                | Self::Passthrough10
                | Self::Passthrough12
                | Self::Passthrough13
                | Self::Passthrough14
                | Self::Passthrough15
                | Self::Passthrough16
                | Self::Passthrough17
                | Self::DiagnosticFD
                | Self::DiagnosticFF
        )
    }

    /// Returns true for the diagnostic reports 0xFD and 0xFF.
    pub const fn is_diagnostic(self) -> bool {
        matches!(self, Self::DiagnosticFD | Self::DiagnosticFF)
    }

    /// Verifies a header's declared length against this kind's fixed length.
    ///
    /// # Errors
    ///
    /// Returns a [`LengthMismatch`] if `declared` differs from [`ReportKind::expected_length`].
    pub const fn check_length(self, declared: u8) -> Result<(), LengthMismatch> {
        match self.expected_length() {
            Some(expected) if expected != declared => Err(LengthMismatch {
                report_id: self.id(),
                declared,
                expected,
            }),
            _ => Ok(()),
        }
    }
}

/// A report header declared a length that its identifier does not allow.
///
/// The protocol has no resynchronisation marker, so the rest of the stream cannot be trusted
/// after this error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Report 0x{report_id:02x} declared length {declared}, expected {expected}.")]
pub struct LengthMismatch {
    pub report_id: u8,
    pub declared: u8,
    pub expected: u8,
}

/// The two bytes that start every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportHeader {
    pub length: u8,
    pub report_id: u8,
}

impl ReportHeader {
    pub const fn new(bytes: [u8; HEADER_SIZE]) -> Self {
        Self {
            length: bytes[0],
            report_id: bytes[1],
        }
    }

    /// The kind of report this header announces, if it is recognized.
    pub const fn kind(&self) -> Option<ReportKind> {
        ReportKind::from_id(self.report_id)
    }
}

impl Decode for ReportHeader {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self::new(<[u8; HEADER_SIZE]>::decode(data)?))
    }
}

/// A decoded input report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    DeviceInfo(DeviceInfoReport),
    ButtonInfo(ButtonInfoReport),
    Property(PropertyReport),
    KeyCodes(KeyCodesReport),
    Joystick8(Joystick8Report),
    Joystick16(Joystick16Report),
    Joystick32(Joystick32Report),
    Battery(BatteryReport),
    /// Report 0x1A, which carries no body.
    Bare,
    ProtocolVersion(ProtocolVersionReport),
    /// Reports whose bodies are defined but not interpreted, including the diagnostic reports.
    Passthrough(PassthroughReport),
}

impl Report {
    /// Decodes the body of a report of the given kind.
    ///
    /// The header must already have been consumed and its length checked with
    /// [`ReportKind::check_length`]. On success exactly [`ReportKind::body_size`] bytes are consumed.
    pub fn decode_body(kind: ReportKind, data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(match kind {
            ReportKind::DeviceInfo => Self::DeviceInfo(DeviceInfoReport::decode(data)?),
            ReportKind::ButtonInfo => Self::ButtonInfo(ButtonInfoReport::decode(data)?),
            ReportKind::Property => Self::Property(PropertyReport::decode(data)?),
            ReportKind::KeyCodes => Self::KeyCodes(KeyCodesReport::decode(data)?),
            ReportKind::Joystick8 => Self::Joystick8(Joystick8Report::decode(data)?),
            ReportKind::Joystick16 => Self::Joystick16(Joystick16Report::decode(data)?),
            ReportKind::Joystick32 => Self::Joystick32(Joystick32Report::decode(data)?),
            ReportKind::Battery => Self::Battery(BatteryReport::decode(data)?),
            ReportKind::Bare => Self::Bare,
            ReportKind::ProtocolVersion => {
                Self::ProtocolVersion(ProtocolVersionReport::decode(data)?)
            }
            kind => Self::Passthrough(PassthroughReport {
                kind,
                data: Vec::decode_with_len(data, kind.body_size())?,
            }),
        })
    }

    pub const fn kind(&self) -> ReportKind {
        match self {
            Self::DeviceInfo(_) => ReportKind::DeviceInfo,
            Self::ButtonInfo(_) => ReportKind::ButtonInfo,
            Self::Property(_) => ReportKind::Property,
            Self::KeyCodes(_) => ReportKind::KeyCodes,
            Self::Joystick8(_) => ReportKind::Joystick8,
            Self::Joystick16(_) => ReportKind::Joystick16,
            Self::Joystick32(_) => ReportKind::Joystick32,
            Self::Battery(_) => ReportKind::Battery,
            Self::Bare => ReportKind::Bare,
            Self::ProtocolVersion(_) => ReportKind::ProtocolVersion,
            Self::Passthrough(report) => report.kind,
        }
    }
}

/// Returns the length-prefixed part of a fixed 32 byte text field.
fn prefixed(field: &[u8; 32], len: u8) -> &[u8] {
    &field[..(len as usize).min(field.len())]
}

/// Report 0x03: firmware and model identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfoReport {
    pub firmware_major: [u8; 2],
    pub firmware_minor: [u8; 2],
    pub firmware_revision: [u8; 2],
    pub platform_id: [u8; 2],
    pub model_id: [u8; 2],
    pub model_name_len: u8,
    pub model_name: [u8; 32],
}

impl DeviceInfoReport {
    /// The model name bytes, cut to `model_name_len`.
    pub fn model_name(&self) -> &[u8] {
        prefixed(&self.model_name, self.model_name_len)
    }
}

impl Decode for DeviceInfoReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            firmware_major: Decode::decode(data)?,
            firmware_minor: Decode::decode(data)?,
            firmware_revision: Decode::decode(data)?,
            platform_id: Decode::decode(data)?,
            model_id: Decode::decode(data)?,
            model_name_len: u8::decode(data)?,
            model_name: Decode::decode(data)?,
        })
    }
}

/// Report 0x04: describes one button and the game action it is recommended for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonInfoReport {
    pub button_id: u8,
    pub action: u8,
    pub description_len: u8,
    pub description: [u8; 32],
}

impl ButtonInfoReport {
    /// The description bytes, cut to `description_len`.
    pub fn description(&self) -> &[u8] {
        prefixed(&self.description, self.description_len)
    }
}

impl Decode for ButtonInfoReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            button_id: u8::decode(data)?,
            action: u8::decode(data)?,
            description_len: u8::decode(data)?,
            description: Decode::decode(data)?,
        })
    }
}

/// Report 0x05
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyReport {
    pub property_type: u8,
    pub value: [u8; 4],
}

impl Decode for PropertyReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            property_type: u8::decode(data)?,
            value: Decode::decode(data)?,
        })
    }
}

/// Report 0x07: the key codes of the currently pressed buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodesReport {
    pub key_codes: [u8; 6],
}

impl Decode for KeyCodesReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            key_codes: Decode::decode(data)?,
        })
    }
}

/// Splits the leading byte of a joystick report into its raw flag (top bit) and joystick
/// identifier (low seven bits).
pub const fn split_joystick_byte(byte: u8) -> (bool, u8) {
    let raw = (byte & 0x80) >> 7;
    (raw == 1, byte & 0x7F)
}

/// Reports 0x08, 0x09 and 0x0A: a joystick position with `N` bytes per axis.
///
/// # Encoding
///
/// | Field         | Size | Description |
/// |---------------|------|-------------|
/// | `packed`      | 1    | Bit 7 is the raw flag, bits 0-6 the joystick identifier. |
/// | `x`           | N    | X-axis reading. |
/// | `y`           | N    | Y-axis reading. |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoystickReport<const N: usize> {
    pub raw: bool,
    pub joystick_id: u8,
    pub x: [u8; N],
    pub y: [u8; N],
}

pub type Joystick8Report = JoystickReport<1>;
pub type Joystick16Report = JoystickReport<2>;
pub type Joystick32Report = JoystickReport<4>;

impl<const N: usize> Decode for JoystickReport<N> {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let (raw, joystick_id) = split_joystick_byte(u8::decode(data)?);

        Ok(Self {
            raw,
            joystick_id,
            x: Decode::decode(data)?,
            y: Decode::decode(data)?,
        })
    }
}

/// Report 0x11: present battery voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReport {
    /// Sent big-endian.
    pub voltage: u16,
}

impl Decode for BatteryReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            voltage: u16::from_be_bytes(Decode::decode(data)?),
        })
    }
}

/// Report 0x1B: the protocol revision implemented by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersionReport {
    pub major: [u8; 2],
    pub minor: [u8; 2],
    pub revision: [u8; 2],
}

impl Decode for ProtocolVersionReport {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            major: Decode::decode(data)?,
            minor: Decode::decode(data)?,
            revision: Decode::decode(data)?,
        })
    }
}

/// A report with a known layout size whose contents are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughReport {
    pub kind: ReportKind,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Builds a well-formed body for `kind` filled with an ascending byte pattern.
    fn body(kind: ReportKind) -> Vec<u8> {
        (0..kind.body_size()).map(|i| i as u8 + 1).collect()
    }

    #[test]
    fn every_kind_round_trips_its_id() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(ReportKind::from_id(0x99), None);
        assert_eq!(ReportKind::from_id(0x06), None);
    }

    #[test]
    fn bodies_consume_exactly_their_size() {
        for kind in ReportKind::ALL {
            let mut data = body(kind);
            data.extend([0xEE, 0xEE]);
            let mut cursor = data.as_slice();

            let report = Report::decode_body(kind, &mut cursor).unwrap();

            assert_eq!(report.kind(), kind);
            assert_eq!(cursor, &[0xEE, 0xEE], "{kind:?} consumed the wrong amount");
        }
    }

    #[test]
    fn truncated_bodies_fail() {
        for kind in ReportKind::ALL.into_iter().filter(|k| k.body_size() > 0) {
            let data = body(kind);
            let mut cursor = &data[..data.len() - 1];
            assert!(Report::decode_body(kind, &mut cursor).is_err(), "{kind:?}");
        }
    }

    #[test]
    fn length_check() {
        for kind in ReportKind::ALL {
            let Some(expected) = kind.expected_length() else {
                assert_eq!(kind, ReportKind::Bare);
                assert_eq!(kind.check_length(0x42), Ok(()));
                continue;
            };

            assert_eq!(kind.check_length(expected), Ok(()));
            assert_eq!(
                kind.check_length(expected.wrapping_add(1)),
                Err(LengthMismatch {
                    report_id: kind.id(),
                    declared: expected.wrapping_add(1),
                    expected,
                })
            );
        }
    }

    #[test]
    fn device_info_fields_in_order() {
        let mut data = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 7];
        let mut name = [0u8; 32];
        name[..7].copy_from_slice(b"Zeemote");
        data.extend(name);

        let Report::DeviceInfo(info) =
            Report::decode_body(ReportKind::DeviceInfo, &mut data.as_slice()).unwrap()
        else {
            panic!("wrong variant");
        };

        assert_eq!(info.firmware_major, [0x01, 0x02]);
        assert_eq!(info.firmware_minor, [0x03, 0x04]);
        assert_eq!(info.firmware_revision, [0x05, 0x06]);
        assert_eq!(info.platform_id, [0x07, 0x08]);
        assert_eq!(info.model_id, [0x09, 0x0A]);
        assert_eq!(info.model_name(), b"Zeemote");
    }

    #[test]
    fn description_length_is_clamped() {
        let report = ButtonInfoReport {
            button_id: 1,
            action: 2,
            description_len: 200,
            description: [b'a'; 32],
        };
        assert_eq!(report.description().len(), 32);
    }

    #[test]
    fn joystick_byte_split() {
        assert_eq!(split_joystick_byte(0x85), (true, 5));
        assert_eq!(split_joystick_byte(0x05), (false, 5));
        assert_eq!(split_joystick_byte(0xFF), (true, 127));
        assert_eq!(split_joystick_byte(0x00), (false, 0));
    }

    #[test]
    fn joystick_layouts() {
        let report = Joystick8Report::decode(&mut [0x85, 0x10, 0xF0].as_slice()).unwrap();
        assert_eq!(
            report,
            JoystickReport {
                raw: true,
                joystick_id: 5,
                x: [0x10],
                y: [0xF0],
            }
        );

        let report = Joystick16Report::decode(&mut [0x05, 1, 2, 3, 4].as_slice()).unwrap();
        assert!(!report.raw);
        assert_eq!(report.joystick_id, 5);
        assert_eq!((report.x, report.y), ([1, 2], [3, 4]));

        let report =
            Joystick32Report::decode(&mut [0x85, 1, 2, 3, 4, 5, 6, 7, 8].as_slice()).unwrap();
        assert!(report.raw);
        assert_eq!((report.x, report.y), ([1, 2, 3, 4], [5, 6, 7, 8]));
    }

    #[test]
    fn battery_is_big_endian() {
        let report = BatteryReport::decode(&mut [0x0B, 0xB8].as_slice()).unwrap();
        assert_eq!(report.voltage, 3000);
    }

    #[test]
    fn passthrough_keeps_bytes() {
        let report =
            Report::decode_body(ReportKind::DiagnosticFF, &mut [9, 8, 7, 6].as_slice()).unwrap();
        let Report::Passthrough(passthrough) = report else {
            panic!("wrong variant");
        };
        assert!(passthrough.kind.is_diagnostic());
        assert_eq!(passthrough.data, vec![9, 8, 7, 6]);
    }
}
