use thiserror::Error;

use crate::decode::{Decode, DecodeError, DecodeErrorKind};

/// Handshake Result Codes
///
/// The single byte the device sends back after every configuration command, reporting either
/// success ([`HandshakeResult::Successful`]) or why the command was refused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[repr(u8)]
pub enum HandshakeResult {
    /// The command was accepted.
    #[error("Command was accepted. (0x00)")]
    Successful = 0x00,

    /// The device is busy and cannot service the command yet.
    #[error("Device is not ready. (0x01)")]
    NotReady = 0x01,

    /// The command referenced a report identifier the device does not know.
    #[error("Invalid report identifier. (0x02)")]
    InvalidReportId = 0x02,

    /// The device does not support this request.
    #[error("Unsupported request. (0x03)")]
    UnsupportedRequest = 0x03,

    /// A command argument was rejected by the device.
    #[error("Invalid parameter. (0x04)")]
    InvalidParameter = 0x04,

    #[error("Unknown device error. (0x0E)")]
    Unknown = 0x0E,

    #[error("Fatal device error. (0x0F)")]
    Fatal = 0x0F,
}

impl HandshakeResult {
    pub const fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }

    pub const fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for HandshakeResult {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Successful),
            0x01 => Ok(Self::NotReady),
            0x02 => Ok(Self::InvalidReportId),
            0x03 => Ok(Self::UnsupportedRequest),
            0x04 => Ok(Self::InvalidParameter),
            0x0E => Ok(Self::Unknown),
            0x0F => Ok(Self::Fatal),
            v => Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedByte {
                name: "HandshakeResult",
                value: v,
                expected: &[0x00, 0x01, 0x02, 0x03, 0x04, 0x0E, 0x0F],
            })),
        }
    }
}

impl Decode for HandshakeResult {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Self::try_from(u8::decode(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        for result in [
            HandshakeResult::Successful,
            HandshakeResult::NotReady,
            HandshakeResult::InvalidReportId,
            HandshakeResult::UnsupportedRequest,
            HandshakeResult::InvalidParameter,
            HandshakeResult::Unknown,
            HandshakeResult::Fatal,
        ] {
            assert_eq!(HandshakeResult::try_from(result.code()), Ok(result));
        }
        assert!(HandshakeResult::Successful.is_successful());
        assert!(!HandshakeResult::Fatal.is_successful());
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = HandshakeResult::decode(&mut [0x42].as_slice()).unwrap_err();
        assert!(matches!(
            err.kind(),
            DecodeErrorKind::UnexpectedByte { value: 0x42, .. }
        ));
    }
}
