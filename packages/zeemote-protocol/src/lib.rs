//! Implementation of the Zeemote controller report protocol in Rust.
//!
//! The controller speaks a small framed protocol over a serial-profile link. Every host-bound
//! [`Report`] starts with a one byte length and a one byte identifier, followed by a fixed body
//! whose layout depends on the identifier. Device-bound configuration commands are short
//! fixed-layout packets answered by a single [`HandshakeResult`] byte.

#![no_std]

extern crate alloc;

pub mod command;
pub mod report;

mod decode;
mod encode;
mod handshake;

pub use command::ParameterError;
pub use decode::{Decode, DecodeError, DecodeErrorKind, DecodeWithLength};
pub use encode::Encode;
pub use handshake::HandshakeResult;
pub use report::{LengthMismatch, Report, ReportHeader, ReportKind};
