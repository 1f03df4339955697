//! Fixed-size HID reports.
//!
//! Every outbound report is laid out as
//!
//! ```text
//! Offset  Length  Description
//! 0       1       Report id (always 0)
//! 1       4       Magic header 0xFF 0xFF 0xFF 0xFF
//! 5       0-1     Message code
//! ..      0-1     Slot number (omitted when 0)
//! ..      0-1     Field code
//! ..      rest    Payload, zero padded to 65 bytes
//! ```
//!
//! Inbound reports share the size and the leading report-id byte; everything
//! after it is response payload.

use crate::constants::{MESSAGE_HEADER, REPORT_PAYLOAD_SIZE, REPORT_SIZE};
use crate::error::OKError;
use crate::message::{Field, Message};
use bytes::{BufMut, BytesMut};
use std::fmt;

/// One 65-byte HID report.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Report([u8; REPORT_SIZE]);

impl Report {
    /// Wrap a report exactly as it came off the wire, report-id included.
    pub fn from_bytes(bytes: [u8; REPORT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build an inbound report from the payload bytes that follow the report-id.
    /// Short input is zero padded, anything past 64 bytes is dropped.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut bytes = [0u8; REPORT_SIZE];
        let len = payload.len().min(REPORT_PAYLOAD_SIZE);
        bytes[1..1 + len].copy_from_slice(&payload[..len]);
        Self(bytes)
    }

    pub fn builder<'a>() -> ReportBuilder<'a> {
        ReportBuilder::default()
    }

    pub fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.0
    }

    /// Everything after the report-id byte.
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Index of the first zero byte at or after `start`.
    pub fn find_zero(&self, start: usize) -> Option<usize> {
        self.0.iter().skip(start).position(|&b| b == 0).map(|pos| pos + start)
    }

    /// Payload up to the first zero byte, decoded as text.
    pub fn text(&self) -> String {
        let end = self.find_zero(1).unwrap_or(REPORT_SIZE);
        String::from_utf8_lossy(&self.0[1..end]).into_owned()
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Report({})", hex::encode(self.0))
    }
}

/// Assembles an outbound [`Report`] from its optional parts.
#[derive(Debug, Default, Clone)]
pub struct ReportBuilder<'a> {
    message: Option<Message>,
    slot: u8,
    field: Option<Field>,
    payload: &'a [u8],
}

impl<'a> ReportBuilder<'a> {
    pub fn message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    /// A slot number of 0 means "no slot" and is not written.
    pub fn slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Result<Report, OKError> {
        let mut buffer = BytesMut::with_capacity(REPORT_SIZE);
        buffer.extend_from_slice(&MESSAGE_HEADER);
        if let Some(message) = self.message {
            buffer.put_u8(message.into());
        }
        if self.slot != 0 {
            buffer.put_u8(self.slot);
        }
        if let Some(field) = self.field {
            buffer.put_u8(field.into());
        }

        buffer.extend_from_slice(self.payload);
        if buffer.len() > REPORT_SIZE {
            return Err(OKError::PayloadTooLarge {
                needed: buffer.len(),
                capacity: REPORT_SIZE,
                raw: buffer.to_vec(),
            });
        }
        buffer.resize(REPORT_SIZE, 0);

        let mut bytes = [0u8; REPORT_SIZE];
        bytes.copy_from_slice(&buffer);
        Ok(Report(bytes))
    }
}
