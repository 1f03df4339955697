//! Chunked transfers for payloads that do not fit one report.
//!
//! Each chunk travels in its own report as `[marker, data...]`. A marker of
//! [`CHUNK_MARKER_FULL`] means the chunk carries [`MAX_CHUNK_DATA_SIZE`] bytes and
//! more may follow; any other value is the data length of the last chunk.

use crate::config::FinalChunkPolicy;
use crate::constants::{CHUNK_MARKER_FULL, MAX_CHUNK_DATA_SIZE, MAX_PAYLOAD_SIZE};
use crate::error::OKError;
use crate::message::Message;
use crate::report::Report;
use crate::transport::Transport;
use tracing::debug;

/// One length-marked segment of a larger payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub marker: u8,
    pub data: &'a [u8],
}

impl Chunk<'_> {
    pub fn is_final(&self) -> bool {
        self.marker != CHUNK_MARKER_FULL
    }

    /// Marker followed by data, as placed in the report payload.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(1 + self.data.len());
        payload.push(self.marker);
        payload.extend_from_slice(self.data);
        payload
    }
}

/// Split `payload` into chunks.
///
/// An empty payload still yields one chunk with marker 0 so the device always
/// sees the end of the transfer.
pub fn split(payload: &[u8], policy: FinalChunkPolicy) -> Vec<Chunk<'_>> {
    if payload.is_empty() {
        return vec![Chunk { marker: 0, data: &[] }];
    }

    let mut chunks: Vec<Chunk<'_>> = payload
        .chunks(MAX_CHUNK_DATA_SIZE)
        .map(|data| Chunk {
            marker: if data.len() == MAX_CHUNK_DATA_SIZE {
                CHUNK_MARKER_FULL
            } else {
                data.len() as u8
            },
            data,
        })
        .collect();

    let ends_full = chunks.last().is_some_and(|c| c.marker == CHUNK_MARKER_FULL);
    if ends_full && policy == FinalChunkPolicy::Terminated {
        chunks.push(Chunk { marker: 0, data: &[] });
    }
    chunks
}

/// Frame every chunk of `payload` and write the reports in order.
pub async fn send_chunked<T: Transport>(
    transport: &mut T,
    message: Message,
    slot: u8,
    payload: &[u8],
    policy: FinalChunkPolicy,
) -> Result<(), OKError> {
    let chunks = split(payload, policy);
    debug!(
        %message,
        slot,
        payload_len = payload.len(),
        chunks = chunks.len(),
        "Sending chunked payload"
    );
    for chunk in chunks {
        let chunk_payload = chunk.to_payload();
        let report = Report::builder()
            .message(message)
            .slot(slot)
            .payload(&chunk_payload)
            .build()?;
        transport.write_report(&report).await?;
    }
    Ok(())
}

/// Write `stream` with `control` in the marker position of every report.
///
/// Each report carries up to [`MAX_CHUNK_DATA_SIZE`] stream bytes after the
/// control byte; the device counts bytes to find the end.
pub async fn send_with_control_byte<T: Transport>(
    transport: &mut T,
    message: Message,
    slot: u8,
    control: u8,
    stream: &[u8],
) -> Result<(), OKError> {
    let mut payload = Vec::with_capacity(MAX_PAYLOAD_SIZE);
    for data in stream.chunks(MAX_CHUNK_DATA_SIZE) {
        payload.clear();
        payload.push(control);
        payload.extend_from_slice(data);
        let report = Report::builder()
            .message(message)
            .slot(slot)
            .payload(&payload)
            .build()?;
        transport.write_report(&report).await?;
    }
    Ok(())
}
