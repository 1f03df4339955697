//! Reassembly of multi-report responses.
//!
//! The device does not send a length for most responses. A message that ends
//! exactly on a report boundary looks the same as one that continues, so the
//! end is found either by a zero byte, by an expected length, or by the channel
//! going quiet. [`Termination`] picks the rule explicitly.

use crate::constants::REPORT_PAYLOAD_SIZE;
use crate::error::OKError;
use crate::report::Report;
use crate::transport::Transport;
use bytes::BytesMut;
use std::time::Duration;
use tracing::debug;

/// How the end of a response is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// A report holding a zero byte is the last one; the data stops before the zero.
    /// A report with no zero contributes all 64 bytes and more follow.
    #[default]
    ZeroByte,
    /// Every report contributes 64 bytes; used for binary data that may contain zeros.
    FullReports,
}

/// Whether more reports are needed after [`Reassembler::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    More,
    Complete,
}

/// Accumulates report payloads into one response.
#[derive(Debug)]
pub struct Reassembler {
    termination: Termination,
    expected: Option<usize>,
    buffer: BytesMut,
    reports: usize,
}

impl Reassembler {
    pub fn new(termination: Termination, expected: Option<usize>) -> Self {
        Self {
            termination,
            expected,
            buffer: BytesMut::with_capacity(expected.unwrap_or(REPORT_PAYLOAD_SIZE)),
            reports: 0,
        }
    }

    /// Append the contribution of one report.
    pub fn push(&mut self, report: &Report) -> Progress {
        self.reports += 1;
        let (contribution, terminated) = match self.termination {
            Termination::ZeroByte => match report.find_zero(1) {
                Some(k) => (&report.as_bytes()[1..k], true),
                None => (report.payload(), false),
            },
            Termination::FullReports => (report.payload(), false),
        };
        self.buffer.extend_from_slice(contribution);

        let reached = self.expected.is_some_and(|n| self.buffer.len() >= n);
        if terminated || reached {
            Progress::Complete
        } else {
            Progress::More
        }
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reports pushed so far.
    pub fn reports(&self) -> usize {
        self.reports
    }

    /// Finish after a [`Progress::Complete`].
    ///
    /// The result is truncated or zero padded to the expected length.
    pub fn finish(self) -> Vec<u8> {
        let mut bytes = self.buffer.to_vec();
        if let Some(expected) = self.expected {
            bytes.resize(expected, 0);
        }
        bytes
    }

    /// Finish because the channel went quiet.
    ///
    /// Without an expected length the timeout is the end of the message; with
    /// one, falling short of it is a truncated response.
    pub fn finish_on_timeout(self) -> Result<Vec<u8>, OKError> {
        match self.expected {
            Some(expected) if self.buffer.len() < expected => Err(OKError::ResponseTruncated {
                expected,
                received: self.buffer.len(),
            }),
            _ => Ok(self.finish()),
        }
    }
}

/// Read reports until the response is complete.
pub async fn read_response<T: Transport>(
    transport: &mut T,
    termination: Termination,
    expected: Option<usize>,
    timeout: Duration,
) -> Result<Vec<u8>, OKError> {
    let mut reassembler = Reassembler::new(termination, expected);
    loop {
        match transport.read_report(timeout).await {
            Ok(report) => {
                if reassembler.push(&report) == Progress::Complete {
                    debug!(
                        reports = reassembler.reports(),
                        len = reassembler.len(),
                        "Response complete"
                    );
                    return Ok(reassembler.finish());
                }
            }
            Err(OKError::Timeout(_)) => {
                debug!(
                    reports = reassembler.reports(),
                    len = reassembler.len(),
                    "Response ended by timeout"
                );
                return reassembler.finish_on_timeout();
            }
            Err(e) => return Err(e),
        }
    }
}
