//! The interactive decrypt handshake.
//!
//! ```text
//! Idle -> Sent -> AwaitingPinConfirmation -> Reading -> Done
//!          ^                                    |
//!          +----------- WrongPinRetry <---------+
//! ```
//!
//! After the ciphertext is sent the device waits for the operator to press the
//! challenge buttons. A wrong entry is answered with an empty response, and the
//! same ciphertext is sent again for as long as the [`RetryPolicy`] allows.
//!
//! [`RetryPolicy`]: crate::config::RetryPolicy

use crate::challenge::ChallengeCode;
use crate::chunk::send_chunked;
use crate::config::DeviceConfig;
use crate::error::OKError;
use crate::message::Message;
use crate::prompt::PinPrompt;
use crate::reassembly::{Progress, Reassembler, Termination};
use crate::transport::Transport;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptState {
    Idle,
    Sent,
    AwaitingPinConfirmation,
    Reading,
    WrongPinRetry,
    Done,
}

/// Outcome of one read phase.
enum ReadOutcome {
    Plaintext(Vec<u8>),
    WrongPin,
}

/// One decrypt request against one device slot.
pub struct DecryptSession<'a, T, P> {
    transport: &'a mut T,
    prompt: &'a mut P,
    config: &'a DeviceConfig,
    slot: u8,
    ciphertext: &'a [u8],
    state: DecryptState,
    wrong_pins: u32,
}

impl<'a, T: Transport, P: PinPrompt> DecryptSession<'a, T, P> {
    /// `slot` is the device-side RSA slot number (1-4).
    pub fn new(
        transport: &'a mut T,
        prompt: &'a mut P,
        config: &'a DeviceConfig,
        slot: u8,
        ciphertext: &'a [u8],
    ) -> Self {
        Self {
            transport,
            prompt,
            config,
            slot,
            ciphertext,
            state: DecryptState::Idle,
            wrong_pins: 0,
        }
    }

    pub fn state(&self) -> DecryptState {
        self.state
    }

    /// Wrong PIN entries seen so far.
    pub fn wrong_pins(&self) -> u32 {
        self.wrong_pins
    }

    fn transition(&mut self, next: DecryptState) {
        debug!(from = ?self.state, to = ?next, "Decrypt state");
        self.state = next;
    }

    /// Drive the handshake to completion and return the plaintext as sent by
    /// the device, zero terminator excluded.
    pub async fn run(&mut self) -> Result<Vec<u8>, OKError> {
        let challenge = ChallengeCode::from_ciphertext(self.ciphertext);
        loop {
            send_chunked(
                self.transport,
                Message::Decrypt,
                self.slot,
                self.ciphertext,
                self.config.final_chunk,
            )
            .await?;
            self.transition(DecryptState::Sent);

            let attempt = self.wrong_pins + 1;
            info!(attempt, "Enter the challenge pin: {}", challenge);
            self.prompt.show_challenge(challenge, attempt);
            self.transition(DecryptState::AwaitingPinConfirmation);
            self.prompt.wait_for_pin().await?;

            info!("PIN entered");
            self.transition(DecryptState::Reading);
            if !self.config.pin_settle.is_zero() {
                tokio::time::sleep(self.config.pin_settle).await;
            }

            match self.read_plaintext().await? {
                ReadOutcome::Plaintext(plaintext) => {
                    self.transition(DecryptState::Done);
                    info!("Decrypt returned {} bytes", plaintext.len());
                    return Ok(plaintext);
                }
                ReadOutcome::WrongPin => {
                    self.wrong_pins += 1;
                    self.transition(DecryptState::WrongPinRetry);
                    if !self.config.retry.allows_retry(self.wrong_pins) {
                        return Err(OKError::RetriesExhausted {
                            attempts: self.wrong_pins,
                        });
                    }
                    warn!(wrong_pins = self.wrong_pins, "Wrong PIN, resending ciphertext");
                }
            }
        }
    }

    async fn read_plaintext(&mut self) -> Result<ReadOutcome, OKError> {
        let termination = self.config.decrypt_termination;
        let mut reassembler = Reassembler::new(termination, None);
        loop {
            match self.transport.read_report(self.config.read_timeout).await {
                Ok(report) => {
                    // Full reports carry no terminator, so the empty wrong-PIN
                    // answer shows up as an all-zero first report.
                    if termination == Termination::FullReports
                        && reassembler.is_empty()
                        && report.payload().iter().all(|&b| b == 0)
                    {
                        return Ok(ReadOutcome::WrongPin);
                    }
                    if reassembler.push(&report) == Progress::Complete {
                        if reassembler.is_empty() {
                            return Ok(ReadOutcome::WrongPin);
                        }
                        return Ok(ReadOutcome::Plaintext(reassembler.finish()));
                    }
                }
                // Decryption can take a while.
                Err(OKError::Timeout(_)) if reassembler.is_empty() => {
                    debug!("No response yet, still waiting for the device");
                }
                // A message ending on a report boundary has no zero terminator.
                Err(OKError::Timeout(_)) => return Ok(ReadOutcome::Plaintext(reassembler.finish())),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Strip the zero padding the device leaves after a plaintext.
pub fn trim_trailing_zeros(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}
