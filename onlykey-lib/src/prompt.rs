//! The operator side of a decrypt: showing the challenge and learning when the
//! PIN has been entered on the device.

use crate::challenge::ChallengeCode;
use crate::error::OKError;
use tokio::sync::mpsc;
use tracing::warn;

#[allow(async_fn_in_trait)]
pub trait PinPrompt {
    /// Show the buttons to press. `attempt` starts at 1 and grows after each wrong PIN.
    fn show_challenge(&mut self, code: ChallengeCode, attempt: u32);

    /// Resolve once the operator has finished entering the PIN. May wait forever.
    async fn wait_for_pin(&mut self) -> Result<(), OKError>;
}

/// Signal that the PIN has been entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEntered;

/// A [`PinPrompt`] driven through channels, for callers with their own input loop.
#[derive(Debug)]
pub struct ChannelPrompt {
    challenges: mpsc::UnboundedSender<ChallengeCode>,
    entered: mpsc::UnboundedReceiver<PinEntered>,
}

/// The caller's ends of a [`ChannelPrompt`].
#[derive(Debug)]
pub struct OperatorHandle {
    pub challenges: mpsc::UnboundedReceiver<ChallengeCode>,
    pub entered: mpsc::UnboundedSender<PinEntered>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, OperatorHandle) {
        let (challenge_tx, challenge_rx) = mpsc::unbounded_channel();
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        (
            Self {
                challenges: challenge_tx,
                entered: entered_rx,
            },
            OperatorHandle {
                challenges: challenge_rx,
                entered: entered_tx,
            },
        )
    }
}

impl PinPrompt for ChannelPrompt {
    fn show_challenge(&mut self, code: ChallengeCode, attempt: u32) {
        if self.challenges.send(code).is_err() {
            warn!(attempt, "Challenge {} not delivered, operator handle dropped", code);
        }
    }

    async fn wait_for_pin(&mut self) -> Result<(), OKError> {
        self.entered.recv().await.map(|_| ()).ok_or(OKError::PromptClosed)
    }
}

impl OperatorHandle {
    /// Report the PIN as entered. Returns false if the prompt is gone.
    pub fn confirm(&self) -> bool {
        self.entered.send(PinEntered).is_ok()
    }

    pub async fn next_challenge(&mut self) -> Option<ChallengeCode> {
        self.challenges.recv().await
    }
}
