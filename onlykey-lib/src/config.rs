use crate::reassembly::Termination;
use std::num::NonZeroU32;
use std::time::Duration;

// Default timeout for HID operations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// How many times a decrypt is resent after a wrong PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Keep resending until the operator gets the PIN right.
    #[default]
    Unbounded,
    /// Give up after this many wrong PIN entries.
    Limited(NonZeroU32),
}

impl RetryPolicy {
    /// Whether another attempt is allowed after `failed` wrong PIN entries.
    pub fn allows_retry(&self, failed: u32) -> bool {
        match self {
            RetryPolicy::Unbounded => true,
            RetryPolicy::Limited(limit) => failed < limit.get(),
        }
    }
}

/// What to send when a chunked payload ends exactly on a full chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalChunkPolicy {
    /// The last full chunk keeps marker 255; the device counts bytes to see the end.
    #[default]
    Implicit,
    /// Follow a full last chunk with an empty chunk carrying marker 0.
    Terminated,
}

/// Where the private-key control byte goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLayout {
    /// Prepended once to the key stream, first data byte of the first chunk.
    #[default]
    LeadingControlByte,
    /// Repeated at the start of every report in place of the length marker.
    ControlBytePerReport,
}

/// Device and protocol settings.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// HID interface to claim; `None` picks the first raw HID interface.
    pub interface: Option<u8>,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
    /// Delay after the operator confirms the PIN before reading the plaintext.
    pub pin_settle: Duration,
    /// Delay between requesting a public key and reading it.
    pub public_key_settle: Duration,
    pub retry: RetryPolicy,
    pub final_chunk: FinalChunkPolicy,
    pub key_layout: KeyLayout,
    /// How the end of a decrypted plaintext is found. `FullReports` keeps
    /// zero bytes of binary plaintexts and ends the read when the device goes quiet.
    pub decrypt_termination: Termination,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            interface: None,
            write_timeout: Duration::from_secs(1),
            read_timeout: DEFAULT_TIMEOUT,
            pin_settle: Duration::from_millis(500),
            public_key_settle: Duration::from_millis(1500),
            retry: RetryPolicy::default(),
            final_chunk: FinalChunkPolicy::default(),
            key_layout: KeyLayout::default(),
            decrypt_termination: Termination::default(),
        }
    }
}

impl DeviceConfig {
    /// Zero settle delays and short timeouts, for scripted transports.
    pub fn immediate() -> Self {
        Self {
            read_timeout: Duration::from_millis(10),
            pin_settle: Duration::ZERO,
            public_key_settle: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_interface(mut self, interface: u8) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_final_chunk(mut self, final_chunk: FinalChunkPolicy) -> Self {
        self.final_chunk = final_chunk;
        self
    }

    pub fn with_key_layout(mut self, key_layout: KeyLayout) -> Self {
        self.key_layout = key_layout;
        self
    }

    pub fn with_decrypt_termination(mut self, termination: Termination) -> Self {
        self.decrypt_termination = termination;
        self
    }
}
