//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use onlykey_lib::challenge::ChallengeCode;
#[allow(unused_imports)]
pub use onlykey_lib::config::{DeviceConfig, FinalChunkPolicy, KeyLayout, RetryPolicy};
#[allow(unused_imports)]
pub use onlykey_lib::error::OKError;
#[allow(unused_imports)]
pub use onlykey_lib::report::Report;
#[allow(unused_imports)]
pub use onlykey_lib::transport::ScriptedTransport;
#[allow(unused_imports)]
pub use onlykey_lib::{ChannelPrompt, Field, KeyFeatures, Message, OnlyKey, RsaKeyMaterial, SlotId, Termination};

/// Offset of the first payload byte in a report carrying message and slot
#[allow(dead_code)]
pub const BODY_OFFSET: usize = 7;

/// Route library logs to the test harness; `RUST_LOG=debug` shows raw reports.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Queue `message` the way the device answers a decrypt: 64-byte reports,
/// zero terminated.
#[allow(dead_code)]
pub fn push_zero_terminated(transport: &mut ScriptedTransport, message: &[u8]) {
    let mut bytes = message.to_vec();
    bytes.push(0);
    for payload in bytes.chunks(64) {
        transport.push_payload(payload);
    }
}

/// Queue one `[slot, '|', label, pad x4]` label record.
#[allow(dead_code)]
pub fn push_label(transport: &mut ScriptedTransport, slot: u8, label: &str) {
    let mut payload = vec![slot, b'|'];
    payload.extend_from_slice(label.as_bytes());
    payload.extend_from_slice(b"    ");
    transport.push_payload(&payload);
}

/// Deterministic stand-in for an RSA ciphertext.
#[allow(dead_code)]
pub fn sample_ciphertext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

/// Device with settle delays removed so scripted tests run instantly.
#[allow(dead_code)]
pub fn scripted_device(transport: ScriptedTransport) -> OnlyKey<ScriptedTransport> {
    OnlyKey::with_transport(transport, DeviceConfig::immediate())
}
