pub mod challenge;
pub mod chunk;
pub mod config;
pub mod constants;
pub mod decrypt;
pub mod device;
pub mod error;
pub mod key;
pub mod labels;
pub mod message;
pub mod prompt;
pub mod reassembly;
pub mod report;
pub mod slot;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-export the OnlyKey struct and the types its API takes for easy access
pub use config::{DeviceConfig, FinalChunkPolicy, KeyLayout, RetryPolicy};
pub use device::OnlyKey;
pub use error::OKError;
pub use key::RsaKeyMaterial;
pub use message::{Field, KeyFeatures, Message};
pub use prompt::{ChannelPrompt, OperatorHandle, PinPrompt};
pub use reassembly::Termination;
pub use slot::SlotId;
