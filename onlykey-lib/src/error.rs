use crate::slot::SlotId;
use nusb::transfer::TransferError;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `onlykey-lib` library.
#[derive(Error, Debug)]
pub enum OKError {
    #[error("USB device not found. Is the OnlyKey plugged in?")]
    DeviceNotFound,

    #[error("No raw HID interface with interrupt IN/OUT endpoints found on the device")]
    HidInterfaceNotFound,

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("USB transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("No report received within {0:?}")]
    Timeout(Duration),

    #[error("Report too large: needs {needed} bytes, a report holds {capacity}: {}", hex::encode(raw))]
    PayloadTooLarge {
        needed: usize,
        capacity: usize,
        /// Header and fields framed so far followed by the whole payload.
        raw: Vec<u8>,
    },

    #[error("Response truncated: expected {expected} bytes, received {received}")]
    ResponseTruncated { expected: usize, received: usize },

    #[error("Malformed {context} response: {}", hex::encode(raw))]
    MalformedResponse { context: &'static str, raw: Vec<u8> },

    #[error("Slot {0} cannot be used for this operation")]
    InvalidSlot(SlotId),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Wrong PIN entered {attempts} time(s), retry limit reached")]
    RetriesExhausted { attempts: u32 },

    #[error("Operator prompt closed before the PIN was entered")]
    PromptClosed,
}
