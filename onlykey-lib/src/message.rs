use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumString};

/// Command codes written after the magic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, Display)]
#[repr(u8)]
pub enum Message {
    SetPin = 225,
    SetSelfDestructPin = 226,
    SetPlausibleDeniabilityPin = 227,
    SetTime = 228,
    GetLabels = 229,
    SetSlot = 230,
    WipeSlot = 231,
    SetU2fPrivate = 232,
    WipeU2fPrivate = 233,
    SetU2fCert = 234,
    WipeU2fCert = 235,
    GetPublicKey = 236,
    SignChallenge = 237,
    WipePrivate = 238,
    SetPrivateKey = 239,
    Decrypt = 240,
    Restore = 241,
}

/// Per-slot fields written with [`Message::SetSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(u8)]
pub enum Field {
    Label = 1,
    UserName = 2,
    NextKey2 = 3,
    Delay2 = 4,
    Password = 5,
    NextKey3 = 6,
    Delay3 = 7,
    TfaType = 8,
    TotpKey = 9,
    YubiAuth = 10,
    IdleTimeout = 11,
    WipeMode = 12,
    KeyTypeSpeed = 13,
    KeyLayout = 14,
    Url = 15,
    NextKey1 = 16,
    Delay1 = 17,
    NextKey4 = 18,
    NextKey5 = 19,
}

bitflags! {
    /// Usage flags packed into the high nibble of the private-key control byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyFeatures: u8 {
        const AUTHENTICATION = 1 << 4;
        const DECRYPTION = 1 << 5;
        const SIGNATURE = 1 << 6;
        const BACKUP = 1 << 7;
    }
}
