//! Slot identifiers.
//!
//! Human slots (`1a`..`6b`) are addressed on the wire by their own value. Key
//! slots are numbered from 1 by the device: RSA slot 1 is sent as `1`, not as
//! its logical value 25, so key commands go through [`SlotId::rsa_number`] or
//! [`SlotId::ecc_number`].

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display, EnumString};

const RSA_OFFSET: u8 = SlotId::RsaKey1 as u8 - 1;
const ECC_OFFSET: u8 = SlotId::EccKey1 as u8 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive, Display, EnumString)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum SlotId {
    #[strum(serialize = "1a")]
    Slot1A = 1,
    #[strum(serialize = "2a")]
    Slot2A = 2,
    #[strum(serialize = "3a")]
    Slot3A = 3,
    #[strum(serialize = "4a")]
    Slot4A = 4,
    #[strum(serialize = "5a")]
    Slot5A = 5,
    #[strum(serialize = "6a")]
    Slot6A = 6,
    #[strum(serialize = "1b")]
    Slot1B = 7,
    #[strum(serialize = "2b")]
    Slot2B = 8,
    #[strum(serialize = "3b")]
    Slot3B = 9,
    #[strum(serialize = "4b")]
    Slot4B = 16,
    #[strum(serialize = "5b")]
    Slot5B = 17,
    #[strum(serialize = "6b")]
    Slot6B = 18,
    #[strum(serialize = "rsa1")]
    RsaKey1 = 25,
    #[strum(serialize = "rsa2")]
    RsaKey2 = 26,
    #[strum(serialize = "rsa3")]
    RsaKey3 = 27,
    #[strum(serialize = "rsa4")]
    RsaKey4 = 28,
    #[strum(serialize = "ecc1")]
    EccKey1 = 29,
    #[strum(serialize = "ecc2")]
    EccKey2 = 30,
    #[strum(serialize = "ecc3")]
    EccKey3 = 31,
    #[strum(serialize = "ecc4")]
    EccKey4 = 32,
    #[strum(serialize = "ecc5")]
    EccKey5 = 33,
    #[strum(serialize = "ecc6")]
    EccKey6 = 34,
    #[strum(serialize = "ecc7")]
    EccKey7 = 35,
    #[strum(serialize = "ecc8")]
    EccKey8 = 36,
    #[strum(serialize = "ecc9")]
    EccKey9 = 37,
    #[strum(serialize = "ecc10")]
    EccKey10 = 38,
    #[strum(serialize = "ecc11")]
    EccKey11 = 39,
    #[strum(serialize = "ecc12")]
    EccKey12 = 40,
    #[strum(serialize = "ecc13")]
    EccKey13 = 41,
    #[strum(serialize = "ecc14")]
    EccKey14 = 42,
    #[strum(serialize = "ecc15")]
    EccKey15 = 43,
    #[strum(serialize = "ecc16")]
    EccKey16 = 44,
    #[strum(serialize = "ecc17")]
    EccKey17 = 45,
    #[strum(serialize = "ecc18")]
    EccKey18 = 46,
    #[strum(serialize = "ecc19")]
    EccKey19 = 47,
    #[strum(serialize = "ecc20")]
    EccKey20 = 48,
    #[strum(serialize = "ecc21")]
    EccKey21 = 49,
    #[strum(serialize = "ecc22")]
    EccKey22 = 50,
    #[strum(serialize = "ecc23")]
    EccKey23 = 51,
    #[strum(serialize = "ecc24")]
    EccKey24 = 52,
    #[strum(serialize = "ecc25")]
    EccKey25 = 53,
    #[strum(serialize = "ecc26")]
    EccKey26 = 54,
    #[strum(serialize = "ecc27")]
    EccKey27 = 55,
    #[strum(serialize = "ecc28")]
    EccKey28 = 56,
    #[strum(serialize = "ecc29")]
    EccKey29 = 57,
    #[strum(serialize = "ecc30")]
    EccKey30 = 58,
    #[strum(serialize = "ecc31")]
    EccKey31 = 59,
    #[strum(serialize = "ecc32")]
    EccKey32 = 60,
}

impl SlotId {
    pub fn is_rsa(self) -> bool {
        (SlotId::RsaKey1..=SlotId::RsaKey4).contains(&self)
    }

    pub fn is_ecc(self) -> bool {
        (SlotId::EccKey1..=SlotId::EccKey32).contains(&self)
    }

    /// Device-side number (1-4) of an RSA slot.
    pub fn rsa_number(self) -> Option<u8> {
        self.is_rsa().then(|| u8::from(self) - RSA_OFFSET)
    }

    /// Device-side number (1-32) of an ECC slot.
    pub fn ecc_number(self) -> Option<u8> {
        self.is_ecc().then(|| u8::from(self) - ECC_OFFSET)
    }
}
