// Protocol constants for OnlyKey

/// Size of one HID report including the leading report-id byte
pub const REPORT_SIZE: usize = 65;

/// Report-id placeholder followed by the 4-byte magic header
pub const MESSAGE_HEADER: [u8; 5] = [0, 255, 255, 255, 255];

/// Bytes occupied by the report-id and magic header
pub const MESSAGE_HEADER_SIZE: usize = MESSAGE_HEADER.len();

/// Payload bytes carried by an inbound report (everything after the report-id)
pub const REPORT_PAYLOAD_SIZE: usize = REPORT_SIZE - 1;

/// Payload room of a report that carries a message code and a slot number
pub const MAX_PAYLOAD_SIZE: usize = REPORT_SIZE - MESSAGE_HEADER_SIZE - 1 - 1;

/// Data bytes of one chunk, after the length marker
pub const MAX_CHUNK_DATA_SIZE: usize = MAX_PAYLOAD_SIZE - 1;

/// Length marker of a full chunk that is followed by more chunks
pub const CHUNK_MARKER_FULL: u8 = 255;

/// Separator between the slot byte and the label text in label responses
pub const LABEL_SEPARATOR: u8 = b'|';

/// Offset of the label text inside a label response
pub const LABEL_TEXT_OFFSET: usize = 3;

/// Pad bytes the device appends to every label
pub const LABEL_PAD_LEN: usize = 4;

/// Number of label responses sent for one GetLabels request
pub const LABEL_COUNT: usize = 36;

/// Slot byte sent with GetLabels (ASCII 'k' for "key")
pub const LABELS_SLOT_BYTE: u8 = b'k';

/// Modulus bytes per unit of the key-size nibble in the key control byte
pub const MODULUS_UNIT_BYTES: usize = 128;

/// Largest key-size nibble the device accepts (4096-bit keys)
pub const MAX_MODULUS_UNITS: usize = 4;

/// RSA public exponent used by every key the device holds
pub const RSA_PUBLIC_EXPONENT: [u8; 3] = [1, 0, 1];

/// Largest RSA modulus the device can return
pub const MAX_MODULUS_SIZE: usize = 4096 / 8;

/// Known (vendor id, product id) pairs
pub const DEVICE_IDS: &[(u16, u16)] = &[(0x16C0, 0x0486), (0x1D50, 0x60FC)];

/// USB interface class of HID interfaces
pub const HID_INTERFACE_CLASS: u8 = 0x03;
