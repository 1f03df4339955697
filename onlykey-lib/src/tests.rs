use crate::challenge::{ChallengeCode, button};
use crate::chunk::{Chunk, split};
use crate::config::{FinalChunkPolicy, RetryPolicy};
use crate::constants::{CHUNK_MARKER_FULL, MAX_CHUNK_DATA_SIZE, REPORT_SIZE};
use crate::error::OKError;
use crate::key::{RsaKeyMaterial, interleave};
use crate::labels::parse_label;
use crate::message::{Field, KeyFeatures, Message};
use crate::reassembly::{Progress, Reassembler, Termination};
use crate::report::Report;
use crate::slot::SlotId;
use std::num::NonZeroU32;

fn label_record(slot: u8, label: &str) -> Report {
    let mut payload = vec![slot, b'|'];
    payload.extend_from_slice(label.as_bytes());
    payload.extend_from_slice(b"    ");
    Report::from_payload(&payload)
}

fn concat_data(chunks: &[Chunk<'_>]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.data.iter().copied()).collect()
}

#[test]
fn test_report_header_and_fields() {
    let report = Report::builder()
        .message(Message::Decrypt)
        .slot(4)
        .payload(&[1, 2, 3])
        .build()
        .expect("Failed to build report");
    let bytes = report.as_bytes();

    assert_eq!(bytes.len(), REPORT_SIZE);
    assert_eq!(&bytes[..5], &[0, 255, 255, 255, 255]);
    assert_eq!(&bytes[5..10], &[240, 4, 1, 2, 3]);
    assert!(bytes[10..].iter().all(|&b| b == 0), "Tail should be zero padded");
}

#[test]
fn test_report_omits_absent_parts() {
    let report = Report::builder().slot(0).payload(b"hi").build().unwrap();
    assert_eq!(
        hex::encode(&report.as_bytes()[..8]),
        "00ffffffff686900",
        "Payload should follow the header directly when no message, slot or field is set"
    );
}

#[test]
fn test_report_with_field() {
    let report = Report::builder()
        .message(Message::SetSlot)
        .slot(SlotId::Slot1A.into())
        .field(Field::Label)
        .payload(b"abc")
        .build()
        .unwrap();
    assert_eq!(&report.as_bytes()[5..11], &[230, 1, 1, b'a', b'b', b'c']);
}

#[test]
fn test_report_capacity() {
    let fits = vec![0xAB; 58];
    let report = Report::builder()
        .message(Message::Decrypt)
        .slot(1)
        .payload(&fits)
        .build()
        .expect("58 payload bytes fit next to message and slot");
    assert_eq!(report.as_bytes()[REPORT_SIZE - 1], 0xAB);

    let too_large = vec![0xAB; 59];
    match Report::builder().message(Message::Decrypt).slot(1).payload(&too_large).build() {
        Err(OKError::PayloadTooLarge { needed, capacity, raw }) => {
            assert_eq!(needed, 66);
            assert_eq!(capacity, 65);
            assert_eq!(raw.len(), 66);
            assert_eq!(&raw[..7], &[0, 255, 255, 255, 255, 240, 1]);
            assert_eq!(&raw[7..], &too_large[..]);
        }
        other => panic!("Expected PayloadTooLarge, got {:?}", other),
    }
}

#[test]
fn test_payload_too_large_shows_bytes() {
    let err = Report::builder()
        .message(Message::SetSlot)
        .slot(1)
        .field(Field::Label)
        .payload(&[0x41; 60])
        .build()
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("needs 68 bytes"), "Got {}", text);
    assert!(
        text.ends_with(&format!("00ffffffffe60101{}", "41".repeat(60))),
        "Display should end with the framed bytes, got {}",
        text
    );
}

#[test]
fn test_report_text_stops_at_zero() {
    let report = Report::from_payload(b"Success\0garbage");
    assert_eq!(report.text(), "Success");
}

#[test]
fn test_split_empty_payload() {
    let chunks = split(&[], FinalChunkPolicy::Implicit);
    assert_eq!(chunks, vec![Chunk { marker: 0, data: &[] }]);
}

#[test]
fn test_split_ciphertext() {
    let ciphertext: Vec<u8> = (0..=255).collect();
    let chunks = split(&ciphertext, FinalChunkPolicy::Implicit);

    let markers: Vec<u8> = chunks.iter().map(|c| c.marker).collect();
    assert_eq!(markers, vec![255, 255, 255, 255, 28]);
    assert!(chunks[..4].iter().all(|c| c.data.len() == MAX_CHUNK_DATA_SIZE));
    assert_eq!(concat_data(&chunks), ciphertext);
}

#[test]
fn test_split_exact_multiple() {
    let payload = vec![7u8; MAX_CHUNK_DATA_SIZE * 2];

    let implicit = split(&payload, FinalChunkPolicy::Implicit);
    assert_eq!(implicit.len(), 2);
    assert!(implicit.iter().all(|c| c.marker == CHUNK_MARKER_FULL));

    let terminated = split(&payload, FinalChunkPolicy::Terminated);
    assert_eq!(terminated.len(), 3);
    assert_eq!(terminated[2], Chunk { marker: 0, data: &[] });
    assert!(terminated[2].is_final());
}

#[test]
fn test_chunk_payload_layout() {
    let chunk = Chunk { marker: 3, data: &[9, 8, 7] };
    assert_eq!(chunk.to_payload(), vec![3, 9, 8, 7]);
}

#[test]
fn test_interleave_q_first() {
    assert_eq!(interleave(&[1, 2, 3], &[9]), vec![9, 1, 2, 3]);
    assert_eq!(interleave(&[1], &[7, 8, 9]), vec![7, 8, 9, 1]);
}

#[test]
fn test_key_stream_2048() {
    let key = RsaKeyMaterial::new(vec![0xAA; 128], vec![0xBB; 128], 256).expect("Valid 2048-bit key");
    let stream = key.stream(KeyFeatures::DECRYPTION);

    assert_eq!(stream.len(), 257);
    assert_eq!(stream[0], 0x22, "Decryption flag with two 128-byte modulus units");
    assert!(stream[1..129].iter().all(|&b| b == 0xBB), "Q comes first");
    assert!(stream[129..].iter().all(|&b| b == 0xAA), "P follows Q");

    // The third chunk holds the tail of Q and the head of P.
    let chunks = split(&stream, FinalChunkPolicy::Implicit);
    assert_eq!(chunks.len(), 5);
    assert_eq!(chunks[2].data[..15], [0xBB; 15]);
    assert_eq!(chunks[2].data[15..], [0xAA; 42]);
}

#[test]
fn test_key_control_byte_flags() {
    let key = RsaKeyMaterial::new(vec![1; 256], vec![2; 256], 512).unwrap();
    assert_eq!(
        key.control_byte(KeyFeatures::DECRYPTION | KeyFeatures::SIGNATURE),
        0x20 | 0x40 | 4
    );
}

#[test]
fn test_key_validation() {
    assert!(matches!(
        RsaKeyMaterial::new(vec![1; 100], vec![2; 100], 200),
        Err(OKError::InvalidKey(_))
    ));
    assert!(matches!(
        RsaKeyMaterial::new(vec![1; 320], vec![2; 320], 640),
        Err(OKError::InvalidKey(_))
    ));
    assert!(matches!(
        RsaKeyMaterial::new(vec![], vec![2; 128], 256),
        Err(OKError::InvalidKey(_))
    ));
}

#[test]
fn test_button_mapping() {
    assert_eq!(button(0), 1);
    assert_eq!(button(3), 1);
    assert_eq!(button(5), 1);
    assert_eq!(button(6), 2);
    assert_eq!(button(7), 3);
    assert_eq!(button(10), 1);
    assert_eq!(button(255), 1);
}

#[test]
fn test_challenge_from_digest_positions() {
    let mut digest = [0xFFu8; 32];
    digest[0] = 3;
    digest[15] = 9;
    digest[31] = 42;
    assert_eq!(ChallengeCode::from_digest(&digest).buttons(), [1, 5, 3]);
}

#[test]
fn test_challenge_from_known_digest() {
    // SHA-256("abc") = ba7816bf 8f01cfea 414140de 5dae2223 b00361a3 96177a9c b410ff61 f20015ad
    // 0xba = 186 -> 2, 0x23 = 35 -> 1, 0xad = 173 -> 4
    let code = ChallengeCode::from_ciphertext(b"abc");
    assert_eq!(code.buttons(), [2, 1, 4]);
    assert_eq!(code.to_string(), "(2) (1) (4)");
}

#[test]
fn test_parse_label() {
    let (slot, label) = parse_label(&label_record(25, "first")).expect("Well-formed label");
    assert_eq!(slot, 25);
    assert_eq!(label, "first");

    let (_, empty) = parse_label(&label_record(1, "")).unwrap();
    assert_eq!(empty, "");
}

#[test]
fn test_parse_label_bad_separator() {
    let report = Report::from_payload(&[25, b':', b'x', 0]);
    match parse_label(&report) {
        Err(OKError::MalformedResponse { context, raw }) => {
            assert_eq!(context, "label");
            assert_eq!(raw.len(), REPORT_SIZE);
            assert_eq!(raw[2], b':');
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[test]
fn test_slot_numbers() {
    assert_eq!(SlotId::RsaKey1.rsa_number(), Some(1));
    assert_eq!(SlotId::RsaKey4.rsa_number(), Some(4));
    assert_eq!(SlotId::Slot1A.rsa_number(), None);
    assert_eq!(SlotId::EccKey1.rsa_number(), None);
    assert_eq!(SlotId::EccKey1.ecc_number(), Some(1));
    assert_eq!(SlotId::EccKey32.ecc_number(), Some(32));
    assert_eq!(u8::from(SlotId::Slot4B), 16);
}

#[test]
fn test_slot_names() {
    assert_eq!("rsa4".parse::<SlotId>().unwrap(), SlotId::RsaKey4);
    assert_eq!("1A".parse::<SlotId>().unwrap(), SlotId::Slot1A);
    assert_eq!(SlotId::RsaKey2.to_string(), "rsa2");
    assert_eq!("user-name".parse::<Field>().unwrap(), Field::UserName);
    assert!(SlotId::try_from(10u8).is_err(), "10 is in the gap between 3b and 4b");
}

#[test]
fn test_reassembler_zero_terminated() {
    let full = Report::from_payload(&[0x41; 64]);
    let k = 11;
    let mut partial_payload = vec![0x42; k - 1];
    partial_payload.push(0);
    let partial = Report::from_payload(&partial_payload);

    let mut reassembler = Reassembler::new(Termination::ZeroByte, None);
    assert_eq!(reassembler.push(&full), Progress::More);
    assert_eq!(reassembler.push(&full), Progress::More);
    assert_eq!(reassembler.push(&partial), Progress::Complete);
    assert_eq!(reassembler.reports(), 3);

    let bytes = reassembler.finish();
    assert_eq!(bytes.len(), 64 * 2 + (k - 1));
    assert_eq!(bytes[127], 0x41);
    assert_eq!(bytes[128], 0x42);
}

#[test]
fn test_reassembler_pads_to_expected() {
    let mut reassembler = Reassembler::new(Termination::ZeroByte, Some(10));
    assert_eq!(reassembler.push(&Report::from_payload(b"abcd")), Progress::Complete);
    assert_eq!(reassembler.finish(), b"abcd\0\0\0\0\0\0".to_vec());
}

#[test]
fn test_reassembler_full_reports() {
    let report = Report::from_payload(&[0x00, 0x01, 0x00, 0x02]);
    let mut reassembler = Reassembler::new(Termination::FullReports, Some(100));
    assert_eq!(reassembler.push(&report), Progress::More, "Zero bytes do not end binary responses");
    assert_eq!(reassembler.push(&report), Progress::Complete);
    assert_eq!(reassembler.finish().len(), 100);
}

#[test]
fn test_reassembler_timeout_rules() {
    let report = Report::from_payload(&[0x55; 64]);

    let mut unknown = Reassembler::new(Termination::FullReports, None);
    unknown.push(&report);
    assert_eq!(unknown.finish_on_timeout().unwrap().len(), 64);

    let mut known = Reassembler::new(Termination::FullReports, Some(256));
    known.push(&report);
    match known.finish_on_timeout() {
        Err(OKError::ResponseTruncated { expected, received }) => {
            assert_eq!(expected, 256);
            assert_eq!(received, 64);
        }
        other => panic!("Expected ResponseTruncated, got {:?}", other),
    }
}

#[test]
fn test_retry_policy() {
    assert!(RetryPolicy::Unbounded.allows_retry(u32::MAX));
    let limited = RetryPolicy::Limited(NonZeroU32::new(2).unwrap());
    assert!(limited.allows_retry(1));
    assert!(!limited.allows_retry(2));
}
