use crate::constants::{
    LABEL_COUNT, LABEL_PAD_LEN, LABEL_SEPARATOR, LABEL_TEXT_OFFSET, LABELS_SLOT_BYTE, REPORT_SIZE,
};
use crate::error::OKError;
use crate::message::Message;
use crate::report::Report;
use crate::slot::SlotId;
use crate::transport::Transport;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Labels of every slot, keyed by the raw slot byte the device reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLabels(BTreeMap<u8, String>);

impl KeyLabels {
    pub fn get(&self, slot: SlotId) -> Option<&str> {
        self.get_raw(slot.into())
    }

    pub fn get_raw(&self, slot: u8) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw slot byte, the slot it names (if known) and its label.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Option<SlotId>, &str)> {
        self.0
            .iter()
            .map(|(&raw, label)| (raw, SlotId::try_from(raw).ok(), label.as_str()))
    }
}

/// Parse one `[0, slot, '|', label..., pad x4, 0...]` record.
pub fn parse_label(report: &Report) -> Result<(u8, String), OKError> {
    let bytes = report.as_bytes();
    if bytes[2] != LABEL_SEPARATOR {
        return Err(OKError::MalformedResponse {
            context: "label",
            raw: bytes.to_vec(),
        });
    }
    let end = report.find_zero(LABEL_TEXT_OFFSET).unwrap_or(REPORT_SIZE);
    let text_end = end.saturating_sub(LABEL_PAD_LEN).max(LABEL_TEXT_OFFSET);
    let label = String::from_utf8_lossy(&bytes[LABEL_TEXT_OFFSET..text_end]).into_owned();
    Ok((bytes[1], label))
}

/// Request the labels and read the fixed number of records that follow.
pub async fn read_labels<T: Transport>(transport: &mut T, timeout: Duration) -> Result<KeyLabels, OKError> {
    let request = Report::builder()
        .message(Message::GetLabels)
        .slot(LABELS_SLOT_BYTE)
        .build()?;
    transport.write_report(&request).await?;

    let mut labels = BTreeMap::new();
    for _ in 0..LABEL_COUNT {
        let report = transport.read_report(timeout).await?;
        let (slot, label) = parse_label(&report)?;
        debug!(slot, label = label.as_str(), "Label record");
        if labels.insert(slot, label).is_some() {
            return Err(OKError::MalformedResponse {
                context: "duplicate label",
                raw: report.as_bytes().to_vec(),
            });
        }
    }
    info!("Read {} slot labels", labels.len());
    Ok(KeyLabels(labels))
}
