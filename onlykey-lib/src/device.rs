use crate::chunk::{send_chunked, send_with_control_byte};
use crate::config::{DeviceConfig, KeyLayout};
use crate::constants::MAX_MODULUS_SIZE;
use crate::decrypt::{DecryptSession, trim_trailing_zeros};
use crate::error::OKError;
use crate::key::RsaKeyMaterial;
use crate::labels::{KeyLabels, read_labels};
use crate::message::{Field, KeyFeatures, Message};
use crate::prompt::PinPrompt;
use crate::reassembly::{Termination, read_response};
use crate::report::Report;
use crate::slot::SlotId;
use crate::transport::{HidTransport, Transport};
use tracing::info;

/// A connection to an OnlyKey.
///
/// Every operation takes `&mut self`, so only one request is ever in flight.
/// The transport (and with it the claimed USB interface) is released when the
/// value is dropped.
pub struct OnlyKey<T = HidTransport> {
    transport: T,
    config: DeviceConfig,
}

impl OnlyKey<HidTransport> {
    /// Find a connected OnlyKey and claim its raw HID interface.
    pub fn open(config: DeviceConfig) -> Result<Self, OKError> {
        let transport = HidTransport::open(&config)?;
        info!("Communication stream opened successfully.");
        Ok(Self { transport, config })
    }
}

impl<T: Transport> OnlyKey<T> {
    pub fn with_transport(transport: T, config: DeviceConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn rsa_number(slot: SlotId) -> Result<u8, OKError> {
        slot.rsa_number().ok_or(OKError::InvalidSlot(slot))
    }

    /// Read the one-report status text the device sends after a write command.
    async fn read_status(&mut self) -> Result<String, OKError> {
        let report = self.transport.read_report(self.config.read_timeout).await?;
        let status = report.text();
        info!(status = status.as_str(), "Device status");
        Ok(status)
    }

    /// Decrypt `ciphertext` with the RSA key in `slot`.
    ///
    /// The operator is shown a challenge through `prompt` and has to enter it
    /// on the device; a wrong entry resends the request as allowed by the
    /// configured [`RetryPolicy`](crate::config::RetryPolicy).
    pub async fn decrypt<P: PinPrompt>(
        &mut self,
        slot: SlotId,
        ciphertext: &[u8],
        prompt: &mut P,
    ) -> Result<Vec<u8>, OKError> {
        let slot_number = Self::rsa_number(slot)?;
        info!(%slot, len = ciphertext.len(), "Will attempt to decrypt");
        DecryptSession::new(&mut self.transport, prompt, &self.config, slot_number, ciphertext)
            .run()
            .await
    }

    /// Decrypt and decode as text, trailing zero padding removed.
    pub async fn decrypt_string<P: PinPrompt>(
        &mut self,
        slot: SlotId,
        ciphertext: &[u8],
        prompt: &mut P,
    ) -> Result<String, OKError> {
        let bytes = self.decrypt(slot, ciphertext, prompt).await?;
        let trimmed = trim_trailing_zeros(&bytes);
        info!(
            received = bytes.len(),
            trimmed = trimmed.len(),
            "Excluding trailing zeroes from decrypted message"
        );
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }

    /// Install an RSA private key into `slot` and return the device's status text.
    pub async fn install_private_key(
        &mut self,
        slot: SlotId,
        features: KeyFeatures,
        key: &RsaKeyMaterial,
    ) -> Result<String, OKError> {
        let slot_number = Self::rsa_number(slot)?;
        key.validate()?;
        info!(%slot, ?features, ?key, layout = ?self.config.key_layout, "Writing RSA private key");

        match self.config.key_layout {
            KeyLayout::LeadingControlByte => {
                let stream = key.stream(features);
                send_chunked(
                    &mut self.transport,
                    Message::SetPrivateKey,
                    slot_number,
                    &stream,
                    self.config.final_chunk,
                )
                .await?;
            }
            KeyLayout::ControlBytePerReport => {
                send_with_control_byte(
                    &mut self.transport,
                    Message::SetPrivateKey,
                    slot_number,
                    key.control_byte(features),
                    &key.interleave(),
                )
                .await?;
            }
        }
        self.read_status().await
    }

    /// Read the RSA modulus of the key in `slot`.
    ///
    /// With `expected_len` the result is exactly that long and a short response
    /// is an error; without it the response ends when the device goes quiet.
    pub async fn get_public_key(&mut self, slot: SlotId, expected_len: Option<usize>) -> Result<Vec<u8>, OKError> {
        let request = Report::builder()
            .message(Message::GetPublicKey)
            .slot(Self::rsa_number(slot)?)
            .build()?;
        self.transport.write_report(&request).await?;
        if !self.config.public_key_settle.is_zero() {
            tokio::time::sleep(self.config.public_key_settle).await;
        }

        let mut modulus = read_response(
            &mut self.transport,
            Termination::FullReports,
            expected_len,
            self.config.read_timeout,
        )
        .await?;
        modulus.truncate(expected_len.unwrap_or(MAX_MODULUS_SIZE));
        info!(%slot, len = modulus.len(), "Read public key");
        Ok(modulus)
    }

    /// Labels of every slot.
    pub async fn get_labels(&mut self) -> Result<KeyLabels, OKError> {
        read_labels(&mut self.transport, self.config.read_timeout).await
    }

    /// Write `contents` into `field` of `slot`; trailing zero bytes are not sent
    /// but at least one byte always is.
    pub async fn set_field(&mut self, slot: SlotId, field: Field, contents: &[u8]) -> Result<String, OKError> {
        let len = trim_trailing_zeros(contents).len().max(1).min(contents.len());
        self.set_field_exact(slot, field, &contents[..len]).await
    }

    /// Write `contents` into `field` of `slot` as given.
    pub async fn set_field_exact(&mut self, slot: SlotId, field: Field, contents: &[u8]) -> Result<String, OKError> {
        info!(%slot, %field, len = contents.len(), "Setting slot field");
        let request = Report::builder()
            .message(Message::SetSlot)
            .slot(slot.into())
            .field(field)
            .payload(contents)
            .build()?;
        self.transport.write_report(&request).await?;
        self.read_status().await
    }
}
