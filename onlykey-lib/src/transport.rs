//! Report transports.
//!
//! [`HidTransport`] talks to a real device over the interrupt endpoints of its
//! raw HID interface. [`ScriptedTransport`] replays canned responses and
//! records what was written, for tests and dry runs.

use crate::config::DeviceConfig;
use crate::constants::{DEVICE_IDS, HID_INTERFACE_CLASS, REPORT_PAYLOAD_SIZE};
use crate::error::OKError;
use crate::report::Report;
use nusb::transfer::{Direction, EndpointType, RequestBuffer, TransferError};
use nusb::Interface;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

/// Moves whole 65-byte reports to and from a device.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn write_report(&mut self, report: &Report) -> Result<(), OKError>;

    /// Read one report, failing with [`OKError::Timeout`] if none arrives in time.
    async fn read_report(&mut self, timeout: Duration) -> Result<Report, OKError>;
}

/// Raw HID interface of a connected OnlyKey.
///
/// The claimed interface is released when the transport is dropped.
pub struct HidTransport {
    interface: Interface,
    endpoint_out: u8,
    endpoint_in: u8,
    write_timeout: Duration,
}

impl HidTransport {
    /// Find the first known OnlyKey and claim its raw HID interface.
    pub fn open(config: &DeviceConfig) -> Result<Self, OKError> {
        info!("Searching for OnlyKey...");
        let device_info = nusb::list_devices()?
            .find(|d| DEVICE_IDS.contains(&(d.vendor_id(), d.product_id())))
            .ok_or(OKError::DeviceNotFound)?;

        info!(
            "Found device {:04x}:{:04x} on bus {} addr {}",
            device_info.vendor_id(),
            device_info.product_id(),
            device_info.bus_number(),
            device_info.device_address()
        );

        let candidates: Vec<u8> = match config.interface {
            Some(number) => vec![number],
            None => device_info
                .interfaces()
                .filter(|i| i.class() == HID_INTERFACE_CLASS && i.subclass() == 0)
                .map(|i| i.interface_number())
                .collect(),
        };

        let device = device_info.open()?;
        for number in candidates {
            let interface = device.detach_and_claim_interface(number)?;
            if let Some((endpoint_out, endpoint_in)) = interrupt_endpoints(&interface) {
                info!(
                    interface = number,
                    endpoint_out = format!("{endpoint_out:#04x}"),
                    endpoint_in = format!("{endpoint_in:#04x}"),
                    "Raw HID interface claimed"
                );
                return Ok(Self {
                    interface,
                    endpoint_out,
                    endpoint_in,
                    write_timeout: config.write_timeout,
                });
            }
        }
        Err(OKError::HidInterfaceNotFound)
    }
}

fn interrupt_endpoints(interface: &Interface) -> Option<(u8, u8)> {
    let mut endpoint_out = None;
    let mut endpoint_in = None;
    for alt_setting in interface.descriptors() {
        for endpoint in alt_setting.endpoints() {
            if endpoint.transfer_type() != EndpointType::Interrupt {
                continue;
            }
            match endpoint.direction() {
                Direction::Out => endpoint_out = endpoint_out.or(Some(endpoint.address())),
                Direction::In => endpoint_in = endpoint_in.or(Some(endpoint.address())),
            }
        }
    }
    endpoint_out.zip(endpoint_in)
}

impl Transport for HidTransport {
    async fn write_report(&mut self, report: &Report) -> Result<(), OKError> {
        // The report-id byte is not part of the interrupt transfer.
        let data = report.payload().to_vec();
        debug!(bytes = hex::encode(&data), "HID Write");
        let transfer = self.interface.interrupt_out(self.endpoint_out, data);
        let completion = tokio::time::timeout(self.write_timeout, transfer)
            .await
            .map_err(|_| OKError::Timeout(self.write_timeout))?;
        completion.into_result()?;
        Ok(())
    }

    async fn read_report(&mut self, timeout: Duration) -> Result<Report, OKError> {
        let transfer = self
            .interface
            .interrupt_in(self.endpoint_in, RequestBuffer::new(REPORT_PAYLOAD_SIZE));
        let completion = tokio::time::timeout(timeout, transfer)
            .await
            .map_err(|_| OKError::Timeout(timeout))?;
        let data = completion.into_result()?;
        debug!(bytes = hex::encode(&data), "HID Read");
        Ok(Report::from_payload(&data))
    }
}

/// One scripted answer to a read.
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    Report(Report),
    Timeout,
}

/// In-memory transport that answers reads from a queue.
///
/// Once the queue is empty every read fails as if the device had been
/// unplugged, so a script that is too short ends the operation instead of
/// blocking it.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    reads: VecDeque<ScriptedRead>,
    written: Vec<Report>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a report whose payload (bytes after the report-id) is `payload`.
    pub fn push_payload(&mut self, payload: &[u8]) -> &mut Self {
        self.reads.push_back(ScriptedRead::Report(Report::from_payload(payload)));
        self
    }

    pub fn push_report(&mut self, report: Report) -> &mut Self {
        self.reads.push_back(ScriptedRead::Report(report));
        self
    }

    pub fn push_timeout(&mut self) -> &mut Self {
        self.reads.push_back(ScriptedRead::Timeout);
        self
    }

    /// Reports written so far, in order.
    pub fn written(&self) -> &[Report] {
        &self.written
    }

    /// Scripted reads not consumed yet.
    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }
}

impl Transport for ScriptedTransport {
    async fn write_report(&mut self, report: &Report) -> Result<(), OKError> {
        debug!(bytes = hex::encode(report.as_bytes()), "Scripted Write");
        self.written.push(*report);
        Ok(())
    }

    async fn read_report(&mut self, timeout: Duration) -> Result<Report, OKError> {
        match self.reads.pop_front() {
            Some(ScriptedRead::Report(report)) => {
                debug!(bytes = hex::encode(report.as_bytes()), "Scripted Read");
                Ok(report)
            }
            Some(ScriptedRead::Timeout) => Err(OKError::Timeout(timeout)),
            None => Err(OKError::Transfer(TransferError::Disconnected)),
        }
    }
}
