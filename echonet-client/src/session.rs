//! Request/response exchange
//!
//! A `RequestSession` runs one exchange at a time per call:
//!
//! 1. **Resolve**: look up the device record; unknown keys fail before any
//!    network I/O
//! 2. **Encode**: build the request frame with a fresh TID
//! 3. **Exchange**: send, then wait for a reply up to the configured timeout
//! 4. **Decode**: classify the reply; acknowledged payloads become values
//! 5. **Publish**: hand the value to the sink and the value cache
//! 6. **Release**: close the socket whatever the outcome
//!
//! Exchanges are never retried. Each call creates and destroys its own
//! socket, so concurrent calls share nothing but the TID counter.

use crate::directory::SharedDirectory;
use crate::payload::Payload;
use crate::settings::{ClientSettings, ReplyFilter};
use crate::sink::{EventSink, ValueCache};
use bytes::Bytes;
use echonet_core::{
    bytes_to_hex, DecodedValue, DeviceRecord, EchonetResult, TransactionId, TransactionIdGenerator,
};
use echonet_frame::{FrameReader, RequestFrame, ResponseFrame};
use echonet_transport::{Datagram, DatagramTransport, Received, UdpTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Instant;

/// One exchange to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Item the decoded value is published under
    pub item: String,
    /// Device key in the directory
    pub device: String,
    /// EPC as hex
    pub property_code: String,
    pub payload: Payload,
}

impl Request {
    /// A property read (empty EDT)
    pub fn read(
        item: impl Into<String>,
        device: impl Into<String>,
        property_code: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            device: device.into(),
            property_code: property_code.into(),
            payload: Payload::Empty,
        }
    }

    /// A property write
    pub fn write(
        item: impl Into<String>,
        device: impl Into<String>,
        property_code: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            payload,
            ..Self::read(item, device, property_code)
        }
    }
}

/// Result of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// TID the request was sent with
    pub tid: TransactionId,
    pub response: ResponseFrame,
    /// The value published, if the reply carried one
    pub value: Option<DecodedValue>,
}

impl Exchange {
    pub fn published(&self) -> bool {
        self.value.is_some()
    }
}

/// Runs request/response exchanges against configured devices
#[derive(Clone)]
pub struct RequestSession {
    directory: Arc<SharedDirectory>,
    sink: Arc<dyn EventSink>,
    cache: Arc<ValueCache>,
    settings: ClientSettings,
    tids: &'static TransactionIdGenerator,
}

impl RequestSession {
    /// Create a session drawing TIDs from the process-wide generator
    pub fn new(
        directory: Arc<SharedDirectory>,
        sink: Arc<dyn EventSink>,
        cache: Arc<ValueCache>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            directory,
            sink,
            cache,
            settings,
            tids: TransactionIdGenerator::global(),
        }
    }

    /// Use a different TID generator
    pub fn with_transaction_ids(mut self, tids: &'static TransactionIdGenerator) -> Self {
        self.tids = tids;
        self
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn directory(&self) -> &Arc<SharedDirectory> {
        &self.directory
    }

    pub fn cache(&self) -> &Arc<ValueCache> {
        &self.cache
    }

    /// Run one exchange over a fresh UDP socket
    ///
    /// # Errors
    /// Returns `UnknownDevice` without touching the network if the device is
    /// not configured; otherwise configuration, frame and transport errors.
    /// A missing or unusable reply is not an error.
    pub async fn execute(&self, request: &Request) -> EchonetResult<Exchange> {
        let device = self.directory.resolve(&request.device).await.inspect_err(|e| {
            log::warn!("Item '{}' skipped: {}", request.item, e);
        })?;

        let mut transport = UdpTransport::new(self.settings.udp_settings(&device));
        let result = self.execute_with(&mut transport, &device, request).await;
        transport.disconnect();

        if let Err(e) = &result {
            log::error!(
                "Exchange for item '{}' with device '{}' failed: {}",
                request.item,
                device.key(),
                e
            );
        }
        result
    }

    /// Run one exchange over a caller-supplied transport
    ///
    /// The transport is left open; releasing it is the caller's job.
    pub async fn execute_with<T>(
        &self,
        transport: &mut T,
        device: &DeviceRecord,
        request: &Request,
    ) -> EchonetResult<Exchange>
    where
        T: DatagramTransport + ?Sized,
    {
        let host = device.require_host()?;
        let payload = request.payload.to_bytes()?;
        let frame = RequestFrame::build(device, &request.property_code, &payload, self.tids)?;

        let target = transport.send(frame.as_bytes(), host, device.port()).await?;
        log::debug!(
            "Sent {} to device '{}' at {} for item '{}'",
            frame,
            device.key(),
            target,
            request.item
        );

        let reply = self.await_reply(transport, target, frame.tid()).await?;
        let response = match &reply {
            Some(raw) => ResponseFrame::classify(raw),
            None => ResponseFrame::NoReply,
        };
        log_response(&request.item, device, reply.as_deref(), &response);

        let value = response.payload().and_then(DecodedValue::from_payload);
        if let Some(value) = &value {
            self.publish(&request.item, value);
        }

        Ok(Exchange {
            tid: frame.tid(),
            response,
            value,
        })
    }

    async fn await_reply<T>(
        &self,
        transport: &mut T,
        target: SocketAddr,
        tid: TransactionId,
    ) -> EchonetResult<Option<Bytes>>
    where
        T: DatagramTransport + ?Sized,
    {
        let deadline = Instant::now() + self.settings.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            match transport.receive(remaining).await? {
                Received::NoReply => return Ok(None),
                Received::Datagram(datagram) => {
                    if self.accepts(&datagram, target, tid) {
                        return Ok(Some(datagram.payload).filter(|payload| !payload.is_empty()));
                    }
                    log::warn!(
                        "Discarding datagram {} from {} while waiting for TID {} from {}",
                        bytes_to_hex(&datagram.payload),
                        datagram.source,
                        tid,
                        target
                    );
                }
            }
        }
    }

    fn accepts(&self, datagram: &Datagram, target: SocketAddr, tid: TransactionId) -> bool {
        match self.settings.reply_filter {
            ReplyFilter::AcceptAny => true,
            ReplyFilter::Strict => {
                datagram.source.ip() == target.ip()
                    && FrameReader::new(&datagram.payload).tid() == Some(tid)
            }
        }
    }

    fn publish(&self, item: &str, value: &DecodedValue) {
        self.cache.insert(item, value.clone());
        self.sink.publish(item, value);
    }
}

fn log_response(item: &str, device: &DeviceRecord, raw: Option<&[u8]>, response: &ResponseFrame) {
    let raw = raw.map(bytes_to_hex).unwrap_or_default();
    match response {
        ResponseFrame::NoReply => {
            log::debug!("Nothing was sent back by device '{}' for item '{}'", device.key(), item)
        }
        ResponseFrame::ApplicationError { code } => log::info!(
            "Device '{}' returned an error (ESV={}) for item '{}'; state not updated",
            device.key(),
            code,
            item
        ),
        ResponseFrame::SetAck { .. } => {
            log::info!("SetC executed by device '{}' for item '{}'", device.key(), item)
        }
        ResponseFrame::GetAck { .. } => {
            log::info!("Get executed by device '{}' for item '{}'", device.key(), item)
        }
        ResponseFrame::Unhandled { .. } => log::warn!(
            "Device '{}' sent {} for item '{}': {}; no usable value ({})",
            device.key(),
            response,
            item,
            raw,
            bytes_to_hex(response.payload_or_fallback())
        ),
        ResponseFrame::MalformedTooShort | ResponseFrame::UnknownServiceCode { .. } => log::warn!(
            "Device '{}' sent {} for item '{}': {}",
            device.key(),
            response,
            item,
            raw
        ),
    }
}
