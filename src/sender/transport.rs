use bytes::Bytes;
use url::Url;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

/// A serialized batch ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub batch_id: Uuid,
    pub event_count: usize,
    pub body: Bytes,
    pub gzip: bool,
}

/// One-way delivery of a serialized batch.
///
/// `send` must return without waiting on the network: implementations
/// dispatch the request and drop its outcome. The collector calls it exactly
/// once per flush and never learns whether delivery succeeded.
#[cfg_attr(test, automock)]
pub trait Transport: Send + Sync {
    fn send(&self, endpoint: &Url, payload: Payload);
}

/// Discards everything. Handy when a host wants the collector wiring
/// without any network traffic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, endpoint: &Url, payload: Payload) {
        tracing::trace!(
            "Dropping batch {} ({} events) for {}",
            payload.batch_id,
            payload.event_count,
            endpoint
        );
    }
}
