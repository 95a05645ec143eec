//! Value publishing

use echonet_core::DecodedValue;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Receiver of decoded item values
///
/// Called from within an exchange, so implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn publish(&self, item: &str, value: &DecodedValue);
}

/// Forwards published values over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<(String, DecodedValue)>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<(String, DecodedValue)>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, item: &str, value: &DecodedValue) {
        if self.tx.send((item.to_string(), value.clone())).is_err() {
            log::warn!("Value for item '{}' dropped: receiver closed", item);
        }
    }
}

/// Last published value per item
#[derive(Debug, Default)]
pub struct ValueCache {
    values: Mutex<HashMap<String, DecodedValue>>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item: &str) -> Option<DecodedValue> {
        self.lock().get(item).cloned()
    }

    /// Store a value, returning the one it replaced
    pub fn insert(&self, item: &str, value: DecodedValue) -> Option<DecodedValue> {
        self.lock().insert(item.to_string(), value)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DecodedValue>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_value_cache() {
        let cache = ValueCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.insert("temp", DecodedValue::Number(21)), None);
        assert_eq!(
            cache.insert("temp", DecodedValue::Number(22)),
            Some(DecodedValue::Number(21))
        );
        assert_eq!(cache.get("temp"), Some(DecodedValue::Number(22)));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        sink.publish("temp", &DecodedValue::Number(7));
        assert_eq!(rx.recv().await, Some(("temp".to_string(), DecodedValue::Number(7))));

        drop(rx);
        sink.publish("temp", &DecodedValue::Number(8));
    }
}
