//! Transaction identifier sequencing
//!
//! Every request frame carries a 2-byte TID. A single process-wide counter
//! is shared by all exchanges regardless of the target device, starting at 1
//! and wrapping at 65536.

use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};

/// 16-bit transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u16);

impl TransactionId {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Big-endian wire encoding
    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

static GLOBAL: TransactionIdGenerator = TransactionIdGenerator::new();

/// Monotonic, wrapping TID counter
///
/// `next` is a single atomic fetch-and-add, so concurrent callers never see
/// the same value twice within one 65536-request window.
#[derive(Debug)]
pub struct TransactionIdGenerator {
    next: AtomicU16,
}

impl TransactionIdGenerator {
    /// Create a counter starting at 1
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    pub const fn starting_at(start: u16) -> Self {
        Self {
            next: AtomicU16::new(start),
        }
    }

    /// The process-wide generator used by request sessions
    pub fn global() -> &'static TransactionIdGenerator {
        &GLOBAL
    }

    /// Return the current value and advance the counter
    pub fn next(&self) -> TransactionId {
        TransactionId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The value the next call to `next` will return
    pub fn peek(&self) -> TransactionId {
        TransactionId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_starts_at_one() {
        let generator = TransactionIdGenerator::new();
        assert_eq!(generator.next().to_bytes(), [0x00, 0x01]);
        assert_eq!(generator.next().to_bytes(), [0x00, 0x02]);
        assert_eq!(generator.peek().value(), 3);
    }

    #[test]
    fn test_wraps_at_u16_max() {
        let generator = TransactionIdGenerator::starting_at(0xFFFF);
        assert_eq!(generator.next().value(), 0xFFFF);
        assert_eq!(generator.next().value(), 0x0000);
        assert_eq!(generator.next().value(), 0x0001);
    }

    #[test]
    fn test_concurrent_next_has_no_gaps_or_duplicates() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1000;

        let generator = Arc::new(TransactionIdGenerator::starting_at(65000));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| generator.next().value())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate transaction id {}", id);
            }
        }

        let expected: HashSet<u16> = (0..THREADS * PER_THREAD)
            .map(|i| 65000u16.wrapping_add(i as u16))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(TransactionId::new(0x1A).to_string(), "001A");
        assert_eq!(TransactionId::from_bytes([0x12, 0x34]).value(), 0x1234);
    }
}
