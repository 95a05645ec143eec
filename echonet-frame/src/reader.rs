//! Structured field access over a received frame
//!
//! Fixed positions: EHD at 0, TID at 2, SEOJ at 4, DEOJ at 7, ESV at 10,
//! OPC at 11, then the first property triple: EPC at 12, PDC at 13, EDT
//! from 14. Only the first property is read.

use crate::esv::ServiceCode;
use echonet_core::TransactionId;

pub const EHD_OFFSET: usize = 0;
pub const TID_OFFSET: usize = 2;
pub const SEOJ_OFFSET: usize = 4;
pub const DEOJ_OFFSET: usize = 7;
pub const ESV_OFFSET: usize = 10;
pub const OPC_OFFSET: usize = 11;
pub const EPC_OFFSET: usize = 12;
pub const PDC_OFFSET: usize = 13;
pub const EDT_OFFSET: usize = 14;

/// Borrowing reader; every accessor returns `None` when the frame is too
/// short to hold the field
#[derive(Debug, Clone, Copy)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn ehd(&self) -> Option<[u8; 2]> {
        self.array(EHD_OFFSET)
    }

    pub fn tid(&self) -> Option<TransactionId> {
        self.array(TID_OFFSET).map(TransactionId::from_bytes)
    }

    pub fn seoj(&self) -> Option<[u8; 3]> {
        self.array(SEOJ_OFFSET)
    }

    pub fn deoj(&self) -> Option<[u8; 3]> {
        self.array(DEOJ_OFFSET)
    }

    pub fn esv(&self) -> Option<ServiceCode> {
        self.byte(ESV_OFFSET).map(ServiceCode::new)
    }

    pub fn opc(&self) -> Option<u8> {
        self.byte(OPC_OFFSET)
    }

    pub fn epc(&self) -> Option<u8> {
        self.byte(EPC_OFFSET)
    }

    pub fn pdc(&self) -> Option<u8> {
        self.byte(PDC_OFFSET)
    }

    /// EDT of the first property
    ///
    /// Truncated to what the frame actually holds when PDC claims more.
    pub fn edt(&self) -> Option<&'a [u8]> {
        let pdc = usize::from(self.pdc()?);
        let end = (EDT_OFFSET + pdc).min(self.buf.len());
        Some(&self.buf[EDT_OFFSET.min(end)..end])
    }

    fn byte(&self, at: usize) -> Option<u8> {
        self.buf.get(at).copied()
    }

    fn array<const N: usize>(&self, at: usize) -> Option<[u8; N]> {
        self.buf.get(at..at + N)?.try_into().ok()
    }
}
