//! Minimal wire codecs used by the network workers.
//!
//! Encoders write into caller-provided buffers and return the number of
//! bytes written. Decoders borrow from the receive buffer and report
//! `Ok(None)` when more bytes are needed.

pub mod http;
pub mod mqtt;
pub mod url;

/// The output buffer cannot hold the encoded packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct BufferFull;

/// Bounded cursor over an output buffer.
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.pos
    }

    pub(crate) fn put(&mut self, bytes: &[u8]) -> Result<(), BufferFull> {
        let end = self.pos.checked_add(bytes.len()).ok_or(BufferFull)?;
        let slot = self.buf.get_mut(self.pos..end).ok_or(BufferFull)?;
        slot.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub(crate) fn put_u8(&mut self, value: u8) -> Result<(), BufferFull> {
        self.put(&[value])
    }

    pub(crate) fn put_u16(&mut self, value: u16) -> Result<(), BufferFull> {
        self.put(&value.to_be_bytes())
    }
}
