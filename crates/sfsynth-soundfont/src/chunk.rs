//! RIFF chunk cursor over a byte buffer.
//!
//! All multi-byte integers are little-endian. Offsets reported in errors are
//! absolute positions in the buffer the outermost reader was created from.

use crate::error::{Error, Result};

const HEADER_LEN: usize = 8;

/// One RIFF chunk: a 4-byte tag, its declared size and a view of its payload.
#[derive(Debug, Clone, Copy)]
pub struct RiffChunk<'a> {
    pub tag: [u8; 4],
    pub size: u32,
    /// Absolute offset of the chunk header.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> RiffChunk<'a> {
    /// Tag as text, for diagnostics.
    pub fn tag_str(&self) -> String {
        tag_to_string(&self.tag)
    }

    /// Case-insensitive tag comparison.
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag.as_bytes())
    }

    /// Absolute offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_LEN
    }

    /// A cursor over this chunk's payload.
    pub fn reader(&self) -> ChunkReader<'a> {
        ChunkReader::with_base(self.payload, self.payload_offset())
    }
}

pub(crate) fn tag_to_string(tag: &[u8]) -> String {
    tag.iter().map(|&b| b as char).collect()
}

/// Forward-only cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute position of the cursor.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::MalformedContainer {
                offset: self.position(),
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a chunk header and payload, advancing past the RIFF pad byte
    /// when the payload length is odd.
    pub fn read_chunk(&mut self) -> Result<RiffChunk<'a>> {
        let offset = self.position();
        if self.remaining() < HEADER_LEN {
            return Err(Error::MalformedContainer {
                offset,
                needed: HEADER_LEN,
                available: self.remaining(),
            });
        }
        let tag = self.read_tag()?;
        let size = self.read_u32()?;
        let payload = self.take(size as usize)?;
        if size % 2 == 1 && !self.is_empty() {
            self.pos += 1;
        }
        Ok(RiffChunk {
            tag,
            size,
            offset,
            payload,
        })
    }

    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        let bytes = self.take(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read exactly `len` bytes as a string, cut at the first NUL.
    pub fn read_ascii_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        Ok(bytes
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
