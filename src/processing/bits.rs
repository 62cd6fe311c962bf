//! # Bit Framing
//!
//! Converts watermark text to and from the length-prefixed bitstream that is
//! written into the carrier's channel low bits.
//!
//! ## Wire Format
//!
//! ```text
//! [16 bits: payload length L in bits, big-endian] [L bits: one byte per character, MSB first]
//! ```
//!
//! Characters are framed one byte each (Latin-1), so only code points up to
//! U+00FF can be embedded.

use super::error::WatermarkError;

/// Number of bits in the length header.
pub const HEADER_BITS: usize = 16;

/// Ordered sequence of single bits, each stored as `0` or `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitstream {
    bits: Vec<u8>,
}

impl Bitstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Append a single bit; only the lowest bit of `bit` is kept.
    pub fn push(&mut self, bit: u8) {
        self.bits.push(bit & 1);
    }

    /// Append the `width` low bits of `value`, most significant first.
    fn push_bits(&mut self, value: u16, width: usize) {
        for shift in (0..width).rev() {
            self.push(((value >> shift) & 1) as u8);
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Read the length header, or `None` while fewer than 16 bits are available.
    pub fn read_header(&self) -> Option<usize> {
        if self.bits.len() < HEADER_BITS {
            return None;
        }
        Some(pack_msb_first(&self.bits[..HEADER_BITS]))
    }

    /// Whether the stream holds the header and all the payload bits it announces.
    pub fn is_complete(&self) -> bool {
        match self.read_header() {
            Some(length) => self.bits.len() >= HEADER_BITS + length,
            None => false,
        }
    }
}

impl From<Vec<u8>> for Bitstream {
    fn from(bits: Vec<u8>) -> Self {
        Self {
            bits: bits.into_iter().map(|bit| bit & 1).collect(),
        }
    }
}

fn pack_msb_first(bits: &[u8]) -> usize {
    bits.iter().fold(0usize, |acc, &bit| (acc << 1) | bit as usize)
}

/// Frame `text` as a length-prefixed bitstream.
///
/// # Errors
/// - [`WatermarkError::UnsupportedCharacter`] for code points above U+00FF
/// - [`WatermarkError::PayloadTooLong`] when `8 * chars` does not fit in the 16-bit header
pub fn encode(text: &str) -> Result<Bitstream, WatermarkError> {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| WatermarkError::UnsupportedCharacter(c)))
        .collect::<Result<Vec<u8>, _>>()?;

    let payload_bits = bytes.len() * 8;
    let header = u16::try_from(payload_bits)
        .map_err(|_| WatermarkError::PayloadTooLong { bits: payload_bits })?;

    let mut stream = Bitstream::with_capacity(HEADER_BITS + payload_bits);
    stream.push_bits(header, HEADER_BITS);
    for byte in bytes {
        stream.push_bits(u16::from(byte), 8);
    }
    Ok(stream)
}

/// Recover the text framed in `stream`.
///
/// Bits past the announced payload are ignored, and a trailing group shorter
/// than eight bits is dropped.
///
/// # Errors
/// - [`WatermarkError::MalformedHeader`] if the stream is shorter than the header,
///   or the header announces more bits than follow it
pub fn decode(stream: &Bitstream) -> Result<String, WatermarkError> {
    let available = stream.len().saturating_sub(HEADER_BITS);
    let length = stream
        .read_header()
        .ok_or(WatermarkError::MalformedHeader {
            claimed: HEADER_BITS,
            available: stream.len(),
        })?;

    if length > available {
        return Err(WatermarkError::MalformedHeader {
            claimed: length,
            available,
        });
    }

    let payload = &stream.bits()[HEADER_BITS..HEADER_BITS + length];
    Ok(payload
        .chunks_exact(8)
        .map(|group| char::from(pack_msb_first(group) as u8))
        .collect())
}
