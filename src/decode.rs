//! Reference implementation of the on-chain decompressor.
//!
//! The production decoder is a deployed contract; this module mirrors its
//! behavior exactly so compressed output can be verified off-chain, and so
//! the round-trip property is testable without a node. Address references
//! are resolved against the same [`AddressSubs`] table used for encoding,
//! standing in for the on-chain address registry.

use crate::address::{AddressSubs, ADDRESS_PAD};
use crate::envelope::{CompressedCall, Envelope, Scheme};
use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};

/// Expand a compressed call back to the original calldata bytes.
pub fn decompress(call: &CompressedCall, subs: &AddressSubs) -> Result<Vec<u8>> {
    let data = call.to_bytes();
    match call.scheme() {
        Scheme::SingleBit => decompress_single(&data, subs),
        Scheme::DoubleBit => match call.envelope() {
            // The inline form carries the 01 type byte; the dynamic entry
            // point is scheme-specific and sends the body bare.
            Envelope::Inline(_) => decompress_double(data.get(1..).unwrap_or(&[])),
            Envelope::Dynamic(_) => decompress_double(&data),
        },
    }
}

fn read_byte(payload: &mut &[u8], step: &'static str) -> Result<u8> {
    payload.read_u8().map_err(|_| Error::Truncated { step })
}

fn decompress_single(data: &[u8], subs: &AddressSubs) -> Result<Vec<u8>> {
    let mut header = data;
    let packed_len = header
        .read_u16::<BigEndian>()
        .map_err(|_| Error::Truncated { step: "packed length" })? as usize;
    let original_len = header
        .read_u16::<BigEndian>()
        .map_err(|_| Error::Truncated { step: "original length" })? as usize;
    let bits = header
        .get(..packed_len)
        .ok_or(Error::Truncated { step: "bit vector" })?;
    // The trailer sits in the very last byte; padding between the payload and
    // the trailer is never reached because expansion stops at original_len.
    let trailer = *data.last().ok_or(Error::Truncated { step: "trailer" })? as usize;
    let mut payload = header
        .get(packed_len..header.len().saturating_sub(1))
        .ok_or(Error::Truncated { step: "payload" })?;

    let mut out = Vec::with_capacity(original_len);
    'expand: for group in bits {
        for bit in 0..8 {
            if out.len() >= original_len {
                break 'expand;
            }
            if group >> bit & 1 == 0 {
                out.push(0);
                continue;
            }
            let byte = read_byte(&mut payload, "payload")?;
            if byte != 0 {
                out.push(byte);
                continue;
            }
            match read_byte(&mut payload, "opcode")? {
                0x00 => out.extend(std::iter::repeat(0).take(trailer)),
                0x02 => {
                    let index = payload
                        .read_u24::<BigEndian>()
                        .map_err(|_| Error::Truncated { step: "address index" })?;
                    let address = subs.address_for(index).ok_or_else(|| {
                        Error::UnrecognizedByte(format!("address index {}", index))
                    })?;
                    out.extend(std::iter::repeat(0).take(ADDRESS_PAD));
                    out.extend_from_slice(address.as_bytes());
                }
                len => out.extend(std::iter::repeat(0).take(len as usize)),
            }
        }
    }
    if out.len() != original_len {
        return Err(Error::Truncated { step: "expansion" });
    }
    Ok(out)
}

fn decompress_double(data: &[u8]) -> Result<Vec<u8>> {
    let mut header = data;
    let packed_len = header
        .read_u24::<BigEndian>()
        .map_err(|_| Error::Truncated { step: "packed length" })? as usize;
    let original_len = header
        .read_u16::<BigEndian>()
        .map_err(|_| Error::Truncated { step: "original length" })? as usize;
    let bits = header
        .get(..packed_len)
        .ok_or(Error::Truncated { step: "bit vector" })?;
    // Both run lengths sit in the final two bytes.
    let first_len = data[data.len() - 2] as usize;
    let second_len = data[data.len() - 1] as usize;
    let mut payload = header
        .get(packed_len..header.len().saturating_sub(2))
        .ok_or(Error::Truncated { step: "payload" })?;

    let mut out = Vec::with_capacity(original_len);
    'expand: for group in bits {
        // Two bits per position, low pair first.
        for pair in 0..4 {
            if out.len() >= original_len {
                break 'expand;
            }
            let low = group >> (pair * 2) & 1;
            let high = group >> (pair * 2 + 1) & 1;
            match (low, high) {
                (0, 0) => out.push(0),
                (0, 1) => out.extend(std::iter::repeat(0).take(first_len)),
                (1, 1) => out.extend(std::iter::repeat(0).take(second_len)),
                (1, 0) => out.push(read_byte(&mut payload, "payload")?),
                _ => unreachable!(),
            }
        }
    }
    if out.len() != original_len {
        return Err(Error::Truncated { step: "expansion" });
    }
    Ok(out)
}
