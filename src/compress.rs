use crate::address::{find_addresses, AddressSubs};
use crate::bits::BitPacker;
use crate::buffer::{replace_word, replace_zero_run, to_slots, Slot};
use crate::envelope::{assemble_double, assemble_single, CompressedCall, Scheme};
use crate::error::{Error, Result};
use crate::marker::{Marker, MarkerAllocator, Opcode};
use crate::zero_run::{collapse_zero_spans, find_best_zero_repeat};
use log::debug;
use std::collections::BTreeMap;

/// Sentinel payload for the reserved best-run marker. The run's actual length
/// travels in the envelope trailer, not here.
const BEST_RUN_SENTINEL: [u8; 2] = [0x00, 0x00];

/// The original-length header is a u16; reject anything wider before doing
/// any scanning work on it.
fn check_original_len(calldata: &[u8]) -> Result<()> {
    if calldata.len() > u16::MAX as usize {
        return Err(Error::InvalidLength {
            what: "original calldata",
            len: calldata.len(),
        });
    }
    Ok(())
}

/// Compress a call buffer with the single-bit scheme.
///
/// The pipeline substitutes registry-approved addresses and repeated zero
/// runs with markers, classifies every remaining byte position into one bit,
/// and assembles the envelope. The transform is lossless and deterministic:
/// the same `(calldata, subs)` pair always yields byte-identical output.
/// All state lives in this call, so concurrent invocations are independent.
pub fn compress_single(calldata: &[u8], subs: &AddressSubs) -> Result<CompressedCall> {
    check_original_len(calldata)?;
    let mut alloc = MarkerAllocator::new();
    let mut opcodes: BTreeMap<Marker, Opcode> = BTreeMap::new();
    let mut buf = to_slots(calldata);

    for address in find_addresses(calldata) {
        let index = match subs.qualify(&address) {
            Some(index) => index,
            None => continue,
        };
        let marker = alloc.next()?;
        opcodes.insert(marker, Opcode::AddressRef { index });
        buf = replace_word(&buf, &address.padded_word(), marker);
    }

    let best_run = find_best_zero_repeat(&buf);
    let best_run_marker = alloc.next()?;
    if best_run > 0 {
        buf = replace_zero_run(&buf, best_run, best_run_marker);
    }
    buf = collapse_zero_spans(&buf, &mut alloc, &mut opcodes)?;

    let mut bits = BitPacker::new();
    let mut payload = Vec::new();
    for slot in &buf {
        match *slot {
            Slot::Byte(0) => bits.push(false),
            Slot::Byte(byte) => {
                bits.push(true);
                payload.push(byte);
            }
            Slot::Sub(marker) if marker == best_run_marker => {
                bits.push(true);
                payload.extend_from_slice(&BEST_RUN_SENTINEL);
            }
            Slot::Sub(marker) => match opcodes.get(&marker) {
                Some(opcode) => {
                    bits.push(true);
                    opcode.write(&mut payload);
                }
                None => return Err(Error::UnrecognizedByte(marker.to_string())),
            },
        }
    }

    let envelope = assemble_single(&bits.into_bytes(), &payload, calldata.len(), best_run as u8)?;
    let call = CompressedCall::new(Scheme::SingleBit, envelope);
    debug!(
        "single-bit: {} bytes -> {} ({} substitutions)",
        calldata.len(),
        call.signature(),
        opcodes.len() + 1,
    );
    Ok(call)
}

/// Compress a call buffer with the double-bit scheme.
///
/// No address substitution: instead the two-bit classification encodes two
/// independent zero-run patterns directly, resolved one after the other, so
/// the second search runs over the buffer the first already rewrote. Run
/// lengths travel in the two-byte trailer.
pub fn compress_double(calldata: &[u8]) -> Result<CompressedCall> {
    check_original_len(calldata)?;
    let mut alloc = MarkerAllocator::new();
    let mut buf = to_slots(calldata);

    let first_run = find_best_zero_repeat(&buf);
    let first_marker = alloc.next()?;
    if first_run > 0 {
        buf = replace_zero_run(&buf, first_run, first_marker);
    }
    let second_run = find_best_zero_repeat(&buf);
    let second_marker = alloc.next()?;
    if second_run > 0 {
        buf = replace_zero_run(&buf, second_run, second_marker);
    }

    let mut bits = BitPacker::new();
    let mut payload = Vec::new();
    for slot in &buf {
        match *slot {
            Slot::Byte(0) => {
                bits.push(false);
                bits.push(false);
            }
            Slot::Byte(byte) => {
                bits.push(true);
                bits.push(false);
                payload.push(byte);
            }
            Slot::Sub(marker) if marker == first_marker => {
                bits.push(false);
                bits.push(true);
            }
            Slot::Sub(marker) if marker == second_marker => {
                bits.push(true);
                bits.push(true);
            }
            Slot::Sub(marker) => return Err(Error::UnrecognizedByte(marker.to_string())),
        }
    }

    let envelope = assemble_double(
        &bits.into_bytes(),
        &payload,
        calldata.len(),
        [first_run as u8, second_run as u8],
    )?;
    let call = CompressedCall::new(Scheme::DoubleBit, envelope);
    debug!(
        "double-bit: {} bytes -> {} (runs {} and {})",
        calldata.len(),
        call.signature(),
        first_run,
        second_run,
    );
    Ok(call)
}
