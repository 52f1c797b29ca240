use crate::buffer::Slot;
use crate::error::Result;
use crate::gas::gas_cost;
use crate::marker::{Marker, MarkerAllocator, Opcode};
use log::{log_enabled, trace, Level};
use std::collections::BTreeMap;

/// Window bounds for the repeated-run search, in bytes. The lower bound also
/// keeps zero-run opcode lengths clear of the `00`/`02` opcode selectors; the
/// upper bound keeps a run length inside one byte with room to spare.
pub(crate) const MIN_RUN: usize = 3;
pub(crate) const MAX_RUN: usize = 127;

/// Span bounds for the second, exhaustive substitution pass.
const MIN_SPAN: usize = 24;
const MAX_SPAN: usize = 64;

/// Count non-overlapping occurrences of every window of `window` slots that
/// appears at least twice. Occurrence counting is leftmost-greedy: after a
/// match the scan resumes past it.
fn find_repeats(buf: &[Slot], window: usize) -> BTreeMap<&[Slot], u32> {
    let mut counts: BTreeMap<&[Slot], u32> = BTreeMap::new();
    if window == 0 || buf.len() < window {
        return counts;
    }
    for start in 0..=buf.len() - window {
        let pattern = &buf[start..start + window];
        if counts.contains_key(pattern) {
            continue;
        }
        let mut occurrences = 0u32;
        let mut i = 0;
        while i + window <= buf.len() {
            if &buf[i..i + window] == pattern {
                occurrences += 1;
                i += window;
            } else {
                i += 1;
            }
        }
        if occurrences >= 2 {
            counts.insert(pattern, occurrences);
        }
    }
    counts
}

/// Find the length of the longest all-zero window that repeats in the buffer.
///
/// Scans window lengths from [`MIN_RUN`] up to [`MAX_RUN`], stopping early
/// once a length yields no repeating window at all: if no window of length L
/// repeats, no longer one can either. Selection is by length alone: each
/// candidate's calldata cost is reported for inspection, but a cost-based
/// comparison is deliberately not used to pick the winner. Returns 0 when
/// nothing repeats.
pub(crate) fn find_best_zero_repeat(buf: &[Slot]) -> usize {
    let mut best = 0;
    for window in MIN_RUN..=MAX_RUN {
        let repeats = find_repeats(buf, window);
        if repeats.is_empty() {
            break;
        }
        for (pattern, occurrences) in &repeats {
            if !pattern.iter().all(|s| s.is_zero()) {
                continue;
            }
            if log_enabled!(Level::Trace) {
                let zeros = vec![0u8; window];
                trace!(
                    "zero run candidate: {} bytes x{} (calldata cost {})",
                    window,
                    occurrences,
                    gas_cost(&zeros)
                );
            }
            best = window;
        }
    }
    best
}

/// Second substitution pass: collapse any remaining span of [`MIN_SPAN`] or
/// more consecutive zero slots, in chunks of at most [`MAX_SPAN`], each chunk
/// under its own freshly allocated marker and `ZeroRun` opcode. Recovers
/// savings on large runs the single best-run substitution left behind. A
/// remainder below the span minimum stays as literal zeros for the bit
/// classifier to absorb.
pub(crate) fn collapse_zero_spans(
    buf: &[Slot],
    alloc: &mut MarkerAllocator,
    opcodes: &mut BTreeMap<Marker, Opcode>,
) -> Result<Vec<Slot>> {
    let mut out = Vec::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        if !buf[i].is_zero() {
            out.push(buf[i]);
            i += 1;
            continue;
        }
        let mut run = 0;
        while i + run < buf.len() && buf[i + run].is_zero() {
            run += 1;
        }
        let mut rest = run;
        while rest >= MIN_SPAN {
            let take = rest.min(MAX_SPAN);
            let marker = alloc.next()?;
            opcodes.insert(marker, Opcode::ZeroRun { len: take as u8 });
            out.push(Slot::Sub(marker));
            rest -= take;
        }
        out.extend(std::iter::repeat(Slot::Byte(0)).take(rest));
        i += run;
    }
    Ok(out)
}
