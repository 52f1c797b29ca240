//! calldata-pack shrinks ABI-encoded calldata into a bit-packed form that an
//! on-chain decompressor contract expands back to the original bytes before
//! executing the call. Calldata is billed per byte, with zero bytes far cheaper
//! than non-zero ones, so most of the win comes from not paying for the zero
//! padding that ABI encoding scatters through every argument word.
//!
//! Two schemes are provided:
//!
//! - The **single-bit scheme** ([`compress_single`]) spends one classification
//!   bit per byte. Registered contract addresses are replaced by short registry
//!   references, repeated runs of zero bytes collapse to length opcodes, and
//!   everything else rides along as literal bytes in a payload stream.
//! - The **double-bit scheme** ([`compress_double`]) spends two bits per byte
//!   and encodes two independent zero-run patterns directly in the bit vector,
//!   skipping address substitution entirely.
//!
//! Neither scheme is always the smaller one, and the codec deliberately does
//! not pick for you: run [`gas_cost`] over the candidate outputs and choose.
//!
//! ```
//! use calldata_pack::{compress_single, decompress, parse_hex, AddressSubs};
//!
//! let mut subs = AddressSubs::new();
//! subs.insert("0x1234567890abcdef1234567890abcdef12345678".parse()?, 1);
//!
//! let calldata = parse_hex(concat!(
//!     "0xa9059cbb",
//!     "0000000000000000000000001234567890abcdef1234567890abcdef12345678",
//!     "0000000000000000000000000000000000000000000000000000000000000064",
//! ))?;
//! let call = compress_single(&calldata, &subs)?;
//! assert_eq!(call.signature(), "decompress(bytes32[1])");
//! assert_eq!(decompress(&call, &subs)?, calldata);
//! # Ok::<(), calldata_pack::Error>(())
//! ```
//!
//! The compressed output must be consumed by the already-deployed decompressor
//! contract, so the wire format here is a fixed external contract: the bit
//! packing order, header fields, padding and trailer placement all have to
//! match it exactly. The [`decode`] module carries a reference implementation
//! of that contract for verification.

mod address;
mod bits;
mod buffer;
mod compress;
mod envelope;
mod error;
mod gas;
mod marker;
mod zero_run;

pub mod decode;

pub use self::address::{Address, AddressSubs};
pub use self::compress::{compress_double, compress_single};
pub use self::decode::decompress;
pub use self::envelope::{CompressedCall, Envelope, Scheme, Word};
pub use self::error::{Error, Result};
pub use self::gas::{gas_cost, GAS_PER_NONZERO_BYTE, GAS_PER_ZERO_BYTE};
pub use self::marker::{Marker, MarkerAllocator, Opcode, MARKER_CAPACITY};

/// Size of one EVM word. Argument data is aligned to this, and the inline
/// envelope is emitted as an array of words.
pub const WORD_SIZE: usize = 32;

/// Size of the function selector at the front of every call buffer.
pub const SELECTOR_SIZE: usize = 4;

/// Largest assembled payload that still fits the decompressor's fixed-width
/// word array: 32 words of 32 bytes, minus one byte reserved for the type
/// marker. Anything larger falls back to the dynamic-bytes envelope.
pub const MAX_INLINE_SIZE: usize = WORD_SIZE * 32 - 1;

/// Parse a `0x`-prefixed (or bare) hex string into calldata bytes.
///
/// The registry and most tooling hand calldata around as hex strings; this is
/// the one place string input is accepted. An odd number of hex digits, or
/// anything that isn't a hex digit, fails with [`Error::InvalidLength`].
pub fn parse_hex(data: &str) -> Result<Vec<u8>> {
    let data = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(data).map_err(|_| Error::InvalidLength {
        what: "hex calldata",
        len: data.len(),
    })
}
