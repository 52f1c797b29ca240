use crate::error::{Error, Result};
use crate::{SELECTOR_SIZE, WORD_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of leading zero bytes padding an address up to a full word.
pub(crate) const ADDRESS_PAD: usize = 12;

/// Wildcard filtering rejects a candidate with more zero hex digits than
/// this. Value words holding small integers match the address shape too, and
/// their digits are mostly zero; real addresses are close to uniformly random.
const MAX_WILDCARD_ZERO_NIBBLES: usize = 5;

/// A 20-byte contract or account address.
///
/// Parses from hex with or without a `0x` prefix, in either case, and
/// displays as prefixed lowercase hex, the form the registry uses for table
/// keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The full 32-byte word this address occupies in ABI-encoded arguments.
    pub fn padded_word(&self) -> [u8; WORD_SIZE] {
        let mut word = [0u8; WORD_SIZE];
        word[ADDRESS_PAD..].copy_from_slice(&self.0);
        word
    }

    /// Count of zero hex digits among the 40 making up the address.
    pub(crate) fn zero_nibbles(&self) -> usize {
        self.0
            .iter()
            .map(|b| (b >> 4 == 0) as usize + (b & 0x0f == 0) as usize)
            .sum()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let err = Error::InvalidLength {
            what: "address",
            len: digits.len(),
        };
        if digits.len() != 40 {
            return Err(err);
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| err)?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_string()
    }
}

/// The caller-supplied substitution table: which addresses may be replaced,
/// and the registry index each one resolves to on-chain.
///
/// The codec trusts this table completely; it never checks that an index is
/// actually registered. Indices wider than 24 bits are truncated on encode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressSubs {
    #[serde(default)]
    subs: BTreeMap<Address, u32>,
    #[serde(default)]
    wildcard: bool,
}

impl AddressSubs {
    /// An empty allow-list. Nothing qualifies until addresses are inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table in wildcard mode: any address-shaped word qualifies as long as
    /// it passes the zero-digit heuristic and has a registry index here.
    pub fn wildcard() -> Self {
        AddressSubs {
            subs: BTreeMap::new(),
            wildcard: true,
        }
    }

    pub fn insert(&mut self, address: Address, index: u32) {
        self.subs.insert(address, index);
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Apply the filtering policy to a candidate: `Some(index)` if it should
    /// be substituted. Under an explicit allow-list only listed addresses
    /// qualify. Under wildcard, a candidate whose digits are more than
    /// [`MAX_WILDCARD_ZERO_NIBBLES`] zeros is rejected as a probable numeric
    /// argument rather than an address; a surviving candidate still needs a
    /// table entry, since without a registry index the decompressor could
    /// never resolve the reference.
    pub(crate) fn qualify(&self, address: &Address) -> Option<u32> {
        if self.wildcard && address.zero_nibbles() > MAX_WILDCARD_ZERO_NIBBLES {
            return None;
        }
        self.subs.get(address).copied()
    }

    /// Reverse lookup for the decoder: the address registered at `index`.
    /// Matches the 24-bit truncation applied on encode.
    pub fn address_for(&self, index: u32) -> Option<Address> {
        self.subs
            .iter()
            .find(|(_, &v)| v & 0x00ff_ffff == index)
            .map(|(a, _)| *a)
    }
}

/// Scan the argument region for address-shaped words: 12 zero bytes followed
/// by 20 address bytes. Matches are leftmost and non-overlapping (a match
/// consumes the full word, a miss advances one byte). The result is
/// deduplicated, preserving first-seen order, which in turn fixes marker
/// assignment order.
pub(crate) fn find_addresses(calldata: &[u8]) -> Vec<Address> {
    let mut found: Vec<Address> = Vec::new();
    let args = match calldata.get(SELECTOR_SIZE..) {
        Some(args) => args,
        None => return found,
    };
    let mut i = 0;
    while i + WORD_SIZE <= args.len() {
        if args[i..i + ADDRESS_PAD].iter().all(|&b| b == 0) {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&args[i + ADDRESS_PAD..i + WORD_SIZE]);
            let address = Address(bytes);
            if !found.contains(&address) {
                found.push(address);
            }
            i += WORD_SIZE;
        } else {
            i += 1;
        }
    }
    found
}
