use crate::error::{Error, Result};
use crate::{MAX_INLINE_SIZE, WORD_SIZE};

/// One 32-byte word of the inline envelope.
pub type Word = [u8; WORD_SIZE];

/// Which compression scheme produced a call. Determines the dynamic-envelope
/// signature and how the decompressor interprets the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    SingleBit,
    DoubleBit,
}

/// The outer wire shape of a compressed call.
///
/// The decompressor accepts a fixed-capacity `bytes32` array on its cheap
/// path; a payload too large for that falls back to a single dynamic `bytes`
/// argument. The choice is one explicit capacity comparison at assembly time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope {
    Inline(Vec<Word>),
    Dynamic(Vec<u8>),
}

// Single-bit body layout:
//  1. 2-byte packed bit-vector length
//  2. 2-byte original calldata length
//  3. The packed bit-vector
//  4. The payload stream
//  5. 1-byte zero-run length for the reserved sentinel marker
//
// Double-bit body layout:
//  1. 3-byte packed bit-vector length
//  2. 2-byte original calldata length
//  3. The packed bit-vector
//  4. The payload stream
//  5. 2 bytes: first and second pattern run lengths
//
// The dynamic envelope is the body as-is. The inline envelope pads the body
// with zeros to a whole number of words and relocates the trailer (5.) to the
// very end, so the decompressor can read it at a fixed offset from the back;
// the double-bit inline form is additionally prefixed by an 01 type byte.
// When the body is already word-aligned a full word of padding is still
// inserted; the deployed decompressor expects it.

/// A compressed call, ready to be sent to the decompressor contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedCall {
    scheme: Scheme,
    envelope: Envelope,
}

impl CompressedCall {
    pub(crate) fn new(scheme: Scheme, envelope: Envelope) -> Self {
        CompressedCall { scheme, envelope }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The decompressor function to invoke for this envelope.
    pub fn signature(&self) -> String {
        match (&self.envelope, self.scheme) {
            (Envelope::Inline(words), _) => format!("decompress(bytes32[{}])", words.len()),
            (Envelope::Dynamic(_), Scheme::SingleBit) => "decompressSingleBitCall(bytes)".into(),
            (Envelope::Dynamic(_), Scheme::DoubleBit) => "decompressDoubleBitCall(bytes)".into(),
        }
    }

    /// The envelope flattened to raw bytes (inline words concatenated).
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.envelope {
            Envelope::Inline(words) => words.concat(),
            Envelope::Dynamic(bytes) => bytes.clone(),
        }
    }

    /// The call arguments as `0x`-prefixed hex: one string per word for the
    /// inline envelope, a single string for the dynamic one.
    pub fn args_hex(&self) -> Vec<String> {
        match &self.envelope {
            Envelope::Inline(words) => words
                .iter()
                .map(|w| format!("0x{}", hex::encode(w)))
                .collect(),
            Envelope::Dynamic(bytes) => vec![format!("0x{}", hex::encode(bytes))],
        }
    }
}

fn chunk_words(data: &[u8]) -> Result<Vec<Word>> {
    if data.len() % WORD_SIZE != 0 {
        return Err(Error::ChunkingMismatch { len: data.len() });
    }
    Ok(data
        .chunks_exact(WORD_SIZE)
        .map(|chunk| {
            let mut word = [0u8; WORD_SIZE];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

fn length_field16(what: &'static str, len: usize) -> Result<[u8; 2]> {
    u16::try_from(len)
        .map(u16::to_be_bytes)
        .map_err(|_| Error::InvalidLength { what, len })
}

pub(crate) fn assemble_single(
    packed: &[u8],
    payload: &[u8],
    original_len: usize,
    trailer: u8,
) -> Result<Envelope> {
    let mut body = Vec::with_capacity(5 + packed.len() + payload.len());
    body.extend_from_slice(&length_field16("packed bit-vector", packed.len())?);
    body.extend_from_slice(&length_field16("original calldata", original_len)?);
    body.extend_from_slice(packed);
    body.extend_from_slice(payload);
    body.push(trailer);
    if body.len() > MAX_INLINE_SIZE {
        return Ok(Envelope::Dynamic(body));
    }
    let fill = WORD_SIZE - body.len() % WORD_SIZE;
    body.pop();
    body.extend(std::iter::repeat(0).take(fill));
    body.push(trailer);
    Ok(Envelope::Inline(chunk_words(&body)?))
}

/// Double-bit inline envelopes carry this type byte first, distinguishing the
/// scheme at the shared `decompress(bytes32[N])` entry point.
const DOUBLE_BIT_TYPE: u8 = 0x01;

pub(crate) fn assemble_double(
    packed: &[u8],
    payload: &[u8],
    original_len: usize,
    trailer: [u8; 2],
) -> Result<Envelope> {
    let packed_len = u32::try_from(packed.len())
        .ok()
        .filter(|&len| len <= 0x00ff_ffff)
        .ok_or(Error::InvalidLength {
            what: "packed bit-vector",
            len: packed.len(),
        })?;
    let mut body = Vec::with_capacity(5 + packed.len() + payload.len());
    body.extend_from_slice(&packed_len.to_be_bytes()[1..]);
    body.extend_from_slice(&length_field16("original calldata", original_len)?);
    body.extend_from_slice(packed);
    body.extend_from_slice(payload);
    if body.len() + trailer.len() > MAX_INLINE_SIZE {
        body.extend_from_slice(&trailer);
        return Ok(Envelope::Dynamic(body));
    }
    let fill = WORD_SIZE - (body.len() + trailer.len() + 1) % WORD_SIZE;
    let mut full = Vec::with_capacity(1 + body.len() + fill + trailer.len());
    full.push(DOUBLE_BIT_TYPE);
    full.extend_from_slice(&body);
    full.extend(std::iter::repeat(0).take(fill));
    full.extend_from_slice(&trailer);
    Ok(Envelope::Inline(chunk_words(&full)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_rejects_ragged_data() {
        assert!(matches!(
            chunk_words(&[0u8; 33]),
            Err(Error::ChunkingMismatch { len: 33 })
        ));
        assert_eq!(chunk_words(&[0u8; 64]).unwrap().len(), 2);
    }

    #[test]
    fn single_inline_relocates_trailer_past_padding() {
        // Body of 2 + 2 + 5 + 22 + 1 = 32 bytes: already aligned, so a full
        // extra word of padding appears and the trailer moves to its end.
        let packed = [0xffu8; 5];
        let payload = [0xaau8; 22];
        let env = assemble_single(&packed, &payload, 40, 0x1f).unwrap();
        let words = match env {
            Envelope::Inline(words) => words,
            other => panic!("expected inline envelope, got {:?}", other),
        };
        assert_eq!(words.len(), 2);
        assert_eq!(words[0][..2], [0x00, 0x05]);
        assert_eq!(words[0][2..4], [0x00, 40]);
        assert_eq!(words[1][WORD_SIZE - 1], 0x1f);
        assert!(words[1][..WORD_SIZE - 1].iter().all(|&b| b == 0));
    }

    #[test]
    fn single_overflow_falls_back_to_dynamic() {
        let packed = [0xffu8; 128];
        let payload = [0xaau8; 1024];
        let env = assemble_single(&packed, &payload, 1024, 0).unwrap();
        let bytes = match env {
            Envelope::Dynamic(bytes) => bytes,
            other => panic!("expected dynamic envelope, got {:?}", other),
        };
        // No padding on the dynamic path: headers + body + trailer, verbatim.
        assert_eq!(bytes.len(), 4 + 128 + 1024 + 1);
        assert_eq!(bytes[bytes.len() - 1], 0);
    }

    #[test]
    fn single_rejects_oversized_original() {
        let err = assemble_single(&[], &[], usize::from(u16::MAX) + 1, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidLength { .. }));
    }

    #[test]
    fn double_inline_layout() {
        let packed = [0x0fu8; 4];
        let payload = [0xbbu8; 10];
        let env = assemble_double(&packed, &payload, 36, [100, 6]).unwrap();
        let words = match env {
            Envelope::Inline(words) => words,
            other => panic!("expected inline envelope, got {:?}", other),
        };
        assert_eq!(words.len(), 1);
        let word = words[0];
        assert_eq!(word[0], DOUBLE_BIT_TYPE);
        assert_eq!(word[1..4], [0x00, 0x00, 0x04]);
        assert_eq!(word[4..6], [0x00, 36]);
        assert_eq!(word[6..10], [0x0f; 4]);
        assert_eq!(word[10..20], [0xbb; 10]);
        assert!(word[20..30].iter().all(|&b| b == 0));
        assert_eq!(word[30..], [100, 6]);
    }

    #[test]
    fn double_dynamic_has_no_type_byte() {
        let packed = [0xffu8; 200];
        let payload = [0xaau8; 1024];
        let env = assemble_double(&packed, &payload, 2048, [7, 5]).unwrap();
        let bytes = match env {
            Envelope::Dynamic(bytes) => bytes,
            other => panic!("expected dynamic envelope, got {:?}", other),
        };
        assert_eq!(bytes[..3], [0x00, 0x00, 200]);
        assert_eq!(bytes[bytes.len() - 2..], [7, 5]);
    }

    #[test]
    fn signatures_follow_scheme_and_shape() {
        let inline = CompressedCall::new(Scheme::SingleBit, Envelope::Inline(vec![[0u8; 32]; 3]));
        assert_eq!(inline.signature(), "decompress(bytes32[3])");
        let single = CompressedCall::new(Scheme::SingleBit, Envelope::Dynamic(vec![1, 2]));
        assert_eq!(single.signature(), "decompressSingleBitCall(bytes)");
        let double = CompressedCall::new(Scheme::DoubleBit, Envelope::Dynamic(vec![1, 2]));
        assert_eq!(double.signature(), "decompressDoubleBitCall(bytes)");
    }

    #[test]
    fn hex_args_match_envelope_shape() {
        let call = CompressedCall::new(Scheme::SingleBit, Envelope::Dynamic(vec![0xab, 0xcd]));
        assert_eq!(call.args_hex(), vec!["0xabcd".to_string()]);
        let call = CompressedCall::new(Scheme::SingleBit, Envelope::Inline(vec![[0u8; 32]; 2]));
        assert_eq!(call.args_hex().len(), 2);
        assert!(call.args_hex()[0].starts_with("0x0000"));
    }
}
