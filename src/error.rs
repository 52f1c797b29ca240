use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure is fatal for the compression attempt it occurred in: the
/// codec never retries internally and never returns partial output. Most
/// variants indicate malformed input; [`Error::UnrecognizedByte`] means an
/// internal invariant was violated and should be reported as a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A length didn't fit where it had to: odd-length hex input, or a buffer
    /// whose header length field would overflow its fixed width.
    InvalidLength { what: &'static str, len: usize },
    /// More distinct substitutions were needed than the two-character marker
    /// alphabet can issue.
    MarkerExhausted,
    /// Classification encountered a byte string with no known mapping. The
    /// substitution stages only ever insert markers they record opcodes for,
    /// so this is an internal consistency failure, not bad input.
    UnrecognizedByte(String),
    /// The assembled payload wasn't a whole number of 32-byte words after
    /// padding.
    ChunkingMismatch { len: usize },
    /// Compressed data ended before the decoder finished reconstructing the
    /// promised number of bytes.
    Truncated { step: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidLength { what, len } => {
                write!(f, "Invalid length {} for {}", len, what)
            }
            Error::MarkerExhausted => f.write_str("No more substitution markers"),
            Error::UnrecognizedByte(ref byte) => {
                write!(f, "Unrecognized byte string \"{}\"", byte)
            }
            Error::ChunkingMismatch { len } => write!(
                f,
                "Payload of {} bytes cannot be chunked evenly into words",
                len
            ),
            Error::Truncated { step } => {
                write!(f, "Compressed data ended too early on step [{}]", step)
            }
        }
    }
}

impl std::error::Error for Error {}
