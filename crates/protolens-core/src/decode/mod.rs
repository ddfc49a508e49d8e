//! Region-tracking decoder.
//!
//! Walks a buffer with one shared [`WireReader`](crate::wire::WireReader),
//! resolves each tag against the bound schema, and produces both the value
//! tree and a flat list of [`ByteRegion`]s, one per field occurrence.
//!
//! Decoding is all-or-nothing: out-of-bounds reads, boundary mismatches and
//! malformed tags abort with a single [`DecodeFailure`]. Unknown fields, map
//! fields, unsupported types and wire-type mismatches are recovered locally;
//! they show up as [`DecodedValue::Skipped`] placeholders.

pub mod error;
pub mod parser;
pub mod path;
pub mod region;
pub mod value;

pub use error::{DecodeErrorKind, DecodeFailure};
pub use parser::{DEFAULT_MAX_DEPTH, DecodeOptions, DecodeOutput, RegionDecoder, decode};
pub use region::ByteRegion;
pub use value::{DecodedValue, MessageValue, ScalarValue, SkipReason};
