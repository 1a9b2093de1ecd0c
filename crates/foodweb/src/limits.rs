//! Safety limits applied while decoding untrusted input.
//!
//! All allocations driven by attacker-controlled lengths are bounded by
//! these constants.

/// Longest accepted global id token.
pub const MAX_TOKEN_LEN: usize = 64;

/// Longest accepted digit run for one encoded value within a token.
///
/// 25 base-32 digits stay below `u128::MAX`, so segment accumulation cannot
/// overflow.
pub const MAX_SEGMENT_CHARS: usize = 25;

/// Largest accepted encoded rich payload body, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 8 * 1024;
