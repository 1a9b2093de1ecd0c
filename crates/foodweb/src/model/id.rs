//! Opaque, reversible tokens multiplexing a table discriminant and row id.
//!
//! A token encodes `(table, row)` over a fixed `a-z0-9` alphabet, shuffled
//! by a non-secret salt. The mapping is deterministic — the same pair
//! always yields the same token — and reversible only through this codec.
//! Tokens obfuscate row order; they are **not** an access-control or
//! cryptographic boundary.

use lazy_static::lazy_static;

use crate::error::IdError;
use crate::limits::{MAX_SEGMENT_CHARS, MAX_TOKEN_LEN};

/// Entity tables addressable by global id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Table {
    Animal = 0,
    Plant = 1,
}

impl Table {
    /// Creates a Table from its token discriminant.
    pub fn from_u8(v: u8) -> Option<Table> {
        match v {
            0 => Some(Table::Animal),
            1 => Some(Table::Plant),
            _ => None,
        }
    }

    /// Discriminant encoded into tokens.
    pub fn discriminant(self) -> u8 {
        self as u8
    }

    /// Lowercase table name, for logs and error text.
    pub fn name(self) -> &'static str {
        match self {
            Table::Animal => "animal",
            Table::Plant => "plant",
        }
    }
}

/// Token alphabet. Fixed: tokens are part of the external interface.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Shuffle salt. Not secret; it only decouples token text from row order.
const SALT: &[u8] = b"hANklaTERciUmpkiStERAVEnGtoRnaLI";

/// Separator chars carved out of the shuffled alphabet.
const SEPARATOR_COUNT: usize = 4;

/// The salt-shuffled alphabet, split into separators and digits.
struct Alphabet {
    digits: Vec<u8>,
    separators: Vec<u8>,
}

lazy_static! {
    static ref SHUFFLED: Alphabet = Alphabet::new();
}

impl Alphabet {
    fn new() -> Self {
        let mut chars = ALPHABET.to_vec();
        // Salt-driven in-place shuffle. Deterministic, so encode and decode
        // agree across processes.
        let mut p = 0usize;
        for (v, i) in (1..chars.len()).rev().enumerate() {
            let salt_byte = SALT[v % SALT.len()] as usize;
            p += salt_byte;
            let j = (salt_byte + v + p) % i;
            chars.swap(i, j);
        }
        let separators = chars[..SEPARATOR_COUNT].to_vec();
        let digits = chars[SEPARATOR_COUNT..].to_vec();
        Self { digits, separators }
    }

    fn base(&self) -> u128 {
        self.digits.len() as u128
    }

    fn digit_index(&self, c: u8) -> Option<usize> {
        self.digits.iter().position(|&d| d == c)
    }

    fn is_separator(&self, c: u8) -> bool {
        self.separators.contains(&c)
    }

    /// Rotation applied to the digit alphabet for the value at `index` in a
    /// token whose lottery digit is `lottery`.
    ///
    /// Equal values at different positions, or under different lottery
    /// digits, share no visible digit pattern.
    fn rotation(&self, lottery: usize, index: usize) -> usize {
        let salt_byte = SALT[index % SALT.len()] as usize;
        (lottery + (index + 1) * salt_byte) % self.digits.len()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a value sequence into one token.
pub fn encode_values(values: &[u64]) -> String {
    let wide: Vec<u128> = values.iter().map(|&v| v as u128).collect();
    encode_raw(&wide)
}

fn encode_raw(values: &[u128]) -> String {
    let alphabet = &*SHUFFLED;
    // The lottery digit is a function of the values, so the whole token
    // stays deterministic.
    let seed: usize = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (v % (100 + i as u128)) as usize)
        .sum();
    let lottery = seed % alphabet.digits.len();

    let mut out = vec![alphabet.digits[lottery]];
    for (i, &value) in values.iter().enumerate() {
        push_segment(&mut out, value, alphabet.rotation(lottery, i), alphabet);
        if i + 1 < values.len() {
            out.push(alphabet.separators[(value % SEPARATOR_COUNT as u128) as usize]);
        }
    }
    String::from_utf8(out).expect("token alphabet is ascii")
}

fn push_segment(out: &mut Vec<u8>, value: u128, rotation: usize, alphabet: &Alphabet) {
    let base = alphabet.base();
    let size = alphabet.digits.len();
    let mut digits = Vec::new();
    let mut v = value;
    loop {
        digits.push(((v % base) as usize + rotation) % size);
        v /= base;
        if v == 0 {
            break;
        }
    }
    for &d in digits.iter().rev() {
        out.push(alphabet.digits[d]);
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a token back into its value sequence.
///
/// Checks surface shape only; callers layer count and range checks on the
/// returned values. Never panics on any input.
pub fn decode_values(token: &str) -> Result<Vec<u128>, IdError> {
    let alphabet = &*SHUFFLED;
    if token.is_empty() {
        return Err(IdError::InvalidHash {
            reason: "empty token",
        });
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(IdError::InvalidHash {
            reason: "token too long",
        });
    }

    let bytes = token.as_bytes();
    let lottery = alphabet
        .digit_index(bytes[0])
        .ok_or(IdError::InvalidHash {
            reason: "bad lottery character",
        })?;

    let mut values = Vec::new();
    let mut segment: Vec<usize> = Vec::new();
    for &c in &bytes[1..] {
        if alphabet.is_separator(c) {
            let rotation = alphabet.rotation(lottery, values.len());
            values.push(decode_segment(&segment, rotation, alphabet)?);
            segment.clear();
        } else if let Some(d) = alphabet.digit_index(c) {
            segment.push(d);
        } else {
            return Err(IdError::InvalidHash {
                reason: "character outside alphabet",
            });
        }
    }
    let rotation = alphabet.rotation(lottery, values.len());
    values.push(decode_segment(&segment, rotation, alphabet)?);
    Ok(values)
}

fn decode_segment(
    digits: &[usize],
    rotation: usize,
    alphabet: &Alphabet,
) -> Result<u128, IdError> {
    if digits.is_empty() {
        return Err(IdError::InvalidHash {
            reason: "empty value segment",
        });
    }
    if digits.len() > MAX_SEGMENT_CHARS {
        return Err(IdError::InvalidHash {
            reason: "value segment too long",
        });
    }
    let base = alphabet.base();
    let size = alphabet.digits.len();
    let mut value: u128 = 0;
    for &d in digits {
        let unrotated = (d + size - rotation) % size;
        value = value * base + unrotated as u128;
    }
    Ok(value)
}

// =============================================================================
// GLOBAL IDS
// =============================================================================

/// Encodes a `(table, row)` pair as an opaque token.
pub fn to_global_id(table: Table, row: u64) -> String {
    encode_values(&[table.discriminant() as u64, row])
}

/// Decodes a token, rejecting anything outside the valid shape.
pub fn from_global_id(token: &str) -> Result<(Table, u64), IdError> {
    let values = decode_values(token)?;
    if values.len() != 2 {
        return Err(IdError::InvalidLength { values });
    }
    let table_slot = values[0];
    let row_slot = values[1];
    let table_raw =
        u64::try_from(table_slot).map_err(|_| IdError::InvalidTableSlot { value: table_slot })?;
    let row = u64::try_from(row_slot).map_err(|_| IdError::InvalidIdSlot { value: row_slot })?;
    let table = u8::try_from(table_raw)
        .ok()
        .and_then(Table::from_u8)
        .ok_or(IdError::UnknownTable { table: table_raw })?;
    Ok((table, row))
}
