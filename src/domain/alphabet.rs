//! Positional encoding of counter values into short codes.
//!
//! An [`Alphabet`] is an ordered table of digit symbols; its length is the
//! numeric base. Encoding writes the value most-significant digit first, so
//! distinct values always produce distinct strings and [`Alphabet::decode`]
//! inverts [`Alphabet::encode`].

use std::collections::HashSet;
use std::fmt;

/// Default digit table: `[0-9a-zA-Z]` without the look-alikes `0 1 i l o I L O`.
pub const DEFAULT_ALPHABET: &str = "23456789abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ";

/// Characters that can never be digits because they carry meaning in paths
/// or are rejected by short-code validation.
pub const RESERVED_SYMBOLS: &str = "/#%&@*{}\\:;<>?+ .,'\"$|`^[]";

/// Shortest code length produced by the default counter start.
pub const MIN_CODE_LENGTH: u32 = 3;

/// Errors raised when building an [`Alphabet`] from configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("alphabet must contain at least 2 symbols, got {0}")]
    TooShort(usize),

    #[error("alphabet contains duplicate symbol `{0}`")]
    DuplicateSymbol(char),

    #[error("alphabet contains reserved symbol `{0}`")]
    ReservedSymbol(char),
}

/// Ordered digit table used to encode counter values.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Builds an alphabet, rejecting duplicates, reserved characters,
    /// whitespace and control characters.
    pub fn new(symbols: &str) -> Result<Self, AlphabetError> {
        let symbols: Vec<char> = symbols.chars().collect();

        if symbols.len() < 2 {
            return Err(AlphabetError::TooShort(symbols.len()));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for &c in &symbols {
            if RESERVED_SYMBOLS.contains(c) || c.is_whitespace() || c.is_control() {
                return Err(AlphabetError::ReservedSymbol(c));
            }
            if !seen.insert(c) {
                return Err(AlphabetError::DuplicateSymbol(c));
            }
        }

        Ok(Self { symbols })
    }

    /// Numeric base, i.e. the number of symbols.
    pub fn base(&self) -> u64 {
        self.symbols.len() as u64
    }

    pub fn contains(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }

    pub fn as_string(&self) -> String {
        self.symbols.iter().collect()
    }

    /// Encodes `value` in this alphabet's base, most significant digit first.
    ///
    /// Zero encodes to the first symbol.
    pub fn encode(&self, value: u64) -> String {
        let base = self.base();

        // Highest power of the base not exceeding the value.
        let mut power = 1u64;
        while let Some(next) = power.checked_mul(base) {
            if next > value {
                break;
            }
            power = next;
        }

        let mut remaining = value;
        let mut out = String::new();
        loop {
            let digit = remaining / power;
            out.push(self.symbols[digit as usize]);
            remaining -= digit * power;
            if power == 1 {
                break;
            }
            power /= base;
        }
        out
    }

    /// Decodes a code produced by [`Self::encode`].
    ///
    /// Returns `None` for empty input, unknown symbols, non-canonical leading
    /// zero digits, or values that overflow `u64`.
    pub fn decode(&self, code: &str) -> Option<u64> {
        let mut chars = code.chars().peekable();
        let first = *chars.peek()?;
        if first == self.symbols[0] && code.chars().count() > 1 {
            return None;
        }

        chars.try_fold(0u64, |acc, c| {
            let digit = self.symbols.iter().position(|&s| s == c)? as u64;
            acc.checked_mul(self.base())?.checked_add(digit)
        })
    }

    /// Smallest value whose encoding has at least `length` digits.
    pub fn min_value_for_length(&self, length: u32) -> u64 {
        self.base()
            .checked_pow(length.saturating_sub(1))
            .unwrap_or(u64::MAX)
    }

    /// Default starting counter value: the smallest value that encodes to
    /// [`MIN_CODE_LENGTH`] digits, so no 1 or 2 character codes are issued.
    pub fn default_counter_start(&self) -> u64 {
        self.min_value_for_length(MIN_CODE_LENGTH)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alphabet")
            .field("base", &self.base())
            .field("symbols", &self.as_string())
            .finish()
    }
}
