//! Arbitrary-width feature values.
//!
//! A [`FeatureValue`] is a fixed-width bit vector, least significant bit
//! first. Because the width is the vector length, a value can never exceed
//! `2^width - 1`; literals that would need more bits are rejected when parsed.

use bitvec::prelude::*;
use std::fmt;

/// Radix of a based literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// `'b`
    Binary,
    /// `'o`
    Octal,
    /// `'d`, or a plain decimal number
    Decimal,
    /// `'h`
    Hex,
}

impl Radix {
    /// Maps a radix letter (case-insensitive) to a radix.
    pub fn from_letter(c: u8) -> Option<Self> {
        match c.to_ascii_lowercase() {
            b'b' => Some(Radix::Binary),
            b'o' => Some(Radix::Octal),
            b'd' => Some(Radix::Decimal),
            b'h' => Some(Radix::Hex),
            _ => None,
        }
    }

    /// Returns the numeric base.
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }

    fn bits_per_digit(self) -> Option<usize> {
        match self {
            Radix::Binary => Some(1),
            Radix::Octal => Some(3),
            Radix::Hex => Some(4),
            Radix::Decimal => None,
        }
    }
}

impl fmt::Display for Radix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Radix::Binary => 'b',
            Radix::Octal => 'o',
            Radix::Decimal => 'd',
            Radix::Hex => 'h',
        };
        write!(f, "{c}")
    }
}

/// Failure to turn literal digits into a value of a given width.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The literal has no digits.
    #[error("literal has no digits")]
    Empty,
    /// A digit is not valid in the literal's radix.
    #[error("invalid digit '{digit}' for radix {radix}")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// The literal's radix.
        radix: Radix,
    },
    /// The value needs more bits than the target width.
    #[error("value does not fit in {width} bit(s)")]
    TooWide {
        /// The target width.
        width: u32,
    },
}

/// Largest feature width the parser accepts. Bit indices must be below it.
pub const MAX_FEATURE_WIDTH: u32 = 1 << 20;

/// A non-negative integer of exactly `width` bits.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FeatureValue {
    bits: BitVec,
}

impl FeatureValue {
    /// Creates an all-zero value of the given width.
    pub fn zero(width: u32) -> Self {
        Self {
            bits: BitVec::repeat(false, width as usize),
        }
    }

    /// Creates a value from a machine integer, or `None` if it does not fit.
    pub fn from_u64(value: u64, width: u32) -> Option<Self> {
        if width < 64 && value >> width != 0 {
            return None;
        }
        let mut out = Self::zero(width);
        for i in 0..width.min(64) {
            out.bits.set(i as usize, (value >> i) & 1 == 1);
        }
        Some(out)
    }

    /// Wraps a bit vector (LSB first); its length becomes the width.
    pub fn from_bits(bits: BitVec) -> Self {
        Self { bits }
    }

    /// Parses literal digits (underscores allowed) into a value of `width` bits.
    ///
    /// # Errors
    ///
    /// Returns a [`ValueError`] if there are no digits, a digit is invalid for
    /// the radix, or the value needs more than `width` bits.
    pub fn parse_digits(radix: Radix, digits: &str, width: u32) -> Result<Self, ValueError> {
        let digits: Vec<u32> = digits
            .chars()
            .filter(|c| *c != '_')
            .map(|c| {
                c.to_digit(radix.base())
                    .ok_or(ValueError::InvalidDigit { digit: c, radix })
            })
            .collect::<Result<_, _>>()?;
        if digits.is_empty() {
            return Err(ValueError::Empty);
        }

        let mut out = Self::zero(width);
        let too_wide = ValueError::TooWide { width };

        if let Some(per_digit) = radix.bits_per_digit() {
            for (n, digit) in digits.iter().rev().enumerate() {
                for k in 0..per_digit {
                    if (digit >> k) & 1 == 1 {
                        let pos = n * per_digit + k;
                        if pos >= width as usize {
                            return Err(too_wide);
                        }
                        out.bits.set(pos, true);
                    }
                }
            }
            return Ok(out);
        }

        // Decimal: accumulate in base-2^32 limbs, least significant first.
        let mut limbs: Vec<u32> = Vec::new();
        for digit in digits {
            let mut carry = u64::from(digit);
            for limb in limbs.iter_mut() {
                let v = u64::from(*limb) * 10 + carry;
                *limb = v as u32;
                carry = v >> 32;
            }
            if carry != 0 {
                limbs.push(carry as u32);
            }
        }
        for (l, limb) in limbs.iter().enumerate() {
            for k in 0..32 {
                if (limb >> k) & 1 == 1 {
                    let pos = l * 32 + k;
                    if pos >= width as usize {
                        return Err(too_wide);
                    }
                    out.bits.set(pos, true);
                }
            }
        }
        Ok(out)
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Returns bit `i` (0 = least significant); bits past the width read as 0.
    pub fn bit(&self, i: u32) -> bool {
        self.bits.get(i as usize).is_some_and(|b| *b)
    }

    /// Sets bit `i`. Indices past the width are ignored.
    pub fn set_bit(&mut self, i: u32, value: bool) {
        if let Some(mut b) = self.bits.get_mut(i as usize) {
            *b = value;
        }
    }

    /// Returns the bits, least significant first.
    pub fn bits(&self) -> &BitSlice {
        &self.bits
    }

    /// Returns whether every bit is 0.
    pub fn is_zero(&self) -> bool {
        self.bits.not_any()
    }

    /// Returns the value as a machine integer if it fits in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.bits.iter_ones().any(|i| i >= 64) {
            return None;
        }
        Some(self.bits.iter_ones().fold(0u64, |acc, i| acc | (1 << i)))
    }

    /// Formats the value as binary digits, most significant first, `width` digits.
    pub fn to_binary_string(&self) -> String {
        self.bits
            .iter()
            .rev()
            .map(|b| if *b { '1' } else { '0' })
            .collect()
    }

    /// Formats the value as lowercase hex digits, most significant first,
    /// `ceil(width / 4)` digits.
    pub fn to_hex_string(&self) -> String {
        let digits = (self.bits.len()).div_ceil(4);
        (0..digits)
            .rev()
            .map(|d| {
                let nibble = (0..4).fold(0u32, |acc, k| {
                    acc | (u32::from(self.bit((d * 4 + k) as u32)) << k)
                });
                char::from_digit(nibble, 16).unwrap_or('0')
            })
            .collect()
    }
}

impl fmt::Debug for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{}", self.width(), self.to_binary_string())
    }
}
