//! Value-based comparison of Kubernetes resource quantities
//!
//! `k8s_openapi`'s `Quantity` is a plain string, so `"1000m"` and `"1"` compare
//! unequal even though the API server treats them as the same amount. This
//! module parses quantities into an exact count of nano-units so they can be
//! compared by value.
//!
//! Accepted forms: `<number><suffix>` where number is an optionally signed
//! decimal (`1`, `0.5`, `.5`, `1.`) and suffix is one of
//! - binary: `Ki Mi Gi Ti Pi Ei`
//! - decimal SI: `n u m "" k M G T P E`
//! - decimal exponent: `e<int>` / `E<int>`

use std::cmp::Ordering;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::Error;

/// Nano-units per whole unit
const NANO_EXPONENT: i32 = 9;

/// Mantissas with more digits than this are rejected rather than overflowing
const MAX_MANTISSA_DIGITS: usize = 30;

/// A parsed quantity, stored as an exact number of nano-units
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedQuantity {
    nanos: i128,
}

impl ParsedQuantity {
    /// Parse a quantity string
    pub fn parse(value: &str) -> Result<Self, Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_quantity(value, "empty quantity"));
        }

        let (negative, unsigned) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let number_len = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(Error::invalid_quantity(value, "missing numeric part"));
        }
        if frac_part.contains('.') {
            return Err(Error::invalid_quantity(value, "more than one decimal point"));
        }

        let digits = format!("{}{}", int_part, frac_part);
        let digits = digits.trim_start_matches('0');
        if digits.len() > MAX_MANTISSA_DIGITS {
            return Err(Error::invalid_quantity(value, "too many digits"));
        }
        let mantissa: i128 = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|e| Error::invalid_quantity(value, format!("{}", e)))?
        };

        let (binary_shift, decimal_exponent) = parse_suffix(suffix)
            .ok_or_else(|| Error::invalid_quantity(value, format!("unknown suffix '{}'", suffix)))?;

        let exponent = decimal_exponent + NANO_EXPONENT - frac_part.len() as i32;
        let overflow = || Error::invalid_quantity(value, "quantity out of range");

        let mut nanos = mantissa
            .checked_mul(1i128 << binary_shift)
            .ok_or_else(overflow)?;
        if exponent >= 0 {
            let scale = 10i128.checked_pow(exponent as u32).ok_or_else(overflow)?;
            nanos = nanos.checked_mul(scale).ok_or_else(overflow)?;
        } else {
            // Anything below one nano-unit rounds up, like the API server does
            let scale = 10i128
                .checked_pow(exponent.unsigned_abs())
                .ok_or_else(overflow)?;
            nanos = nanos.checked_add(scale - 1).ok_or_else(overflow)? / scale;
        }

        Ok(Self {
            nanos: if negative { -nanos } else { nanos },
        })
    }

    /// The amount in nano-units
    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }
}

impl std::str::FromStr for ParsedQuantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&Quantity> for ParsedQuantity {
    type Error = Error;

    fn try_from(q: &Quantity) -> Result<Self, Self::Error> {
        Self::parse(&q.0)
    }
}

/// Returns `(binary shift, decimal exponent)` for a suffix
fn parse_suffix(suffix: &str) -> Option<(u32, i32)> {
    let parsed = match suffix {
        "" => (0, 0),
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        _ => {
            let exp = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            (0, exp.parse::<i32>().ok().filter(|e| e.abs() <= 30)?)
        }
    };
    Some(parsed)
}

/// Compare two quantities by value.
///
/// Returns `None` when either side does not parse.
pub fn compare(a: &Quantity, b: &Quantity) -> Option<Ordering> {
    let a = ParsedQuantity::try_from(a).ok()?;
    let b = ParsedQuantity::try_from(b).ok()?;
    Some(a.cmp(&b))
}

/// Whether two quantities denote the same amount.
///
/// Unparsable quantities are only equal when their strings are identical.
pub fn quantities_equal(a: &Quantity, b: &Quantity) -> bool {
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a.0 == b.0,
    }
}
