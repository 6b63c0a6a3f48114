//! Pfafstetter codes and the downstream comparator
//!
//! A Pfafstetter code is a string of decimal digits. Each additional digit
//! subdivides the basin named by the preceding digits, so a code's leading
//! digits are the code of its ancestor at every coarser level.
//!
//! Codes are stored as digit strings and never re-derived from an integer
//! once built, so interior (or leading) zeros survive every conversion.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated Pfafstetter code: a non-empty string of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PfafCode(String);

impl PfafCode {
    /// Create a code from its decimal string, preserving every digit.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPfafCode(code));
        }
        Ok(Self(code))
    }

    /// Create a code from the decimal form of an integer.
    pub fn from_u64(code: u64) -> Self {
        Self(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits. For HydroBASINS data this equals the basin level.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a code has at least one digit.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the digits as numbers 0..=9.
    pub fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b - b'0')
    }

    pub fn last_digit(&self) -> u8 {
        self.0.as_bytes()[self.0.len() - 1] - b'0'
    }

    /// Code of the enclosing basin one level coarser, `None` at a single digit.
    pub fn parent(&self) -> Option<PfafCode> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_string()))
    }

    /// True if `self` is a strict prefix of `other`, i.e. `other` lies
    /// inside the basin named by `self` at some finer level.
    pub fn is_ancestor_of(&self, other: &PfafCode) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// Integer value of the code, `None` if it does not fit a `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// True if `self` is strictly downstream of `upstream`.
    pub fn is_downstream_of(&self, upstream: &PfafCode) -> bool {
        is_downstream(upstream, self)
    }
}

impl fmt::Display for PfafCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for PfafCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PfafCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PfafCode {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<u64> for PfafCode {
    fn from(code: u64) -> Self {
        Self::from_u64(code)
    }
}

impl From<PfafCode> for String {
    fn from(code: PfafCode) -> Self {
        code.0
    }
}

impl AsRef<str> for PfafCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything that can name a Pfafstetter code: integers or digit strings.
pub trait ToPfafCode {
    fn to_pfaf_code(&self) -> Result<PfafCode>;
}

impl ToPfafCode for PfafCode {
    fn to_pfaf_code(&self) -> Result<PfafCode> {
        Ok(self.clone())
    }
}

impl ToPfafCode for str {
    fn to_pfaf_code(&self) -> Result<PfafCode> {
        PfafCode::new(self)
    }
}

impl ToPfafCode for &str {
    fn to_pfaf_code(&self) -> Result<PfafCode> {
        PfafCode::new(*self)
    }
}

impl ToPfafCode for String {
    fn to_pfaf_code(&self) -> Result<PfafCode> {
        PfafCode::new(self.as_str())
    }
}

macro_rules! impl_to_pfaf_unsigned {
    ($($t:ty),*) => {
        $(impl ToPfafCode for $t {
            fn to_pfaf_code(&self) -> Result<PfafCode> {
                Ok(PfafCode::from_u64(*self as u64))
            }
        })*
    };
}

macro_rules! impl_to_pfaf_signed {
    ($($t:ty),*) => {
        $(impl ToPfafCode for $t {
            fn to_pfaf_code(&self) -> Result<PfafCode> {
                u64::try_from(*self)
                    .map(PfafCode::from_u64)
                    .map_err(|_| Error::InvalidPfafCode(self.to_string()))
            }
        })*
    };
}

impl_to_pfaf_unsigned!(u8, u16, u32, u64, usize);
impl_to_pfaf_signed!(i32, i64);

/// Even digits other than zero name interbasins (tributary segments);
/// crossing one after the divergence point leaves the main stem.
fn is_tributary_digit(d: u8) -> bool {
    d != b'0' && (d - b'0') % 2 == 0
}

/// Decide, from the codes alone, whether `b` is strictly downstream of `a`.
///
/// After the longest common prefix, the overlapping digits of `b` must be
/// numerically smaller than those of `a`, and no digit of `b` past the
/// divergence point may be a nonzero even digit. Codes of different
/// lengths (different levels) compare over the overlapping digits; when one
/// code is a prefix of the other the basins nest rather than flow, and the
/// result is `false`.
pub fn is_downstream(a: &PfafCode, b: &PfafCode) -> bool {
    if a == b {
        return false;
    }
    let (a, b) = (a.0.as_bytes(), b.0.as_bytes());
    let min_len = a.len().min(b.len());
    let n = a.iter().zip(b).take_while(|(x, y)| x == y).count();

    // Equal-length digit runs order numerically the same way as bytewise.
    if b[n..min_len] >= a[n..min_len] {
        return false;
    }
    !b[n..].iter().any(|&d| is_tributary_digit(d))
}

/// [`is_downstream`] over any mix of integer and string inputs.
pub fn try_is_downstream<A, B>(a: &A, b: &B) -> Result<bool>
where
    A: ToPfafCode + ?Sized,
    B: ToPfafCode + ?Sized,
{
    Ok(is_downstream(&a.to_pfaf_code()?, &b.to_pfaf_code()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(a: u64, b: u64) -> bool {
        is_downstream(&PfafCode::from(a), &PfafCode::from(b))
    }

    #[test]
    fn test_reference_cases() {
        // https://en.wikipedia.org/wiki/Pfafstetter_Coding_System#Properties
        assert!(check(8835, 8833));
        assert!(check(8835, 8811));
        assert!(!check(8835, 8832));
        assert!(!check(8835, 8821));
        assert!(!check(8835, 9135));
    }

    #[test]
    fn test_short_codes() {
        assert!(check(99, 77));
        assert!(check(89, 81));
        assert!(check(9, 7));
        assert!(!check(9, 8));
    }

    #[test]
    fn test_longer_upstream_code() {
        assert!(check(99, 7));
        assert!(!check(99, 8));
    }

    #[test]
    fn test_longer_downstream_code() {
        assert!(check(9, 77));
        assert!(!check(9, 69));
    }

    #[test]
    fn test_zero_digits() {
        assert!(check(43199, 43100));
        assert!(!check(43199, 43102));
    }

    #[test]
    fn test_self_is_not_downstream() {
        for code in [1, 9, 42, 8835, 43100] {
            assert!(!check(code, code));
        }
    }

    #[test]
    fn test_nested_codes_are_not_downstream() {
        assert!(!check(43, 431));
        assert!(!check(431, 43));
    }

    #[test]
    fn test_never_mutually_downstream() {
        let codes = [1, 2, 7, 9, 11, 19, 33, 77, 81, 89, 99, 431, 8811, 8833, 8835, 9135, 43100];
        for &a in &codes {
            for &b in &codes {
                if a != b {
                    assert!(!(check(a, b) && check(b, a)), "{} and {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_string_and_integer_inputs_agree() {
        assert!(try_is_downstream("89", &81).unwrap());
        assert!(try_is_downstream(&89, "81").unwrap());
        assert!(try_is_downstream("89", "81").unwrap());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(try_is_downstream("8a", &81).is_err());
        assert!(try_is_downstream("", &81).is_err());
        assert!(try_is_downstream(&-3, &81).is_err());
    }

    #[test]
    fn test_leading_zero_preserved() {
        let code = PfafCode::new("0431").unwrap();
        assert_eq!(code.as_str(), "0431");
        assert_eq!(code.len(), 4);
        assert_eq!(code.parent().unwrap().as_str(), "043");
    }

    #[test]
    fn test_parent_and_ancestry() {
        let code = PfafCode::from(4349u64);
        assert_eq!(code.parent(), Some(PfafCode::from(434u64)));
        assert!(PfafCode::from(43u64).is_ancestor_of(&code));
        assert!(!code.is_ancestor_of(&code));
        assert_eq!(PfafCode::from(4u64).parent(), None);
        assert_eq!(code.last_digit(), 9);
    }
}
