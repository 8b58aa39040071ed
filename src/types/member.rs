//! Ordered member values.
//!
//! One tagged union replaces a collection specialisation per primitive
//! type. Ordering is by tag first (`Int < Float < Text < Bytes`), then by
//! value within a tag, which gives every collection a total order.

use std::fmt;

use bytes::Bytes;
use ordered_float::OrderedFloat;

use super::format_score;

/// A member, field or element value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Member {
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Bytes(Bytes),
}

impl Member {
    /// Parses a command argument into its canonical member.
    ///
    /// An argument becomes `Int` or `Float` only when formatting the
    /// number back yields the exact same text, so `"007"` or `"1.50"`
    /// stay `Text` and every member echoes back unchanged.
    pub fn parse(arg: &str) -> Self {
        if let Ok(n) = arg.parse::<i64>() {
            if n.to_string() == arg {
                return Member::Int(n);
            }
        }
        if let Ok(f) = arg.parse::<f64>() {
            if f.is_finite() && format_score(f) == arg {
                return Member::Float(OrderedFloat(f));
            }
        }
        Member::Text(arg.to_string())
    }

    /// Numeric view used by HINCRBY.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Member::Int(n) => Some(*n),
            Member::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Numeric view used by HINCRBYFLOAT.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Member::Int(n) => Some(*n as f64),
            Member::Float(f) => Some(f.0),
            Member::Text(s) => s.parse::<f64>().ok().filter(|f| !f.is_nan()),
            Member::Bytes(_) => None,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Int(n) => write!(f, "{n}"),
            Member::Float(v) => write!(f, "{}", format_score(v.0)),
            Member::Text(s) => write!(f, "{s}"),
            Member::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<&str> for Member {
    fn from(s: &str) -> Self {
        Member::Text(s.to_string())
    }
}

impl From<String> for Member {
    fn from(s: String) -> Self {
        Member::Text(s)
    }
}

impl From<i64> for Member {
    fn from(n: i64) -> Self {
        Member::Int(n)
    }
}

impl From<f64> for Member {
    fn from(f: f64) -> Self {
        Member::Float(OrderedFloat(f))
    }
}

impl From<Bytes> for Member {
    fn from(b: Bytes) -> Self {
        Member::Bytes(b)
    }
}
