//! Command replies
//!
//! Reply variants for command execution results.

use std::fmt;

use crate::types::{format_score, Element, Member};

/// Response to a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Simple OK response
    Ok,

    /// Nil/null response (key or member not found)
    Nil,

    /// Integer value
    Integer(i64),

    /// String value
    Bulk(String),

    /// Array response
    Array(Vec<Reply>),
}

impl Reply {
    pub fn bulk(value: impl ToString) -> Self {
        Reply::Bulk(value.to_string())
    }

    /// Boolean as `(integer) 1` / `(integer) 0`
    pub fn from_bool(value: bool) -> Self {
        Reply::Integer(value as i64)
    }

    pub fn from_count(count: usize) -> Self {
        Reply::Integer(count as i64)
    }

    pub fn score(score: f64) -> Self {
        Reply::Bulk(format_score(score))
    }

    pub fn empty_array() -> Self {
        Reply::Array(Vec::new())
    }

    pub fn members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Member>,
    {
        Reply::Array(members.into_iter().map(Reply::from).collect())
    }

    pub fn elements(elements: Vec<Element<Member>>) -> Self {
        Reply::Array(
            elements
                .into_iter()
                .map(|element| match element {
                    Element::Member(member) => Reply::from(member),
                    Element::Score(score) => Reply::score(score),
                })
                .collect(),
        )
    }
}

impl From<Member> for Reply {
    fn from(member: Member) -> Self {
        Reply::Bulk(member.to_string())
    }
}

impl From<Option<Member>> for Reply {
    fn from(member: Option<Member>) -> Self {
        member.map_or(Reply::Nil, Reply::from)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "\"{}\"", s),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}
