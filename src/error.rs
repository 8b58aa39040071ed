//! Error types for the engine and its command evaluators.

use thiserror::Error;

/// Errors surfaced to callers of the command layer.
///
/// Absence of a key or member is never an error; read operations report
/// it through `Option`/empty replies instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Wrong number of arguments for a command.
    #[error("ERR wrong number of arguments for '{0}' command")]
    Arity(String),

    /// The key holds a collection of a different kind.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    /// A score range bound could not be parsed.
    #[error("ERR min or max is not a float")]
    InvalidBound,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR resulting score is not a number (NaN)")]
    ScoreIsNan,

    #[error("ERR index out of range")]
    IndexOutOfRange,

    #[error("ERR no such key")]
    NoSuchKey,

    #[error("ERR INCR option supports a single increment-element pair")]
    IncrSinglePair,

    #[error("ERR GT, LT, and/or NX options at the same time are not compatible")]
    IncompatibleFlags,

    #[error("ERR only positive float values below 1 can be provided for error rate")]
    InvalidErrorRate,

    #[error("ERR only positive integer values can be provided for capacity")]
    InvalidCapacity,

    #[error("ERR invalid key: no bloom filter found")]
    NoBloomFilter,

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_wire_format() {
        assert_eq!(
            Error::Arity("zadd".into()).to_string(),
            "ERR wrong number of arguments for 'zadd' command"
        );
        assert!(Error::WrongType.to_string().starts_with("WRONGTYPE"));
        assert_eq!(
            Error::UnknownCommand("FOO".into()).to_string(),
            "ERR unknown command 'FOO'"
        );
    }
}
