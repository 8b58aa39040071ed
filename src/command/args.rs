//! Argument parsing shared by the evaluators.

use crate::error::{Error, Result};
use crate::types::{Member, ScoreRange};

/// At least `min` arguments.
pub fn arity_at_least(command: &str, args: &[String], min: usize) -> Result<()> {
    if args.len() < min {
        return Err(Error::Arity(command.to_ascii_lowercase()));
    }
    Ok(())
}

/// Exactly `n` arguments.
pub fn arity_exact(command: &str, args: &[String], n: usize) -> Result<()> {
    if args.len() != n {
        return Err(Error::Arity(command.to_ascii_lowercase()));
    }
    Ok(())
}

pub fn parse_int(arg: &str) -> Result<i64> {
    arg.parse().map_err(|_| Error::NotAnInteger)
}

/// Float argument; accepts `inf`, `+inf` and `-inf`, rejects NaN.
pub fn parse_float(arg: &str) -> Result<f64> {
    match arg.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(Error::NotAFloat),
    }
}

/// One end of a score interval: `(` marks it exclusive.
pub fn parse_bound(arg: &str) -> Result<(f64, bool)> {
    let (text, inclusive) = match arg.strip_prefix('(') {
        Some(rest) => (rest, false),
        None => (arg, true),
    };
    match text.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok((value, inclusive)),
        _ => Err(Error::InvalidBound),
    }
}

pub fn parse_score_range(min: &str, max: &str) -> Result<ScoreRange> {
    let (min, min_inclusive) = parse_bound(min)?;
    let (max, max_inclusive) = parse_bound(max)?;
    Ok(ScoreRange {
        min,
        max,
        min_inclusive,
        max_inclusive,
    })
}

pub fn members(args: &[String]) -> Vec<Member> {
    args.iter().map(|arg| Member::parse(arg)).collect()
}

/// Case-insensitive keyword match.
pub fn is_keyword(arg: &str, keyword: &str) -> bool {
    arg.eq_ignore_ascii_case(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_support_exclusive_and_infinity() {
        assert_eq!(parse_bound("1.5").unwrap(), (1.5, true));
        assert_eq!(parse_bound("(2").unwrap(), (2.0, false));
        assert_eq!(parse_bound("-inf").unwrap(), (f64::NEG_INFINITY, true));
        assert_eq!(parse_bound("+inf").unwrap(), (f64::INFINITY, true));
        assert_eq!(parse_bound("(inf").unwrap(), (f64::INFINITY, false));
        assert_eq!(parse_bound("abc"), Err(Error::InvalidBound));
        assert_eq!(parse_bound("nan"), Err(Error::InvalidBound));
    }

    #[test]
    fn floats_reject_nan() {
        assert_eq!(parse_float("3"), Ok(3.0));
        assert_eq!(parse_float("-inf"), Ok(f64::NEG_INFINITY));
        assert_eq!(parse_float("NaN"), Err(Error::NotAFloat));
        assert_eq!(parse_float("x1"), Err(Error::NotAFloat));
    }

    #[test]
    fn arity_reports_lowercase_command() {
        let args = vec!["k".to_string()];
        assert_eq!(
            arity_at_least("ZADD", &args, 3),
            Err(Error::Arity("zadd".into()))
        );
        assert!(arity_exact("ZCARD", &args, 1).is_ok());
    }

    #[test]
    fn ints_reject_garbage() {
        assert_eq!(parse_int("-12"), Ok(-12));
        assert_eq!(parse_int("1.0"), Err(Error::NotAnInteger));
        assert_eq!(parse_int("99999999999999999999"), Err(Error::NotAnInteger));
    }
}
