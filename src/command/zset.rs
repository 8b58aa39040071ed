//! Sorted set commands.

use super::args::{
    arity_at_least, arity_exact, is_keyword, members, parse_float, parse_int, parse_score_range,
};
use super::{lookup, modify, modify_or_create, Reply};
use crate::error::{Error, Result};
use crate::storage::{Store, Value};
use crate::types::{Limit, Member, SortedSet, ZAddFlags};

fn create() -> Value {
    SortedSet::new().into()
}

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "ZADD" => zadd(store, command, args),
        "ZREM" => {
            arity_at_least(command, args, 2)?;
            let removed = modify(store, &args[0], Value::into_sorted_set, |zset| {
                Ok(zset.remove(&members(&args[1..])))
            })?;
            Ok(Reply::from_count(removed.unwrap_or(0)))
        }
        "ZSCORE" => {
            arity_exact(command, args, 2)?;
            let score = lookup(store, &args[0], Value::into_sorted_set)?
                .and_then(|zset| zset.score(&Member::parse(&args[1])));
            Ok(score.map_or(Reply::Nil, Reply::score))
        }
        "ZRANK" | "ZREVRANK" => {
            arity_exact(command, args, 2)?;
            let member = Member::parse(&args[1]);
            let rank = lookup(store, &args[0], Value::into_sorted_set)?.and_then(|zset| {
                if command == "ZRANK" {
                    zset.rank(&member)
                } else {
                    zset.rev_rank(&member)
                }
            });
            Ok(rank.map_or(Reply::Nil, Reply::from_count))
        }
        "ZCARD" => {
            arity_exact(command, args, 1)?;
            let len = lookup(store, &args[0], Value::into_sorted_set)?
                .map_or(0, |zset| zset.len());
            Ok(Reply::from_count(len))
        }
        "ZRANGE" | "ZREVRANGE" => {
            arity_at_least(command, args, 3)?;
            let start = parse_int(&args[1])?;
            let stop = parse_int(&args[2])?;
            let with_scores = match &args[3..] {
                [] => false,
                [flag] if is_keyword(flag, "WITHSCORES") => true,
                _ => return Err(Error::Syntax),
            };
            let Some(zset) = lookup(store, &args[0], Value::into_sorted_set)? else {
                return Ok(Reply::empty_array());
            };
            Ok(Reply::elements(if command == "ZRANGE" {
                zset.range_by_index(start, stop, with_scores)
            } else {
                zset.rev_range_by_index(start, stop, with_scores)
            }))
        }
        "ZCOUNT" => {
            arity_exact(command, args, 3)?;
            let range = parse_score_range(&args[1], &args[2])?;
            let count = lookup(store, &args[0], Value::into_sorted_set)?
                .map_or(0, |zset| zset.count(&range));
            Ok(Reply::from_count(count))
        }
        "ZRANGEBYSCORE" | "ZREVRANGEBYSCORE" => range_by_score(store, command, args),
        "ZINCRBY" => {
            arity_exact(command, args, 3)?;
            let delta = parse_float(&args[1])?;
            let score = modify_or_create(store, &args[0], Value::into_sorted_set, create, |zset| {
                zset.incr_by(Member::parse(&args[2]), delta)
            })?;
            Ok(Reply::score(score))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}

/// `ZADD key [NX|XX] [GT|LT] [CH] [INCR] score member [score member ...]`
fn zadd(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    arity_at_least(command, args, 3)?;
    let key = &args[0];

    let mut flags = ZAddFlags::default();
    let (mut ch, mut incr) = (false, false);
    let mut i = 1;
    while i < args.len() {
        match args[i].to_ascii_uppercase().as_str() {
            "NX" => flags.nx = true,
            "XX" => flags.xx = true,
            "GT" => flags.gt = true,
            "LT" => flags.lt = true,
            "CH" => ch = true,
            "INCR" => incr = true,
            _ => break,
        }
        i += 1;
    }

    let pairs = &args[i..];
    if pairs.is_empty() || pairs.len() % 2 != 0 || (flags.nx && flags.xx) {
        return Err(Error::Syntax);
    }
    if (flags.gt && flags.lt) || (flags.nx && (flags.gt || flags.lt)) {
        return Err(Error::IncompatibleFlags);
    }
    if incr && pairs.len() != 2 {
        return Err(Error::IncrSinglePair);
    }
    let pairs = pairs
        .chunks_exact(2)
        .map(|pair| Ok((Member::parse(&pair[1]), parse_float(&pair[0])?)))
        .collect::<Result<Vec<_>>>()?;

    let apply = |zset: &SortedSet| -> Result<Reply> {
        if incr {
            let (member, delta) = pairs.into_iter().next().ok_or(Error::Syntax)?;
            let score = zset.incr_with_flags(member, delta, &flags)?;
            Ok(score.map_or(Reply::Nil, Reply::score))
        } else {
            let changed = pairs
                .into_iter()
                .map(|(member, score)| zset.add_with_flags(member, score, &flags))
                .filter(|result| result.added || (ch && result.updated))
                .count();
            Ok(Reply::from_count(changed))
        }
    };

    // XX never creates the key
    if flags.xx {
        let reply = modify(store, key, Value::into_sorted_set, apply)?;
        Ok(reply.unwrap_or(if incr { Reply::Nil } else { Reply::Integer(0) }))
    } else {
        modify_or_create(store, key, Value::into_sorted_set, create, apply)
    }
}

/// `Z[REV]RANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]`.
/// The reverse form takes `max` before `min`.
fn range_by_score(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    arity_at_least(command, args, 3)?;
    let reverse = command == "ZREVRANGEBYSCORE";
    let range = if reverse {
        parse_score_range(&args[2], &args[1])?
    } else {
        parse_score_range(&args[1], &args[2])?
    };

    let mut with_scores = false;
    let mut limit = None;
    let mut i = 3;
    while i < args.len() {
        if is_keyword(&args[i], "WITHSCORES") {
            with_scores = true;
            i += 1;
        } else if is_keyword(&args[i], "LIMIT") && i + 2 < args.len() {
            limit = Some((parse_int(&args[i + 1])?, parse_int(&args[i + 2])?));
            i += 3;
        } else {
            return Err(Error::Syntax);
        }
    }

    let limit = match limit {
        Some((offset, _)) if offset < 0 => return Ok(Reply::empty_array()),
        Some((offset, count)) => Some(Limit {
            offset: offset as usize,
            count: usize::try_from(count).ok(),
        }),
        None => None,
    };

    let Some(zset) = lookup(store, &args[0], Value::into_sorted_set)? else {
        return Ok(Reply::empty_array());
    };
    Ok(Reply::elements(if reverse {
        zset.rev_range_by_score(&range, with_scores, limit)
    } else {
        zset.range_by_score(&range, with_scores, limit)
    }))
}
