//! Hash commands.

use super::args::{arity_at_least, arity_exact, members, parse_float, parse_int};
use super::{lookup, modify, modify_or_create, Reply};
use crate::error::{Error, Result};
use crate::storage::{Store, Value};
use crate::types::{Hash, Member};

fn create() -> Value {
    Hash::new().into()
}

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "HSET" => {
            arity_at_least(command, args, 3)?;
            if args.len() % 2 == 0 {
                return Err(Error::Arity(command.to_ascii_lowercase()));
            }
            let added = modify_or_create(store, &args[0], Value::into_hash, create, |hash| {
                Ok(args[1..]
                    .chunks_exact(2)
                    .filter(|pair| hash.set(Member::parse(&pair[0]), Member::parse(&pair[1])))
                    .count())
            })?;
            Ok(Reply::from_count(added))
        }
        "HGET" => {
            arity_exact(command, args, 2)?;
            let value = lookup(store, &args[0], Value::into_hash)?
                .and_then(|hash| hash.get(&Member::parse(&args[1])));
            Ok(Reply::from(value))
        }
        "HDEL" => {
            arity_at_least(command, args, 2)?;
            let removed = modify(store, &args[0], Value::into_hash, |hash| {
                Ok(hash.remove(&members(&args[1..])))
            })?;
            Ok(Reply::from_count(removed.unwrap_or(0)))
        }
        "HEXISTS" => {
            arity_exact(command, args, 2)?;
            let found = lookup(store, &args[0], Value::into_hash)?
                .is_some_and(|hash| hash.contains(&Member::parse(&args[1])));
            Ok(Reply::from_bool(found))
        }
        "HLEN" => {
            arity_exact(command, args, 1)?;
            let len = lookup(store, &args[0], Value::into_hash)?.map_or(0, |hash| hash.len());
            Ok(Reply::from_count(len))
        }
        "HKEYS" | "HVALS" | "HGETALL" => {
            arity_exact(command, args, 1)?;
            let Some(hash) = lookup(store, &args[0], Value::into_hash)? else {
                return Ok(Reply::empty_array());
            };
            Ok(match command {
                "HKEYS" => Reply::members(hash.keys()),
                "HVALS" => Reply::members(hash.values()),
                _ => Reply::members(
                    hash.entries()
                        .into_iter()
                        .flat_map(|(field, value)| [field, value]),
                ),
            })
        }
        "HINCRBY" => {
            arity_exact(command, args, 3)?;
            let delta = parse_int(&args[2])?;
            let total = modify_or_create(store, &args[0], Value::into_hash, create, |hash| {
                hash.incr_by(Member::parse(&args[1]), delta)
            })?;
            Ok(Reply::Integer(total))
        }
        "HINCRBYFLOAT" => {
            arity_exact(command, args, 3)?;
            let delta = parse_float(&args[2])?;
            let total = modify_or_create(store, &args[0], Value::into_hash, create, |hash| {
                hash.incr_by_float(Member::parse(&args[1]), delta)
            })?;
            Ok(Reply::score(total))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}
