//! Keyspace commands: DEL, EXISTS, TYPE and the TTL family.

use super::args::{arity_at_least, arity_exact, parse_int};
use super::Reply;
use crate::error::{Error, Result};
use crate::storage::Store;
use crate::time;

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "DEL" => {
            arity_at_least(command, args, 1)?;
            Ok(Reply::from_count(
                args.iter().filter(|key| store.delete(key)).count(),
            ))
        }
        "EXISTS" => {
            arity_at_least(command, args, 1)?;
            Ok(Reply::from_count(
                args.iter().filter(|key| store.exists(key)).count(),
            ))
        }
        "TYPE" => {
            arity_exact(command, args, 1)?;
            let kind = store.get(&args[0]).map(|v| v.kind().as_str());
            Ok(Reply::bulk(kind.unwrap_or("none")))
        }
        "EXPIRE" => expire(store, command, args, 1000),
        "PEXPIRE" => expire(store, command, args, 1),
        "TTL" => ttl(store, command, args, 1000),
        "PTTL" => ttl(store, command, args, 1),
        "PERSIST" => {
            arity_exact(command, args, 1)?;
            Ok(Reply::from_bool(store.persist(&args[0])))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}

/// A non-positive timeout deletes the key.
fn expire(store: &Store, command: &str, args: &[String], unit_ms: i64) -> Result<Reply> {
    arity_exact(command, args, 2)?;
    let duration_ms = parse_int(&args[1])?
        .checked_mul(unit_ms)
        .ok_or(Error::NotAnInteger)?;

    let key = &args[0];
    if duration_ms <= 0 {
        return Ok(Reply::from_bool(store.delete(key)));
    }
    Ok(Reply::from_bool(store.set_expiry(key, duration_ms)))
}

/// -2 for a missing key, -1 for a key without deadline.
fn ttl(store: &Store, command: &str, args: &[String], unit_ms: u64) -> Result<Reply> {
    arity_exact(command, args, 1)?;
    let key = &args[0];
    if !store.exists(key) {
        return Ok(Reply::Integer(-2));
    }
    match store.get_expiry(key) {
        None => Ok(Reply::Integer(-1)),
        Some(deadline) => {
            let remaining = time::remaining_ms(deadline);
            Ok(Reply::Integer(((remaining + unit_ms / 2) / unit_ms) as i64))
        }
    }
}
