//! Set commands.

use super::args::{arity_at_least, arity_exact, members};
use super::{lookup, modify, modify_or_create, Reply};
use crate::error::{Error, Result};
use crate::storage::{Store, Value};
use crate::types::{Member, Set};

fn create() -> Value {
    Set::new().into()
}

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "SADD" => {
            arity_at_least(command, args, 2)?;
            let added = modify_or_create(store, &args[0], Value::into_set, create, |set| {
                Ok(set.add(members(&args[1..])))
            })?;
            Ok(Reply::from_count(added))
        }
        "SREM" => {
            arity_at_least(command, args, 2)?;
            let removed = modify(store, &args[0], Value::into_set, |set| {
                Ok(set.remove(&members(&args[1..])))
            })?;
            Ok(Reply::from_count(removed.unwrap_or(0)))
        }
        "SISMEMBER" => {
            arity_exact(command, args, 2)?;
            let found = lookup(store, &args[0], Value::into_set)?
                .is_some_and(|set| set.contains(&Member::parse(&args[1])));
            Ok(Reply::from_bool(found))
        }
        "SMEMBERS" => {
            arity_exact(command, args, 1)?;
            Ok(match lookup(store, &args[0], Value::into_set)? {
                Some(set) => Reply::members(set.members()),
                None => Reply::empty_array(),
            })
        }
        "SCARD" => {
            arity_exact(command, args, 1)?;
            let len = lookup(store, &args[0], Value::into_set)?.map_or(0, |set| set.len());
            Ok(Reply::from_count(len))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}
