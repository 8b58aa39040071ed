//! List commands.
//!
//! A list emptied by LPOP, RPOP, LTRIM or LREM is removed from the
//! keyspace.

use super::args::{arity_at_least, arity_exact, members, parse_int};
use super::{lookup, modify, modify_or_create, Reply};
use crate::error::{Error, Result};
use crate::storage::{Store, Value};
use crate::types::{List, Member};

fn create() -> Value {
    List::new().into()
}

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "LPUSH" | "RPUSH" => {
            arity_at_least(command, args, 2)?;
            let values = members(&args[1..]);
            let len = modify_or_create(store, &args[0], Value::into_list, create, |list| {
                Ok(if command == "LPUSH" {
                    list.push_front(values)
                } else {
                    list.push_back(values)
                })
            })?;
            Ok(Reply::from_count(len))
        }
        "LPOP" | "RPOP" => {
            arity_exact(command, args, 1)?;
            let popped = modify(store, &args[0], Value::into_list, |list| {
                Ok(if command == "LPOP" {
                    list.pop_front()
                } else {
                    list.pop_back()
                })
            })?;
            Ok(Reply::from(popped.flatten()))
        }
        "LRANGE" => {
            arity_exact(command, args, 3)?;
            let start = parse_int(&args[1])?;
            let stop = parse_int(&args[2])?;
            Ok(match lookup(store, &args[0], Value::into_list)? {
                Some(list) => Reply::members(list.range(start, stop)),
                None => Reply::empty_array(),
            })
        }
        "LLEN" => {
            arity_exact(command, args, 1)?;
            let len = lookup(store, &args[0], Value::into_list)?.map_or(0, |list| list.len());
            Ok(Reply::from_count(len))
        }
        "LINDEX" => {
            arity_exact(command, args, 2)?;
            let index = parse_int(&args[1])?;
            let item = lookup(store, &args[0], Value::into_list)?.and_then(|list| list.index(index));
            Ok(Reply::from(item))
        }
        "LSET" => {
            arity_exact(command, args, 3)?;
            let index = parse_int(&args[1])?;
            modify(store, &args[0], Value::into_list, |list| {
                list.set(index, Member::parse(&args[2]))
            })?
            .ok_or(Error::NoSuchKey)?;
            Ok(Reply::Ok)
        }
        "LTRIM" => {
            arity_exact(command, args, 3)?;
            let start = parse_int(&args[1])?;
            let stop = parse_int(&args[2])?;
            modify(store, &args[0], Value::into_list, |list| {
                list.trim(start, stop);
                Ok(())
            })?;
            Ok(Reply::Ok)
        }
        "LREM" => {
            arity_exact(command, args, 3)?;
            let count = parse_int(&args[1])?;
            let removed = modify(store, &args[0], Value::into_list, |list| {
                Ok(list.remove(count, &Member::parse(&args[2])))
            })?;
            Ok(Reply::from_count(removed.unwrap_or(0)))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}
