//! Bloom filter commands.
//!
//! `BF.ADD` creates a filter with default options on first use;
//! `BF.EXISTS` and `BF.INFO` require one to exist already.

use std::sync::Arc;

use super::args::{arity_exact, parse_float, parse_int};
use super::{lookup, modify_or_create, Reply};
use crate::error::{Error, Result};
use crate::storage::{Store, Value};
use crate::types::{BloomFilter, BloomOpts};

fn create() -> Value {
    BloomFilter::new(BloomOpts::default()).into()
}

pub fn evaluate(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    match command {
        "BF.INIT" => init(store, command, args),
        "BF.ADD" => {
            arity_exact(command, args, 2)?;
            let fresh = modify_or_create(store, &args[0], Value::into_bloom, create, |bloom| {
                Ok(bloom.add(&args[1]))
            })?;
            Ok(Reply::from_bool(fresh))
        }
        "BF.EXISTS" => {
            arity_exact(command, args, 2)?;
            Ok(Reply::from_bool(existing(store, &args[0])?.exists(&args[1])))
        }
        "BF.INFO" => {
            arity_exact(command, args, 1)?;
            Ok(Reply::Bulk(existing(store, &args[0])?.info(&args[0])))
        }
        _ => Err(Error::UnknownCommand(command.to_string())),
    }
}

/// `BF.INIT key [error_rate capacity]`. An existing filter is kept as is.
fn init(store: &Store, command: &str, args: &[String]) -> Result<Reply> {
    let opts = match args.len() {
        1 => BloomOpts::default(),
        3 => {
            let error_rate = parse_float(&args[1]).map_err(|_| Error::InvalidErrorRate)?;
            let capacity = parse_int(&args[2]).map_err(|_| Error::InvalidCapacity)?;
            let capacity = u64::try_from(capacity).map_err(|_| Error::InvalidCapacity)?;
            BloomOpts::new(error_rate, capacity)?
        }
        _ => return Err(Error::Arity(command.to_ascii_lowercase())),
    };

    modify_or_create(
        store,
        &args[0],
        Value::into_bloom,
        || BloomFilter::new(opts).into(),
        |_| Ok(()),
    )?;
    Ok(Reply::Ok)
}

fn existing(store: &Store, key: &str) -> Result<Arc<BloomFilter>> {
    lookup(store, key, Value::into_bloom)?.ok_or(Error::NoBloomFilter)
}
