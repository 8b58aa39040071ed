//! Command evaluation
//!
//! [`Engine`] routes a command name and its arguments to the evaluator of
//! the matching family. Evaluators check arity, parse arguments, fetch or
//! create the collection through the [`Store`] and type-check it before
//! touching it.

pub mod args;
mod bloom;
mod hash;
mod keys;
mod list;
mod reply;
mod set;
mod zset;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::storage::{Store, TtlCleaner, Value};

pub use reply::Reply;

/// In-process command engine over a shared [`Store`].
#[derive(Debug, Clone)]
pub struct Engine {
    store: Store,
    metrics: Arc<Metrics>,
    config: Config,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            store: Store::with_config(&config),
            metrics: Arc::new(Metrics::new()),
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Execute one command. The name is matched case-insensitively.
    pub fn execute(&self, name: &str, args: &[String]) -> Result<Reply> {
        let start = Instant::now();
        let command = name.to_ascii_uppercase();
        let result = self.dispatch(&command, args);
        self.metrics.record(&command, start.elapsed(), result.is_err());

        match &result {
            Ok(_) => debug!(command = %command, args = args.len(), "Command executed"),
            Err(e) => debug!(command = %command, error = %e, "Command failed"),
        }
        result
    }

    fn dispatch(&self, command: &str, args: &[String]) -> Result<Reply> {
        let store = &self.store;
        match command {
            "DEL" | "EXISTS" | "TYPE" | "EXPIRE" | "PEXPIRE" | "TTL" | "PTTL" | "PERSIST" => {
                keys::evaluate(store, command, args)
            }
            c if c.starts_with("BF.") => bloom::evaluate(store, command, args),
            c if c.starts_with('Z') => zset::evaluate(store, command, args),
            c if c.starts_with('H') => hash::evaluate(store, command, args),
            c if c.starts_with('L') || c.starts_with('R') => list::evaluate(store, command, args),
            c if c.starts_with('S') => set::evaluate(store, command, args),
            _ => Err(Error::UnknownCommand(command.to_string())),
        }
    }

    /// Spawn the background expiry sweep on the current tokio runtime.
    /// Returns `None` when the configured interval is zero.
    pub fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        match self.config.ttl_cleaner_interval {
            0 => None,
            secs => Some(TtlCleaner::spawn(
                self.store.clone(),
                Duration::from_secs(secs),
            )),
        }
    }
}

/// Existing collection under `key`, type-checked by `cast`. For reads only:
/// writes go through [`modify`] or [`modify_or_create`].
fn lookup<T>(
    store: &Store,
    key: &str,
    cast: fn(Value) -> Result<Arc<T>>,
) -> Result<Option<Arc<T>>> {
    store.get(key).map(cast).transpose()
}

/// Mutate the existing collection under `key` with the key locked.
/// `Ok(None)` when the key is absent.
fn modify<T, R>(
    store: &Store,
    key: &str,
    cast: fn(Value) -> Result<Arc<T>>,
    apply: impl FnOnce(&T) -> Result<R>,
) -> Result<Option<R>> {
    store
        .update(key, |value| apply(&*cast(value.clone())?))
        .transpose()
}

/// Mutate the collection under `key` with the key locked, creating it
/// empty on first write.
fn modify_or_create<T, R>(
    store: &Store,
    key: &str,
    cast: fn(Value) -> Result<Arc<T>>,
    create: impl FnOnce() -> Value,
    apply: impl FnOnce(&T) -> Result<R>,
) -> Result<R> {
    store.update_or_insert(key, create, |value| apply(&*cast(value.clone())?))
}
