//! KEEL Interactive Shell
//!
//! Runs an in-process engine and evaluates commands typed on stdin.

use std::io::{self, BufRead, Write};

use clap::Parser;
use keel::{Config, Engine, EvictionPolicy};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// KEEL - in-memory typed key-value engine shell
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TTL cleaner interval in seconds (0 = lazy expiry only)
    #[arg(long, default_value_t = 10)]
    ttl_interval: u64,

    /// Number of store shards (0 = auto-detect based on CPU cores)
    #[arg(long, default_value_t = 0)]
    shards: usize,

    /// Maximum number of keys (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_keys: usize,

    /// Eviction policy once max keys is reached: none, lru or random
    #[arg(long, default_value = "none")]
    eviction: EvictionPolicy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keel=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::default()
        .with_ttl_interval(args.ttl_interval)
        .with_shard_amount(args.shards)
        .with_max_keys(args.max_keys)
        .with_eviction_policy(args.eviction);

    info!(
        shards = config.effective_shards(),
        max_keys = config.max_keys,
        eviction = ?config.eviction_policy,
        "Starting KEEL shell"
    );

    let engine = Engine::new(config);
    let sweeper = engine.start_sweeper();

    println!("Type 'help' for available commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("keel> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }
        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }
        if input.eq_ignore_ascii_case("info") {
            println!("keys: {}", engine.store().len());
            println!("{}", engine.metrics().summary());
            continue;
        }

        let parts = match split_args(input) {
            Ok(parts) => parts,
            Err(e) => {
                eprintln!("(error) {}", e);
                continue;
            }
        };
        let Some((name, rest)) = parts.split_first() else {
            continue;
        };
        match engine.execute(name, rest) {
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("(error) {}", e),
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }
    Ok(())
}

/// Splits a command line on whitespace; double quotes group words.
fn split_args(input: &str) -> anyhow::Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    parts.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if in_quotes {
        anyhow::bail!("unbalanced quotes");
    }
    if pending {
        parts.push(current);
    }
    Ok(parts)
}

fn print_help() {
    println!(
        r#"
Keys:        DEL EXISTS TYPE EXPIRE PEXPIRE TTL PTTL PERSIST
Sorted sets: ZADD ZREM ZSCORE ZRANK ZREVRANK ZRANGE ZREVRANGE ZCARD ZCOUNT
             ZRANGEBYSCORE ZREVRANGEBYSCORE ZINCRBY
Hashes:      HSET HGET HDEL HEXISTS HLEN HKEYS HVALS HGETALL HINCRBY HINCRBYFLOAT
Lists:       LPUSH RPUSH LPOP RPOP LRANGE LLEN LINDEX LSET LTRIM LREM
Sets:        SADD SREM SISMEMBER SMEMBERS SCARD
Bloom:       BF.INIT BF.ADD BF.EXISTS BF.INFO

  info              - Show key count and command metrics
  help              - Show this help
  quit / exit       - Exit the shell

Examples:
  ZADD board 10 alice 20 bob
  ZRANGEBYSCORE board (10 +inf WITHSCORES
  EXPIRE board 60
  HSET user:1 name "Ada Lovelace"
"#
    );
}
