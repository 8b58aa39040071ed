//! End-to-end command tests against an in-process engine.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keel::{Config, Engine, Error, Reply, Result, Value};

fn run(engine: &Engine, line: &str) -> Result<Reply> {
    let parts: Vec<String> = line.split_whitespace().map(String::from).collect();
    engine.execute(&parts[0], &parts[1..])
}

fn ok(engine: &Engine, line: &str) -> Reply {
    run(engine, line).unwrap_or_else(|e| panic!("{line}: {e}"))
}

fn bulks(items: &[&str]) -> Reply {
    Reply::Array(items.iter().map(Reply::bulk).collect())
}

#[test]
fn sorted_set_scenarios() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "ZADD s 1 a 2 b 3 c"), Reply::Integer(3));
    assert_eq!(ok(&engine, "ZRANGE s 0 -1"), bulks(&["a", "b", "c"]));

    assert_eq!(ok(&engine, "ZADD s 5 a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZRANGE s 0 -1"), bulks(&["b", "c", "a"]));

    let engine = Engine::default();
    ok(&engine, "ZADD s 1 a 2 b 3 c");
    assert_eq!(ok(&engine, "ZRANGEBYSCORE s 2 +inf"), bulks(&["b", "c"]));
}

#[test]
fn sorted_set_queries() {
    let engine = Engine::default();
    ok(&engine, "ZADD board 10 alice 20 bob 30 carol");

    assert_eq!(
        ok(&engine, "ZRANGE board 0 -1 WITHSCORES"),
        bulks(&["alice", "10", "bob", "20", "carol", "30"])
    );
    assert_eq!(ok(&engine, "ZREVRANGE board 0 0"), bulks(&["carol"]));
    assert_eq!(ok(&engine, "ZRANGEBYSCORE board (10 +inf"), bulks(&["bob", "carol"]));
    assert_eq!(
        ok(&engine, "ZRANGEBYSCORE board -inf +inf LIMIT 1 1"),
        bulks(&["bob"])
    );
    assert_eq!(
        ok(&engine, "ZRANGEBYSCORE board -inf +inf LIMIT 1 -1"),
        bulks(&["bob", "carol"])
    );
    assert_eq!(
        ok(&engine, "ZRANGEBYSCORE board -inf +inf LIMIT -1 5"),
        Reply::empty_array()
    );
    assert_eq!(
        ok(&engine, "ZREVRANGEBYSCORE board +inf -inf WITHSCORES LIMIT 0 2"),
        bulks(&["carol", "30", "bob", "20"])
    );
    assert_eq!(ok(&engine, "ZCOUNT board 10 (30"), Reply::Integer(2));
    assert_eq!(ok(&engine, "ZCOUNT board (30 +inf"), Reply::Integer(0));

    assert_eq!(ok(&engine, "ZRANK board alice"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZREVRANK board alice"), Reply::Integer(2));
    assert_eq!(ok(&engine, "ZRANK board nobody"), Reply::Nil);
    assert_eq!(ok(&engine, "ZSCORE board bob"), Reply::bulk("20"));
    assert_eq!(ok(&engine, "ZSCORE board nobody"), Reply::Nil);
    assert_eq!(ok(&engine, "ZCARD board"), Reply::Integer(3));

    assert_eq!(ok(&engine, "ZINCRBY board 5 alice"), Reply::bulk("15"));
    assert_eq!(ok(&engine, "ZINCRBY board 2.5 dave"), Reply::bulk("2.5"));
    assert_eq!(ok(&engine, "ZRANGE board 0 0"), bulks(&["dave"]));
}

#[test]
fn sorted_set_missing_key_reads_are_empty() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "ZRANGE none 0 -1"), Reply::empty_array());
    assert_eq!(ok(&engine, "ZRANGEBYSCORE none -inf +inf"), Reply::empty_array());
    assert_eq!(ok(&engine, "ZCARD none"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZCOUNT none -inf +inf"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZSCORE none a"), Reply::Nil);
    assert_eq!(ok(&engine, "ZREM none a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "EXISTS none"), Reply::Integer(0));
}

#[test]
fn signed_zero_scores_tie_on_member() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "ZADD k -0 b 0 a"), Reply::Integer(2));
    assert_eq!(ok(&engine, "ZRANGE k 0 -1"), bulks(&["a", "b"]));
    assert_eq!(ok(&engine, "ZSCORE k b"), Reply::bulk("0"));
    assert_eq!(ok(&engine, "ZRANK k b"), Reply::Integer(1));
    assert_eq!(ok(&engine, "ZADD k CH -0 a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZRANGEBYSCORE k 0 0"), bulks(&["a", "b"]));
}

#[test]
fn zadd_flags() {
    let engine = Engine::default();
    ok(&engine, "ZADD z 10 a 20 b");

    assert_eq!(ok(&engine, "ZADD z XX 100 c"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZSCORE z c"), Reply::Nil);

    assert_eq!(ok(&engine, "ZADD z NX 1 a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZSCORE z a"), Reply::bulk("10"));

    assert_eq!(ok(&engine, "ZADD z GT CH 5 a 40 b"), Reply::Integer(1));
    assert_eq!(ok(&engine, "ZSCORE z a"), Reply::bulk("10"));
    assert_eq!(ok(&engine, "ZSCORE z b"), Reply::bulk("40"));

    assert_eq!(ok(&engine, "ZADD z LT 1 a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "ZSCORE z a"), Reply::bulk("1"));

    assert_eq!(ok(&engine, "ZADD z INCR 5 zed"), Reply::bulk("5"));
    assert_eq!(ok(&engine, "ZADD z INCR 5 zed"), Reply::bulk("10"));
    assert_eq!(ok(&engine, "ZADD z NX INCR 5 zed"), Reply::Nil);
    assert_eq!(ok(&engine, "ZADD z xx incr 1 zed"), Reply::bulk("11"));

    assert_eq!(ok(&engine, "ZADD fresh XX 1 a"), Reply::Integer(0));
    assert_eq!(ok(&engine, "EXISTS fresh"), Reply::Integer(0));
}

#[test]
fn zadd_rejects_bad_arguments() {
    let engine = Engine::default();
    assert_eq!(run(&engine, "ZADD z"), Err(Error::Arity("zadd".into())));
    assert_eq!(run(&engine, "ZADD z 1 a 2"), Err(Error::Syntax));
    assert_eq!(run(&engine, "ZADD z NX XX 1 a"), Err(Error::Syntax));
    assert_eq!(run(&engine, "ZADD z GT LT 1 a"), Err(Error::IncompatibleFlags));
    assert_eq!(run(&engine, "ZADD z NX GT 1 a"), Err(Error::IncompatibleFlags));
    assert_eq!(run(&engine, "ZADD z INCR 1 a 2 b"), Err(Error::IncrSinglePair));
    assert_eq!(run(&engine, "ZADD z abc a"), Err(Error::NotAFloat));
    assert_eq!(run(&engine, "ZADD z nan a"), Err(Error::NotAFloat));
    assert_eq!(run(&engine, "ZRANGEBYSCORE z x 1"), Err(Error::InvalidBound));
    assert_eq!(run(&engine, "ZRANGE z 0 -1 SCORES"), Err(Error::Syntax));
    assert_eq!(run(&engine, "ZRANGEBYSCORE z 0 1 LIMIT 0"), Err(Error::Syntax));
    assert_eq!(run(&engine, "EXISTS z"), Ok(Reply::Integer(0)));
}

#[test]
fn zincrby_nan_leaves_score_unchanged() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "ZINCRBY z inf m"), Reply::bulk("inf"));
    assert_eq!(run(&engine, "ZINCRBY z -inf m"), Err(Error::ScoreIsNan));
    assert_eq!(ok(&engine, "ZSCORE z m"), Reply::bulk("inf"));
}

#[test]
fn hash_commands() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "HSET h f1 v1 f2 v2"), Reply::Integer(2));
    assert_eq!(ok(&engine, "HSET h f1 x"), Reply::Integer(0));
    assert_eq!(ok(&engine, "HGET h f1"), Reply::bulk("x"));
    assert_eq!(ok(&engine, "HGET h nope"), Reply::Nil);
    assert_eq!(ok(&engine, "HEXISTS h f2"), Reply::Integer(1));
    assert_eq!(ok(&engine, "HGETALL h"), bulks(&["f1", "x", "f2", "v2"]));

    assert_eq!(ok(&engine, "HINCRBY h n 5"), Reply::Integer(5));
    assert_eq!(ok(&engine, "HINCRBY h n -7"), Reply::Integer(-2));
    assert_eq!(run(&engine, "HINCRBY h f1 1"), Err(Error::NotAnInteger));
    assert_eq!(ok(&engine, "HINCRBYFLOAT h fl 1.5"), Reply::bulk("1.5"));
    assert_eq!(ok(&engine, "HINCRBYFLOAT h fl 1"), Reply::bulk("2.5"));

    assert_eq!(ok(&engine, "HKEYS h"), bulks(&["f1", "f2", "fl", "n"]));
    assert_eq!(ok(&engine, "HVALS h"), bulks(&["x", "v2", "2.5", "-2"]));
    assert_eq!(ok(&engine, "HLEN h"), Reply::Integer(4));

    assert_eq!(ok(&engine, "HDEL h f1 f2 fl n missing"), Reply::Integer(4));
    assert_eq!(ok(&engine, "EXISTS h"), Reply::Integer(0));
    assert_eq!(ok(&engine, "HGETALL h"), Reply::empty_array());

    assert_eq!(run(&engine, "HSET h f"), Err(Error::Arity("hset".into())));
    assert_eq!(run(&engine, "HSET h a 1 b"), Err(Error::Arity("hset".into())));
}

#[test]
fn list_commands() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "RPUSH l a b c"), Reply::Integer(3));
    assert_eq!(ok(&engine, "LPUSH l x y"), Reply::Integer(5));
    assert_eq!(ok(&engine, "LRANGE l 0 -1"), bulks(&["y", "x", "a", "b", "c"]));
    assert_eq!(ok(&engine, "LINDEX l -1"), Reply::bulk("c"));
    assert_eq!(ok(&engine, "LINDEX l 99"), Reply::Nil);
    assert_eq!(ok(&engine, "LLEN l"), Reply::Integer(5));

    assert_eq!(ok(&engine, "LSET l 0 z"), Reply::Ok);
    assert_eq!(run(&engine, "LSET l 10 q"), Err(Error::IndexOutOfRange));
    assert_eq!(run(&engine, "LSET nokey 0 q"), Err(Error::NoSuchKey));

    assert_eq!(ok(&engine, "LREM l 0 a"), Reply::Integer(1));
    assert_eq!(ok(&engine, "LTRIM l 0 1"), Reply::Ok);
    assert_eq!(ok(&engine, "LRANGE l 0 -1"), bulks(&["z", "x"]));

    assert_eq!(ok(&engine, "LPOP l"), Reply::bulk("z"));
    assert_eq!(ok(&engine, "RPOP l"), Reply::bulk("x"));
    assert_eq!(ok(&engine, "EXISTS l"), Reply::Integer(0));
    assert_eq!(ok(&engine, "LPOP l"), Reply::Nil);
    assert_eq!(ok(&engine, "LRANGE l 0 -1"), Reply::empty_array());
}

#[test]
fn ltrim_to_nothing_removes_key() {
    let engine = Engine::default();
    ok(&engine, "RPUSH l a b");
    assert_eq!(ok(&engine, "LTRIM l 5 10"), Reply::Ok);
    assert_eq!(ok(&engine, "TYPE l"), Reply::bulk("none"));
}

#[test]
fn set_commands() {
    let engine = Engine::default();
    assert_eq!(ok(&engine, "SADD s a b a"), Reply::Integer(2));
    assert_eq!(ok(&engine, "SISMEMBER s a"), Reply::Integer(1));
    assert_eq!(ok(&engine, "SISMEMBER s q"), Reply::Integer(0));
    assert_eq!(ok(&engine, "SMEMBERS s"), bulks(&["a", "b"]));
    assert_eq!(ok(&engine, "SCARD s"), Reply::Integer(2));
    assert_eq!(ok(&engine, "SREM s a b c"), Reply::Integer(2));
    assert_eq!(ok(&engine, "EXISTS s"), Reply::Integer(0));
    assert_eq!(ok(&engine, "SMEMBERS s"), Reply::empty_array());
}

#[test]
fn bloom_commands() {
    let engine = Engine::default();
    assert_eq!(run(&engine, "BF.EXISTS bf x"), Err(Error::NoBloomFilter));
    assert_eq!(run(&engine, "BF.INFO bf"), Err(Error::NoBloomFilter));

    assert_eq!(ok(&engine, "BF.INIT bf 0.01 1000"), Reply::Ok);
    assert_eq!(ok(&engine, "BF.INIT bf"), Reply::Ok);
    assert_eq!(ok(&engine, "BF.ADD bf x"), Reply::Integer(1));
    assert_eq!(ok(&engine, "BF.ADD bf x"), Reply::Integer(0));
    assert_eq!(ok(&engine, "BF.EXISTS bf x"), Reply::Integer(1));
    match ok(&engine, "BF.INFO bf") {
        Reply::Bulk(info) => assert!(info.contains("hash functions: 7"), "{info}"),
        other => panic!("unexpected reply {other:?}"),
    }
    assert_eq!(ok(&engine, "TYPE bf"), Reply::bulk("MBbloom--"));

    assert_eq!(ok(&engine, "BF.ADD auto y"), Reply::Integer(1));
    assert_eq!(ok(&engine, "BF.EXISTS auto y"), Reply::Integer(1));

    assert_eq!(run(&engine, "BF.INIT b2 2 100"), Err(Error::InvalidErrorRate));
    assert_eq!(run(&engine, "BF.INIT b2 0.1 -5"), Err(Error::InvalidCapacity));
    assert_eq!(run(&engine, "BF.INIT b2 0.1"), Err(Error::Arity("bf.init".into())));
    assert_eq!(
        run(&engine, "BF.INIT b2 0.01 9223372036854775807"),
        Err(Error::InvalidCapacity)
    );
    assert_eq!(run(&engine, "BF.INIT b2 1e-300 100000000"), Err(Error::InvalidCapacity));
    assert_eq!(ok(&engine, "EXISTS b2"), Reply::Integer(0));
}

#[test]
fn wrong_type_is_rejected() {
    let engine = Engine::default();
    ok(&engine, "ZADD z 1 a");
    ok(&engine, "SADD s a");

    assert_eq!(run(&engine, "SADD z a"), Err(Error::WrongType));
    assert_eq!(run(&engine, "ZADD s 1 a"), Err(Error::WrongType));
    assert_eq!(run(&engine, "HGET z a"), Err(Error::WrongType));
    assert_eq!(run(&engine, "LPUSH z a"), Err(Error::WrongType));
    assert_eq!(run(&engine, "BF.ADD z a"), Err(Error::WrongType));
    assert_eq!(run(&engine, "BF.INIT s"), Err(Error::WrongType));
    assert_eq!(ok(&engine, "ZCARD z"), Reply::Integer(1));
}

#[test]
fn key_commands() {
    let engine = Engine::default();
    ok(&engine, "ZADD k 1 a");
    ok(&engine, "SADD other a");

    assert_eq!(ok(&engine, "TYPE k"), Reply::bulk("zset"));
    assert_eq!(ok(&engine, "TYPE missing"), Reply::bulk("none"));
    assert_eq!(ok(&engine, "EXISTS k k missing"), Reply::Integer(2));

    assert_eq!(ok(&engine, "TTL k"), Reply::Integer(-1));
    assert_eq!(ok(&engine, "TTL missing"), Reply::Integer(-2));
    assert_eq!(ok(&engine, "EXPIRE missing 10"), Reply::Integer(0));

    assert_eq!(ok(&engine, "EXPIRE k 100"), Reply::Integer(1));
    assert_eq!(ok(&engine, "TTL k"), Reply::Integer(100));
    match ok(&engine, "PTTL k") {
        Reply::Integer(ms) => assert!((99_000..=100_000).contains(&ms), "{ms}"),
        other => panic!("unexpected reply {other:?}"),
    }

    assert_eq!(ok(&engine, "PERSIST k"), Reply::Integer(1));
    assert_eq!(ok(&engine, "PERSIST k"), Reply::Integer(0));
    assert_eq!(ok(&engine, "TTL k"), Reply::Integer(-1));

    assert_eq!(ok(&engine, "EXPIRE other 0"), Reply::Integer(1));
    assert_eq!(ok(&engine, "EXISTS other"), Reply::Integer(0));

    assert_eq!(ok(&engine, "DEL k missing"), Reply::Integer(1));
    assert_eq!(run(&engine, "EXPIRE k soon"), Err(Error::NotAnInteger));
    assert_eq!(run(&engine, "DEL"), Err(Error::Arity("del".into())));
}

#[test]
fn expired_keys_disappear() {
    let engine = Engine::default();
    ok(&engine, "ZADD k 1 a");
    assert_eq!(ok(&engine, "PEXPIRE k 50"), Reply::Integer(1));
    assert_eq!(ok(&engine, "ZCARD k"), Reply::Integer(1));

    thread::sleep(Duration::from_millis(80));
    assert_eq!(ok(&engine, "ZCARD k"), Reply::Integer(0));
    assert_eq!(ok(&engine, "TTL k"), Reply::Integer(-2));

    // a recreated key starts without the old deadline
    ok(&engine, "ZADD k 1 a");
    assert_eq!(ok(&engine, "TTL k"), Reply::Integer(-1));
}

#[test]
fn store_expiry_records() {
    let engine = Engine::default();
    let store = engine.store();

    store.put("k", Value::from(keel::SortedSet::new()), 0);
    assert_eq!(store.get_expiry("k"), None);

    let before = keel::time::now_ms();
    store.put("k", Value::from(keel::SortedSet::new()), 1000);
    let deadline = store.get_expiry("k").unwrap();
    assert!(deadline >= before + 1000 && deadline <= keel::time::now_ms() + 1000);
}

#[test]
fn concurrent_writers_share_one_collection() {
    let engine = Engine::default();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    let member = format!("m{t}-{i}");
                    let args = vec!["z".to_string(), i.to_string(), member];
                    engine.execute("ZADD", &args).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ok(&engine, "ZCARD z"), Reply::Integer(2000));
    assert_eq!(engine.metrics().total_ops(), 2001);
}

#[test]
fn pushes_survive_pops_that_empty_the_list() {
    let engine = Engine::default();
    let pushed = 500;

    for round in 0..20 {
        let key = format!("queue{round}");
        let done = Arc::new(AtomicBool::new(false));
        let popped = Arc::new(AtomicUsize::new(0));

        let poppers: Vec<_> = (0..7)
            .map(|_| {
                let engine = engine.clone();
                let done = Arc::clone(&done);
                let popped = Arc::clone(&popped);
                let args = vec![key.clone()];
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        if let Ok(Reply::Bulk(_)) = engine.execute("LPOP", &args) {
                            popped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for i in 0..pushed {
            engine
                .execute("RPUSH", &[key.clone(), i.to_string()])
                .unwrap();
        }
        done.store(true, Ordering::Release);
        for handle in poppers {
            handle.join().unwrap();
        }

        let left = match ok(&engine, &format!("LLEN {key}")) {
            Reply::Integer(n) => n as usize,
            other => panic!("LLEN replied {other:?}"),
        };
        let popped = popped.load(Ordering::Relaxed);
        assert_eq!(pushed - popped, left, "round {round}");
    }
}

#[test]
fn set_members_survive_removals_that_empty_the_set() {
    let engine = Engine::default();
    let done = Arc::new(AtomicBool::new(false));

    let removers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut removed = 0;
                let mut i = 0usize;
                while !done.load(Ordering::Acquire) {
                    let args = vec!["s".to_string(), format!("m{}", i % 1000)];
                    if engine.execute("SREM", &args).unwrap() == Reply::Integer(1) {
                        removed += 1;
                    }
                    i += 1;
                }
                removed
            })
        })
        .collect();

    for i in 0..1000 {
        ok(&engine, &format!("SADD s m{i}"));
    }
    done.store(true, Ordering::Release);
    let removed: usize = removers.into_iter().map(|h| h.join().unwrap()).sum();

    let left = match ok(&engine, "SCARD s") {
        Reply::Integer(n) => n as usize,
        other => panic!("SCARD replied {other:?}"),
    };
    assert_eq!(removed + left, 1000);
}

#[test]
fn lru_eviction_keeps_key_count_bounded() {
    let config = Config::default()
        .with_max_keys(10)
        .with_eviction_policy(keel::EvictionPolicy::Lru);
    let engine = Engine::new(config);

    for i in 0..50 {
        ok(&engine, &format!("SADD key{i} a"));
    }
    assert_eq!(engine.store().len(), 10);
    assert_eq!(ok(&engine, "EXISTS key49"), Reply::Integer(1));
}
