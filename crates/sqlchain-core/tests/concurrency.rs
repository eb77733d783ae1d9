mod common;

use common::{Book, book_pages};
use sqlchain_core::{
    config::PlanCacheConfig,
    expr::TypeRef,
    plan::{CompiledPlan, PlanCache},
    prelude::*,
};
use std::{
    sync::{Arc, Barrier},
    thread,
};

const THREADS: usize = 8;

fn cache(depth: usize) -> Arc<PlanCache> {
    Arc::new(
        PlanCache::new(&PlanCacheConfig {
            enabled: true,
            depth,
        })
        .expect("cache"),
    )
}

// Opaque i64 literal: every thread builds the same shape with its own value.
fn heavier_than(pages: i64) -> Queryable<Book> {
    Queryable::<Book>::table().filter(|x| {
        Expr::convert(x.field(book_pages()), TypeRef::of::<i64>()).greater_than(Expr::long(pages))
    })
}

fn pages(i: usize) -> i64 {
    i64::try_from(i).expect("small") * 100
}

#[test]
fn racing_sessions_share_one_plan() {
    let cache = cache(16);
    let schema = Arc::new(MappingSchema::new("shared"));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let cache = Arc::clone(&cache);
            let schema = Arc::clone(&schema);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let session = QuerySession::new(schema).with_cache(cache);
                let query = heavier_than(pages(i));
                barrier.wait();

                let plan = session.compile(&query).expect("compile");
                let bound = plan.bind(query.expr()).expect("bind");

                (plan, bound)
            })
        })
        .collect();

    let results: Vec<(Arc<CompiledPlan>, Vec<Value>)> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();

    assert_eq!(cache.len(), 1);
    let plans = cache.plans();
    for (i, (plan, bound)) in results.iter().enumerate() {
        assert!(Arc::ptr_eq(plan, &plans[0]));
        assert_eq!(bound, &[Value::Long(pages(i))]);
    }

    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, THREADS as u64);
    assert_eq!(stats.misses - stats.discarded, 1);
}

#[test]
fn concurrent_distinct_shapes_stay_within_depth() {
    let cache = cache(4);
    let schema = Arc::new(MappingSchema::new("bounded"));

    thread::scope(|scope| {
        for i in 0..THREADS {
            let cache = Arc::clone(&cache);
            let schema = Arc::clone(&schema);

            scope.spawn(move || {
                let session = QuerySession::new(schema).with_cache(cache);
                for n in 0..10 {
                    // i32 bounds are compared by value, so each count is its own shape.
                    let count = i32::try_from(i * 10 + n).expect("small");
                    session
                        .compile(&Queryable::<Book>::table().take(count))
                        .expect("compile");
                }
            });
        }
    });

    let stats = cache.stats();
    assert!(cache.len() <= 4);
    assert_eq!(stats.size, cache.len());
    assert_eq!(stats.hits + stats.misses, (THREADS * 10) as u64);
}
