//! Concurrent adapter requests share one synthesis per pair.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::{Arc, Barrier};
use std::thread;

use duck_proxy::{GenerationContext, ProxyMode};
use duck_types::{MethodBuilder, MethodFlags, TypeBuilder, TypeId, TypeRef, TypeStore, Value};

const THREADS: usize = 8;

fn reader_pair() -> (Arc<TypeStore>, TypeRef, TypeRef) {
    let store = Arc::new(TypeStore::new());
    let ireader = store.define(
        TypeBuilder::interface("App.IReader").method(
            MethodBuilder::new("Read")
                .returns(TypeId::INT32.into())
                .with_flags(MethodFlags::ABSTRACT | MethodFlags::VIRTUAL),
        ),
    );
    let reader = store.define(
        TypeBuilder::class("Lib.Reader").method(
            MethodBuilder::new("Read")
                .returns(TypeId::INT32.into())
                .body(|inv| Ok(Value::I32(*inv.this_state::<i32>()?))),
        ),
    );
    (store, TypeRef::of(ireader), TypeRef::of(reader))
}

#[test]
fn concurrent_requests_synthesize_once() {
    let (store, ireader, reader) = reader_pair();
    let ctx = GenerationContext::new(Arc::clone(&store));
    let barrier = Barrier::new(THREADS);

    let factories: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    ctx.factory(&ireader, &reader, ProxyMode::Forward).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(factories.iter().all(|f| Arc::ptr_eq(f, &factories[0])));
    assert_eq!(ctx.cached_factories(), 1);
    let module = store.module(ctx.module()).name;
    assert!(store.lookup_type(&format!("{module}.IReader_ReaderProxy0")).is_some());
    assert!(store.lookup_type(&format!("{module}.IReader_ReaderProxy1")).is_none());
}

#[test]
fn adapters_are_usable_from_many_threads() {
    let (store, ireader, reader) = reader_pair();
    let ctx = GenerationContext::new(store);

    let sums: Vec<i32> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let ctx = &ctx;
                let (ireader, reader) = (&ireader, &reader);
                s.spawn(move || {
                    let n = i32::try_from(n).unwrap();
                    let adapter = ctx.create(ireader, &Value::object(reader.clone(), n)).unwrap();
                    (0..100)
                        .map(|_| adapter.call("Read", &mut []).unwrap().as_i32().unwrap())
                        .sum::<i32>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let expected: Vec<i32> = (0..8).map(|n| n * 100).collect();
    assert_eq!(sums, expected);
    assert_eq!(ctx.cached_factories(), 1);
}
