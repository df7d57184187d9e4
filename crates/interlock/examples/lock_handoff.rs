// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is an example")]
#![expect(clippy::unwrap_used, reason = "Examples favor brevity")]

//! Two rival owners contending for one named lock.
//!
//! Run with: `cargo run --example lock_handoff`

use std::time::Duration;

use interlock::{LockEvent, LockProvider};
use tick::ClockControl;

fn main() {
    futures::executor::block_on(async {
        let control = ClockControl::new();
        let provider = LockProvider::builder(control.to_clock()).memory().build();

        // Watch the lifecycle on the provider's event bus.
        let _subscription = provider.subscribe(|event: &LockEvent| {
            println!("event: {event:?}");
        });

        let worker_1 = provider.lock("nightly-reindex").ttl(Duration::from_secs(30)).build();
        let worker_2 = provider.lock("nightly-reindex").ttl(Duration::from_secs(30)).build();

        // Worker 1 wins the lease, worker 2 is told to back off.
        assert!(worker_1.acquire().await.unwrap());
        assert!(!worker_2.acquire().await.unwrap());

        // The scoped form releases on every exit path.
        worker_1.release().await.unwrap();
        let report = worker_2
            .run(|| async {
                // ... the exclusive work ...
                "reindexed 42 shards"
            })
            .await
            .unwrap();
        println!("worker 2: {report}");

        // Once the lease lapses, anyone may take over.
        assert!(worker_1.acquire().await.unwrap());
        control.advance(Duration::from_secs(31));
        assert!(worker_2.acquire().await.unwrap());
    });
}
