// Copyright (c) The Interlock Project Authors.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "This is an example")]
#![expect(clippy::unwrap_used, reason = "Examples favor brevity")]

//! A circuit opening under failures and recovering through probing.
//!
//! Run with: `cargo run --example breaker_basics`

use std::time::Duration;

use interlock::{BreakerError, BreakerEvent, BreakerPolicy, BreakerProvider};
use tick::ClockControl;

#[derive(Debug)]
struct DownstreamError;

impl std::fmt::Display for DownstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("downstream refused the call")
    }
}

impl std::error::Error for DownstreamError {}

fn main() {
    futures::executor::block_on(async {
        let control = ClockControl::new();
        let policy = BreakerPolicy::new()
            .failure_threshold(0.5)
            .min_throughput(4)
            .open_duration(Duration::from_secs(5))
            .probe_count(1);
        let provider = BreakerProvider::builder(control.to_clock()).memory(policy).build();

        let _subscription = provider.subscribe(|event: &BreakerEvent| {
            println!("event: {event:?}");
        });

        let breaker = provider.breaker("billing").build();

        // A burst of failures trips the circuit.
        for attempt in 0..4 {
            let outcome = breaker.run(|| async { Err::<(), _>(DownstreamError) }).await;
            println!("attempt {attempt}: {outcome:?}");
        }

        // Calls are now shed without reaching the dependency.
        match breaker.run(|| async { Ok::<_, DownstreamError>("charged") }).await {
            Err(BreakerError::Open(error)) => println!("rejected: {error}"),
            other => println!("unexpected: {other:?}"),
        }

        // After the cool-down, one successful probe closes the circuit again.
        control.advance(Duration::from_secs(6));
        let reply = breaker.run(|| async { Ok::<_, DownstreamError>("charged") }).await.unwrap();
        println!("probe reply: {reply}");
    });
}
