//! Sequencing behaviour of overlapping fetches
//!
//! Run with: cargo test --package storefront-fetch --test sequencing_tests

use futures::future::join_all;
use proptest::prelude::*;
use std::time::Duration;
use storefront_fetch::prelude::*;
use storefront_test_utils::{Scripted, ScriptedNetwork};

#[tokio::test(start_paused = true)]
async fn only_the_last_issued_call_is_delivered() {
    // Completion order: 3rd, 1st, 2nd
    let network = ScriptedNetwork::new([
        Scripted::ok(50, 1),
        Scripted::ok(80, 2),
        Scripted::ok(10, 3),
    ]);
    let search = fetch_latest(network.call::<&str>());

    let results = join_all([search.fetch("s"), search.fetch("sh"), search.fetch("sho")]).await;

    assert!(results[0].as_ref().unwrap_err().is_stale());
    assert!(results[1].as_ref().unwrap_err().is_stale());
    assert_eq!(results[2].as_ref().unwrap(), &3);
    assert_eq!(network.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn sequential_calls_are_never_stale() {
    let network = ScriptedNetwork::new([Scripted::ok(5, 1), Scripted::ok(5, 2)]);
    let search = fetch_latest(network.call::<()>());

    assert_eq!(search.fetch(()).await.unwrap(), 1);
    assert_eq!(search.fetch(()).await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn older_failure_stays_an_upstream_error() {
    let network = ScriptedNetwork::new([Scripted::err(30, "timeout"), Scripted::ok(10, 2)]);
    let search = fetch_latest(network.call::<()>());

    let results = join_all([search.fetch(()), search.fetch(())]).await;

    let mut results = results.into_iter();
    let first = results.next().unwrap().unwrap_err();
    assert!(!first.is_stale());
    assert_eq!(first.into_upstream().as_deref(), Some("timeout"));
    assert_eq!(results.next().unwrap().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn latest_failure_is_reported_as_is() {
    let network = ScriptedNetwork::new([Scripted::ok(10, 1), Scripted::err(20, "500")]);
    let search = fetch_latest(network.call::<()>());

    let results = join_all([search.fetch(()), search.fetch(())]).await;

    assert!(results[0].as_ref().unwrap_err().is_stale());
    assert_eq!(
        results[1].as_ref().unwrap_err().upstream().map(String::as_str),
        Some("500")
    );
}

#[tokio::test(start_paused = true)]
async fn issue_after_completion_does_not_invalidate_delivered_result() {
    let network = ScriptedNetwork::new([Scripted::ok(5, 1), Scripted::ok(5, 2)]);
    let search = fetch_latest(network.call::<()>());

    let first = search.fetch(());
    tokio::time::sleep(Duration::from_millis(1)).await;
    let delivered = first.await;
    let _second = search.fetch(());

    assert_eq!(delivered.unwrap(), 1);
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn last_issued_wins_for_any_completion_order(
        steps in prop::collection::vec((1u64..200, any::<bool>()), 1..10)
    ) {
        let script: Vec<Scripted> = steps
            .iter()
            .enumerate()
            .map(|(i, &(latency, fails))| {
                if fails {
                    Scripted::err(latency, "down")
                } else {
                    Scripted::ok(latency, i as u32)
                }
            })
            .collect();
        let network = ScriptedNetwork::new(script);
        let fetcher = fetch_latest(network.call::<usize>());

        let results = paused_runtime().block_on(async {
            join_all((0..steps.len()).map(|i| fetcher.fetch(i))).await
        });

        let last = steps.len() - 1;
        for (i, (result, &(_, fails))) in results.iter().zip(&steps).enumerate() {
            match result {
                Ok(value) => {
                    prop_assert_eq!(i, last);
                    prop_assert_eq!(*value, i as u32);
                }
                Err(e) if fails => prop_assert!(e.is_upstream()),
                Err(e) => {
                    prop_assert!(e.is_stale());
                    prop_assert!(i < last);
                }
            }
        }
    }
}
