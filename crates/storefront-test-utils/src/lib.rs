//! Testing utilities for the storefront workspace
//!
//! Shared fetch fixtures with controllable latency and outcome.

#![allow(missing_docs)]

use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storefront_fetch::LoadContext;

pub type PageOutcome = Result<String, String>;

/// A fetch callback that answers after `delay`
pub fn delayed(
    delay: Duration,
    outcome: PageOutcome,
) -> impl Fn(LoadContext) -> BoxFuture<'static, PageOutcome> + Send + Sync + Clone {
    move |_ctx: LoadContext| {
        let outcome = outcome.clone();
        async move {
            tokio::time::sleep(delay).await;
            outcome
        }
        .boxed()
    }
}

/// A fetch callback that echoes the destination path after `delay`
pub fn echo_path(
    delay: Duration,
) -> impl Fn(LoadContext) -> BoxFuture<'static, PageOutcome> + Send + Sync + Clone {
    move |ctx: LoadContext| {
        async move {
            tokio::time::sleep(delay).await;
            Ok(ctx.as_path)
        }
        .boxed()
    }
}

/// Counts invocations of a wrapped fetch callback
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wrap `fetch` so every invocation is counted
    pub fn wrap<F, Fut>(&self, fetch: F) -> impl Fn(LoadContext) -> Fut + Send + Sync
    where
        F: Fn(LoadContext) -> Fut + Send + Sync,
    {
        let calls = Arc::clone(&self.calls);
        move |ctx: LoadContext| {
            calls.fetch_add(1, Ordering::SeqCst);
            fetch(ctx)
        }
    }
}

/// One scripted response: how long it takes and what it returns
#[derive(Debug, Clone)]
pub struct Scripted {
    pub latency: Duration,
    pub outcome: Result<u32, String>,
}

impl Scripted {
    pub fn ok(latency_ms: u64, value: u32) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            outcome: Ok(value),
        }
    }

    pub fn err(latency_ms: u64, message: &str) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            outcome: Err(message.to_string()),
        }
    }
}

/// A network that answers each call with the next scripted response
///
/// Calls past the end of the script fail.
#[derive(Debug, Clone)]
pub struct ScriptedNetwork {
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

impl ScriptedNetwork {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
        }
    }

    /// Fetch function taking any argument
    pub fn call<A>(&self) -> impl Fn(A) -> BoxFuture<'static, Result<u32, String>> + Send + Sync + Clone {
        let script = Arc::clone(&self.script);
        move |_args: A| {
            let next = script.lock().pop_front();
            async move {
                let Some(step) = next else {
                    return Err("script exhausted".to_string());
                };
                tokio::time::sleep(step.latency).await;
                step.outcome
            }
            .boxed()
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

pub fn page_path(id: u32) -> LoadContext {
    LoadContext::new(format!("/p/{id}"))
}
