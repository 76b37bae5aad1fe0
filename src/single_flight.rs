//! Coalescing of concurrent token refreshes

use crate::error::{ClientError, Result};
use async_singleflight::Group;
use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

const REFRESH_KEY: &str = "refresh";

/// Outcome of a coalesced refresh as seen by one caller
#[derive(Debug)]
pub struct Flight {
    pub result: Result<String>,
    /// Whether this caller ran the refresh rather than joining another caller's
    pub leader: bool,
}

/// Guarantees at most one token refresh in flight per coalescer
///
/// Callers that arrive while a refresh is running wait for it and receive its
/// result, success or failure, instead of starting their own. Once the refresh
/// settles the slot is free again. If the caller running the refresh is dropped
/// before it settles, a waiting caller takes over and runs it again.
///
/// Share one coalescer (behind an `Arc`) between clients that share a token store.
pub struct RefreshCoalescer {
    /// The refresh outcome travels as the value so that waiters see failures too;
    /// the group only hands errors to the caller that produced them.
    group: Group<std::result::Result<String, String>, Infallible>,
}

impl RefreshCoalescer {
    pub fn new() -> Self {
        Self {
            group: Group::new(),
        }
    }

    /// Run `refresh` unless one is already in flight, in which case join it
    pub async fn run<F, Fut>(&self, refresh: F) -> Flight
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        loop {
            let led = AtomicBool::new(false);
            let (outcome, _, _) = self
                .group
                .work(REFRESH_KEY, async {
                    led.store(true, Ordering::Release);
                    Ok::<_, Infallible>(refresh().await.map_err(|e| e.to_string()))
                })
                .await;

            match outcome {
                Some(result) => {
                    return Flight {
                        result: result.map_err(ClientError::RefreshFailed),
                        leader: led.load(Ordering::Acquire),
                    };
                }
                None => {
                    debug!("Refresh abandoned by its caller, running it again");
                }
            }
        }
    }
}

impl Default for RefreshCoalescer {
    fn default() -> Self {
        Self::new()
    }
}
