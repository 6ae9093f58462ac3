//! Exponential-backoff polling for asynchronous provider operations.

use crate::error::Result;
use log::trace;
use std::{thread, time::Duration};

pub const INITIAL_DELAY: Duration = Duration::from_millis(500);
pub const MAX_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u32 = 8;

/// How many times a failed check may be repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retries {
    Limited(u32),
    Unlimited,
}

impl Default for Retries {
    fn default() -> Self {
        Retries::Limited(DEFAULT_RETRIES)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    sleep: fn(Duration),
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(INITIAL_DELAY, MAX_DELAY)
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Backoff {
            initial,
            max,
            sleep: thread::sleep,
        }
    }

    /// Replaces the blocking sleep, e.g. with a no-op in tests.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Delays between successive attempts: doubling, capped at the maximum.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let max = self.max;
        std::iter::successors(Some(self.initial.min(max)), move |d| {
            Some(d.saturating_mul(2).min(max))
        })
    }

    /// Calls `check` until it returns `true` or the retries are used up.
    ///
    /// With `Retries::Limited(k)` a check that never succeeds runs `k + 1`
    /// times. Errors from `check` abort the wait immediately.
    pub fn wait<F>(&self, mut check: F, retries: Retries) -> Result<bool>
    where
        F: FnMut() -> Result<bool>,
    {
        let mut retried = 0;
        let mut delays = self.delays();

        loop {
            if check()? {
                return Ok(true);
            }
            if let Retries::Limited(max) = retries {
                if retried >= max {
                    return Ok(false);
                }
            }
            retried += 1;
            let delay = delays.next().unwrap_or(self.max);
            trace!("not ready yet, retry {retried} in {delay:?}");
            (self.sleep)(delay);
        }
    }
}
