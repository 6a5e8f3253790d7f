// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::future::Future;
use std::time::Duration;

use backon::{
    BackoffBuilder, ExponentialBackoff, ExponentialBuilder, RetryableWithContext, Sleeper,
};
use tokio::time::Instant;
use tracing::warn;

use crate::error::Result;
use crate::spec::TableProperties;
use crate::{Error, ErrorKind};

/// Backoff policy for retrying commits that lost a compare-and-swap race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    num_retries: usize,
    min_wait: Duration,
    max_wait: Duration,
    total_timeout: Duration,
}

impl RetryPolicy {
    /// Multiplier applied to the delay after every retry.
    pub const BACKOFF_FACTOR: f32 = 2.0;

    /// Creates a policy from the commit retry table properties.
    pub fn new(props: &TableProperties) -> Self {
        Self {
            num_retries: props.commit_num_retries,
            min_wait: Duration::from_millis(props.commit_min_retry_wait_ms),
            max_wait: Duration::from_millis(props.commit_max_retry_wait_ms),
            total_timeout: Duration::from_millis(props.commit_total_retry_timeout_ms),
        }
    }

    /// Maximum number of retries after the first attempt.
    pub fn num_retries(&self) -> usize {
        self.num_retries
    }

    fn backoff(&self) -> DeadlineBackoff {
        let delays = ExponentialBuilder::new()
            .with_min_delay(self.min_wait)
            .with_max_delay(self.max_wait)
            .with_total_delay(Some(self.total_timeout))
            .with_max_times(self.num_retries)
            .with_factor(Self::BACKOFF_FACTOR)
            .build();
        DeadlineBackoff {
            delays,
            started: Instant::now(),
            budget: self.total_timeout,
        }
    }

    /// Runs `attempt` until it succeeds, fails with anything other than a commit conflict, or
    /// the backoff is exhausted. The total timeout is measured from the first attempt and
    /// includes the time attempts take.
    ///
    /// `attempt` receives the context and the attempt number, starting at 1, and hands the
    /// context back with its result. The final context is returned along with the result of
    /// the last attempt.
    pub async fn retry_with_context<C, T, F, Fut, S>(
        &self,
        sleeper: S,
        context: C,
        mut attempt: F,
    ) -> (C, Result<T>)
    where
        F: FnMut(C, usize) -> Fut,
        Fut: Future<Output = (C, Result<T>)>,
        S: Sleeper,
    {
        let mut retries = 0;
        let ((context, _), result) = (|(context, attempts): (C, usize)| {
            let next = attempt(context, attempts + 1);
            async move {
                let (context, result) = next.await;
                ((context, attempts + 1), result)
            }
        })
        .retry(self.backoff())
        .sleep(sleeper)
        .context((context, 0))
        .when(|e: &Error| e.kind() == ErrorKind::CommitConflict)
        .notify(|e: &Error, delay: Duration| {
            retries += 1;
            warn!(
                retry = retries,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Commit conflict, retrying"
            );
        })
        .await;

        (context, result)
    }
}

/// Exponential delays that run out once the time since the first attempt, plus the next
/// delay, would exceed the total timeout.
///
/// Time spent inside attempts counts against the budget. The clock is tokio's, so paused test
/// runtimes control it.
#[derive(Debug)]
struct DeadlineBackoff {
    delays: ExponentialBackoff,
    started: Instant,
    budget: Duration,
}

impl Iterator for DeadlineBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.delays.next()?;
        (self.started.elapsed() + delay <= self.budget).then_some(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&TableProperties::default())
    }
}
