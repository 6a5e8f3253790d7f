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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use backon::{Sleeper, TokioSleeper};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::io::{FileIO, OutputFile};
use crate::spec::{Operation, Snapshot, SnapshotRef, Summary, TableMetadata};
use crate::table_operations::TableOperations;
use crate::transaction::RetryPolicy;
use crate::{Error, ErrorKind};

/// A change that produces a new snapshot, such as an append.
///
/// [`SnapshotUpdate`] drives the commit and calls back into the producer. `apply` may run once
/// per attempt against a different base each time, so it must not carry state from earlier
/// calls into its result. It should remember every artifact it writes so `clean_uncommitted`
/// can delete the ones that were not committed.
#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    /// Operation recorded in the snapshot summary.
    fn operation(&self) -> Operation;

    /// Extra properties recorded in the snapshot summary.
    fn summary(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Compute the manifest list of a new snapshot on top of `base`.
    async fn apply(&mut self, base: &TableMetadata, ctx: &mut SnapshotContext)
    -> Result<Vec<String>>;

    /// Delete every manifest written by `apply` that is not in `committed`.
    ///
    /// Deletes go through [`SnapshotContext::delete_file`], which records failures instead of
    /// returning them.
    async fn clean_uncommitted(&mut self, committed: &HashSet<String>, ctx: &mut SnapshotContext);
}

/// Per-commit state shared with a [`SnapshotProducer`].
#[derive(Debug)]
pub struct SnapshotContext {
    ops: Arc<dyn TableOperations>,
    commit_uuid: Uuid,
    manifest_counter: u64,
    cleanup_errors: Vec<Error>,
}

impl SnapshotContext {
    pub(crate) fn new(ops: Arc<dyn TableOperations>, commit_uuid: Uuid) -> Self {
        Self {
            ops,
            commit_uuid,
            manifest_counter: 0,
            cleanup_errors: Vec::new(),
        }
    }

    /// Id of this commit, shared by every attempt.
    pub fn commit_uuid(&self) -> Uuid {
        self.commit_uuid
    }

    /// File io of the table being committed to.
    pub fn file_io(&self) -> &FileIO {
        self.ops.file_io()
    }

    /// Allocate a location for a new manifest.
    ///
    /// Names are `<commit-uuid>-m<index>.json`, with one counter across all attempts, so no two
    /// attempts or concurrent commits write the same file.
    pub fn new_manifest_output(&mut self) -> Result<OutputFile> {
        let name = format!("{}-m{}.json", self.commit_uuid, self.manifest_counter);
        self.manifest_counter += 1;
        let output = self.ops.new_metadata_file(&name)?;
        debug!(location = %output.location(), "Allocated manifest");
        Ok(output)
    }

    /// Delete a file, recording the error if the delete fails.
    pub async fn delete_file(&mut self, path: &str) {
        match self.ops.delete_file(path).await {
            Ok(()) => debug!(path, "Deleted uncommitted file"),
            Err(e) => {
                warn!(path, error = %e, "Failed to delete uncommitted file");
                self.cleanup_errors.push(e.with_context("path", path));
            }
        }
    }

    /// Errors recorded by [`SnapshotContext::delete_file`] so far.
    pub fn cleanup_errors(&self) -> &[Error] {
        &self.cleanup_errors
    }

    fn take_cleanup_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.cleanup_errors)
    }
}

/// What the reconciliation read found out about the last attempt.
enum Reconciled {
    Committed(HashSet<String>),
    NotCommitted,
    Unknown,
}

struct CommitState<P> {
    producer: P,
    ctx: SnapshotContext,
    last_snapshot_id: Option<i64>,
    // Set while the compare-and-swap of the last attempt is in flight.
    commit_outcome_unknown: bool,
}

impl<P: SnapshotProducer> CommitState<P> {
    async fn attempt(&mut self, attempt: usize) -> Result<SnapshotRef> {
        let base = self.ctx.ops.refresh().await?;
        let manifests = self.producer.apply(&base, &mut self.ctx).await?;

        let snapshot = Snapshot::builder()
            .with_snapshot_id(self.ctx.ops.new_snapshot_id())
            .with_parent_snapshot_id(base.current_snapshot_id())
            .with_sequence_number(base.next_sequence_number())
            .with_timestamp_ms(Utc::now().timestamp_millis())
            .with_manifests(manifests)
            .with_summary(Summary {
                operation: self.producer.operation(),
                additional_properties: self.producer.summary(),
            })
            .with_schema_id(base.current_schema().schema_id())
            .build();
        let updated = base.with_new_snapshot(snapshot.clone())?;

        debug!(
            attempt,
            snapshot_id = snapshot.snapshot_id(),
            "Attempting snapshot commit"
        );
        self.last_snapshot_id = Some(snapshot.snapshot_id());
        self.commit_outcome_unknown = true;
        let result = self.ctx.ops.commit(&base, updated).await;
        match &result {
            Ok(()) => self.commit_outcome_unknown = false,
            Err(e) if e.kind() == ErrorKind::CommitConflict => {
                self.commit_outcome_unknown = false
            }
            Err(_) => {}
        }
        result.map(|()| Arc::new(snapshot))
    }

    async fn clean(&mut self, committed: &HashSet<String>) {
        self.producer
            .clean_uncommitted(committed, &mut self.ctx)
            .await;
    }

    /// Re-read the table after the compare-and-swap succeeded and clean up the manifests the
    /// committed snapshot does not reference.
    async fn verify(&mut self, snapshot_id: i64) {
        let current = match self.ctx.ops.refresh().await {
            Ok(current) => current,
            Err(e) => {
                info!(snapshot_id, error = %e, "Failed to verify commit, skipping cleanup");
                return;
            }
        };

        let Some(committed) = current.snapshot_by_id(snapshot_id) else {
            info!(snapshot_id, "Committed snapshot not found on refresh, skipping cleanup");
            return;
        };

        info!(snapshot_id, "Committed snapshot");
        let committed = committed.manifests().iter().cloned().collect();
        self.clean(&committed).await;
        for e in self.ctx.take_cleanup_errors() {
            debug!(error = %e, "Ignored cleanup failure after successful commit");
        }
    }

    async fn reconcile(&mut self, suppressed: &mut Vec<Error>) -> Reconciled {
        let Some(snapshot_id) = self.last_snapshot_id else {
            return Reconciled::NotCommitted;
        };

        match self.ctx.ops.refresh().await {
            Ok(current) => match current.snapshot_by_id(snapshot_id) {
                Some(snapshot) => {
                    info!(snapshot_id, "Found committed snapshot after failure");
                    Reconciled::Committed(snapshot.manifests().iter().cloned().collect())
                }
                None => Reconciled::NotCommitted,
            },
            Err(e) => {
                suppressed.push(e);
                Reconciled::Unknown
            }
        }
    }

    /// Clean up after the retry loop failed with `err` and return the error to surface.
    async fn fail(&mut self, err: Error) -> Error {
        let mut suppressed = Vec::new();

        match err.kind() {
            ErrorKind::CommitConflict | ErrorKind::ValidationFailed => {
                self.clean(&HashSet::new()).await;
            }
            _ => match self.reconcile(&mut suppressed).await {
                Reconciled::Committed(committed) => self.clean(&committed).await,
                Reconciled::NotCommitted | Reconciled::Unknown
                    if self.commit_outcome_unknown =>
                {
                    info!(
                        snapshot_id = ?self.last_snapshot_id,
                        "Commit state unknown, skipping cleanup"
                    );
                }
                Reconciled::NotCommitted | Reconciled::Unknown => {
                    self.clean(&HashSet::new()).await;
                }
            },
        }

        suppressed.extend(self.ctx.take_cleanup_errors());
        err.with_suppressed_all(suppressed)
    }
}

/// Commits a new snapshot produced by a [`SnapshotProducer`].
///
/// The commit refreshes the table, applies the producer and swaps in the new metadata,
/// retrying on commit conflicts with the backoff configured in the table properties. Manifests
/// that do not end up in the committed snapshot are handed back to the producer for cleanup,
/// unless it can not be determined whether the commit landed.
pub struct SnapshotUpdate<P> {
    ops: Arc<dyn TableOperations>,
    producer: P,
    commit_uuid: Uuid,
}

impl<P: SnapshotProducer> SnapshotUpdate<P> {
    /// Creates a new update of the table behind `ops`.
    pub fn new(ops: Arc<dyn TableOperations>, producer: P) -> Self {
        Self {
            ops,
            producer,
            commit_uuid: Uuid::new_v4(),
        }
    }

    /// Id used to name the artifacts of this commit.
    pub fn commit_uuid(&self) -> Uuid {
        self.commit_uuid
    }

    /// Commit, sleeping between retries with tokio timers.
    pub async fn commit(self) -> Result<SnapshotRef> {
        self.commit_with_sleeper(TokioSleeper).await
    }

    /// Commit, sleeping between retries with `sleeper`.
    pub async fn commit_with_sleeper<S: Sleeper>(self, sleeper: S) -> Result<SnapshotRef> {
        let props = self.ops.current().await.table_properties()?;
        let policy = RetryPolicy::new(&props);

        let state = CommitState {
            producer: self.producer,
            ctx: SnapshotContext::new(self.ops, self.commit_uuid),
            last_snapshot_id: None,
            commit_outcome_unknown: false,
        };

        let (mut state, result) = policy
            .retry_with_context(sleeper, state, |mut state, attempt| async move {
                let result = state.attempt(attempt).await;
                (state, result)
            })
            .await;

        match result {
            Ok(snapshot) => {
                state.verify(snapshot.snapshot_id()).await;
                Ok(snapshot)
            }
            Err(e) => Err(state.fail(e).await),
        }
    }
}
