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

//! Test utilities.
//! Fixtures and test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use backon::Sleeper;

use crate::io::{FileIO, OutputFile};
use crate::spec::{
    DataFile, DataFileBuilder, NestedField, PrimitiveType, Schema, TableMetadata,
    TableMetadataRef, Type,
};
use crate::table_operations::{MemoryTableOperations, TableOperations};
use crate::{Error, ErrorKind, Result};

pub(crate) const TABLE_LOCATION: &str = "memory://warehouse/t";

pub(crate) fn test_table_metadata() -> TableMetadata {
    test_table_metadata_with_properties(HashMap::new())
}

pub(crate) fn test_table_metadata_with_properties(
    properties: HashMap<String, String>,
) -> TableMetadata {
    let schema = Schema::builder()
        .with_schema_id(0)
        .with_fields(vec![
            NestedField::required(1, "id", Type::Primitive(PrimitiveType::Long)).into(),
            NestedField::optional(2, "name", Type::Primitive(PrimitiveType::String)).into(),
        ])
        .build()
        .unwrap();
    TableMetadata::new(TABLE_LOCATION, Arc::new(schema), properties)
}

pub(crate) fn data_file(path: &str, record_count: i64) -> DataFile {
    DataFileBuilder::default()
        .file_path(path)
        .record_count(record_count)
        .build()
        .unwrap()
}

/// A [`Sleeper`] that returns immediately and remembers every delay it was asked for.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    type Sleep = std::future::Ready<()>;

    fn sleep(&self, dur: Duration) -> Self::Sleep {
        self.delays.lock().unwrap().push(dur);
        std::future::ready(())
    }
}

/// Wraps [`MemoryTableOperations`] and injects failures.
#[derive(Debug)]
pub(crate) struct FlakyTableOperations {
    inner: Arc<MemoryTableOperations>,
    conflicts: AtomicUsize,
    commit_calls: AtomicUsize,
    committed: AtomicBool,
    stale_refresh_after_commit: bool,
    failing_refresh_after_commit: bool,
    error_after_commit: bool,
    error_instead_of_commit: bool,
    failing_deletes: bool,
    stale: Mutex<Option<TableMetadataRef>>,
    deleted: Mutex<Vec<String>>,
}

impl FlakyTableOperations {
    pub(crate) fn new(inner: Arc<MemoryTableOperations>) -> Self {
        Self {
            inner,
            conflicts: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
            committed: AtomicBool::new(false),
            stale_refresh_after_commit: false,
            failing_refresh_after_commit: false,
            error_after_commit: false,
            error_instead_of_commit: false,
            failing_deletes: false,
            stale: Mutex::new(None),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Reject the first `n` commits with a conflict.
    pub(crate) fn with_conflicts(self, n: usize) -> Self {
        self.conflicts.store(n, Ordering::SeqCst);
        self
    }

    /// After a commit lands, keep serving the metadata it replaced.
    pub(crate) fn with_stale_refresh_after_commit(mut self) -> Self {
        self.stale_refresh_after_commit = true;
        self
    }

    /// Fail every refresh once a commit was attempted.
    pub(crate) fn with_failing_refresh_after_commit(mut self) -> Self {
        self.failing_refresh_after_commit = true;
        self
    }

    /// Apply the commit, then report an unexpected error.
    pub(crate) fn with_error_after_commit(mut self) -> Self {
        self.error_after_commit = true;
        self
    }

    /// Report an unexpected error without applying the commit.
    pub(crate) fn with_error_instead_of_commit(mut self) -> Self {
        self.error_instead_of_commit = true;
        self
    }

    pub(crate) fn with_failing_deletes(mut self) -> Self {
        self.failing_deletes = true;
        self
    }

    pub(crate) fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    /// Paths deleted successfully, in order.
    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableOperations for FlakyTableOperations {
    async fn current(&self) -> TableMetadataRef {
        self.inner.current().await
    }

    async fn refresh(&self) -> Result<TableMetadataRef> {
        if self.failing_refresh_after_commit && self.committed.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::Unexpected, "refresh failed"));
        }
        if let Some(stale) = self.stale.lock().unwrap().clone() {
            return Ok(stale);
        }
        self.inner.refresh().await
    }

    async fn commit(&self, base: &TableMetadata, updated: TableMetadata) -> Result<()> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        self.committed.store(true, Ordering::SeqCst);

        let conflicts = self.conflicts.load(Ordering::SeqCst);
        if conflicts > 0 {
            self.conflicts.store(conflicts - 1, Ordering::SeqCst);
            return Err(
                Error::new(ErrorKind::CommitConflict, "injected conflict").with_retryable(true)
            );
        }

        if self.error_instead_of_commit {
            return Err(Error::new(ErrorKind::Unexpected, "connection reset"));
        }

        self.inner.commit(base, updated).await?;

        if self.stale_refresh_after_commit {
            *self.stale.lock().unwrap() = Some(Arc::new(base.clone()));
        }
        if self.error_after_commit {
            return Err(Error::new(ErrorKind::Unexpected, "connection reset"));
        }
        Ok(())
    }

    fn new_snapshot_id(&self) -> i64 {
        self.inner.new_snapshot_id()
    }

    fn new_metadata_file(&self, name: &str) -> Result<OutputFile> {
        self.inner.new_metadata_file(name)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        if self.failing_deletes {
            return Err(Error::new(ErrorKind::Unexpected, "delete failed"));
        }
        self.inner.delete_file(path).await?;
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn file_io(&self) -> &FileIO {
        self.inner.file_io()
    }
}
