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

//! Access to the persisted metadata pointer of a single table.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::lock::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::io::{FileIO, OutputFile};
use crate::spec::{TableMetadata, TableMetadataRef};
use crate::{Error, ErrorKind};

const METADATA_DIR: &str = "metadata";

/// Operations on the metadata of one table.
///
/// The persisted metadata pointer is the only shared state between writers. It changes only
/// through [`TableOperations::commit`], which must be an atomic compare-and-swap.
#[async_trait]
pub trait TableOperations: Debug + Send + Sync {
    /// Last metadata this instance has seen, without reading storage.
    async fn current(&self) -> TableMetadataRef;

    /// Re-read the latest persisted metadata.
    async fn refresh(&self) -> Result<TableMetadataRef>;

    /// Replace the persisted metadata with `updated` if and only if it still equals `base`.
    ///
    /// Returns an [`ErrorKind::CommitConflict`] error when the persisted metadata moved past
    /// `base`.
    async fn commit(&self, base: &TableMetadata, updated: TableMetadata) -> Result<()>;

    /// Allocate a new snapshot id.
    fn new_snapshot_id(&self) -> i64;

    /// Allocate a writable location for a metadata artifact, such as a manifest.
    fn new_metadata_file(&self, name: &str) -> Result<OutputFile>;

    /// Delete a file written on behalf of this table.
    async fn delete_file(&self, path: &str) -> Result<()>;

    /// The file io used to read and write this table's files.
    fn file_io(&self) -> &FileIO;
}

/// Generates a positive snapshot id from a random uuid.
pub(crate) fn generate_snapshot_id() -> i64 {
    let (lhs, rhs) = Uuid::new_v4().as_u64_pair();
    ((lhs ^ rhs) & i64::MAX as u64) as i64
}

struct MemoryTableState {
    metadata: TableMetadataRef,
    version: u64,
}

/// [`TableOperations`] keeping the metadata pointer in memory.
///
/// Every committed version is also written as JSON to
/// `<location>/metadata/v<version>.metadata.json`.
pub struct MemoryTableOperations {
    file_io: FileIO,
    location: String,
    state: Mutex<MemoryTableState>,
}

impl Debug for MemoryTableOperations {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTableOperations")
            .field("file_io", &self.file_io)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl MemoryTableOperations {
    /// Create a table from `metadata`, writing its first metadata version.
    pub async fn create(file_io: FileIO, metadata: TableMetadata) -> Result<Self> {
        let location = metadata.location().trim_end_matches('/').to_string();
        let ops = Self {
            file_io,
            location,
            state: Mutex::new(MemoryTableState {
                metadata: Arc::new(metadata),
                version: 0,
            }),
        };

        {
            let mut state = ops.state.lock().await;
            ops.write_metadata(1, &state.metadata).await?;
            state.version = 1;
        }

        Ok(ops)
    }

    /// Location of the metadata file for `version`.
    pub fn metadata_location(&self, version: u64) -> String {
        format!(
            "{}/{}/v{}.metadata.json",
            self.location, METADATA_DIR, version
        )
    }

    /// Version of the persisted metadata, starting at 1.
    pub async fn version(&self) -> u64 {
        self.state.lock().await.version
    }

    async fn write_metadata(&self, version: u64, metadata: &TableMetadata) -> Result<()> {
        let location = self.metadata_location(version);
        let bytes = Bytes::from(serde_json::to_vec(metadata)?);
        self.file_io.new_output(&location)?.write(bytes).await?;
        debug!(location = %location, "Wrote table metadata");
        Ok(())
    }
}

#[async_trait]
impl TableOperations for MemoryTableOperations {
    async fn current(&self) -> TableMetadataRef {
        self.state.lock().await.metadata.clone()
    }

    async fn refresh(&self) -> Result<TableMetadataRef> {
        Ok(self.state.lock().await.metadata.clone())
    }

    async fn commit(&self, base: &TableMetadata, updated: TableMetadata) -> Result<()> {
        let mut state = self.state.lock().await;

        if *state.metadata != *base {
            return Err(Error::new(
                ErrorKind::CommitConflict,
                "Cannot commit: table metadata changed since base was read",
            )
            .with_context("location", &self.location)
            .with_retryable(true));
        }

        if updated.uuid() != base.uuid() {
            return Err(Error::new(
                ErrorKind::ValidationFailed,
                format!(
                    "Cannot commit: table uuid changed from {} to {}",
                    base.uuid(),
                    updated.uuid()
                ),
            ));
        }

        let version = state.version + 1;
        self.write_metadata(version, &updated).await?;

        state.metadata = Arc::new(updated);
        state.version = version;
        Ok(())
    }

    fn new_snapshot_id(&self) -> i64 {
        generate_snapshot_id()
    }

    fn new_metadata_file(&self, name: &str) -> Result<OutputFile> {
        self.file_io
            .new_output(format!("{}/{}/{}", self.location, METADATA_DIR, name))
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.file_io.delete(path).await
    }

    fn file_io(&self) -> &FileIO {
        &self.file_io
    }
}
