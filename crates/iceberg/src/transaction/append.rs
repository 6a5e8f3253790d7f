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

use async_trait::async_trait;

use crate::error::Result;
use crate::spec::{DataFile, Manifest, Operation, TableMetadata};
use crate::transaction::{SnapshotContext, SnapshotProducer};
use crate::{Error, ErrorKind};

/// Summary property with the number of data files added by a snapshot.
pub const ADDED_DATA_FILES: &str = "added-data-files";
/// Summary property with the number of records added by a snapshot.
pub const ADDED_RECORDS: &str = "added-records";

/// Appends data files to a table by writing one new manifest per attempt.
///
/// Existing manifests are carried over untouched, so an append never rewrites metadata of
/// earlier snapshots.
#[derive(Debug, Default)]
pub struct FastAppend {
    added_data_files: Vec<DataFile>,
    snapshot_properties: HashMap<String, String>,
    // Every manifest written by `apply`, across all attempts.
    written_manifests: Vec<String>,
}

impl FastAppend {
    /// Creates an empty append.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add data files to the snapshot.
    pub fn add_data_files(mut self, data_files: impl IntoIterator<Item = DataFile>) -> Self {
        self.added_data_files.extend(data_files);
        self
    }

    /// Set snapshot summary properties.
    pub fn set_snapshot_properties(mut self, snapshot_properties: HashMap<String, String>) -> Self {
        self.snapshot_properties = snapshot_properties;
        self
    }

    /// Manifests written so far that have not been cleaned up.
    pub fn written_manifests(&self) -> &[String] {
        &self.written_manifests
    }

    fn validate_added_data_files(&self) -> Result<()> {
        if self.added_data_files.is_empty() {
            return Err(Error::new(
                ErrorKind::ValidationFailed,
                "No data files to append",
            ));
        }

        let mut seen = HashSet::with_capacity(self.added_data_files.len());
        for data_file in &self.added_data_files {
            if !seen.insert(data_file.file_path()) {
                return Err(Error::new(
                    ErrorKind::ValidationFailed,
                    format!(
                        "Cannot add duplicate data file: {}",
                        data_file.file_path()
                    ),
                ));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SnapshotProducer for FastAppend {
    fn operation(&self) -> Operation {
        Operation::Append
    }

    fn summary(&self) -> HashMap<String, String> {
        let added_records: i64 = self
            .added_data_files
            .iter()
            .map(|f| f.record_count.max(0))
            .sum();

        let mut summary = self.snapshot_properties.clone();
        summary.insert(
            ADDED_DATA_FILES.to_string(),
            self.added_data_files.len().to_string(),
        );
        summary.insert(ADDED_RECORDS.to_string(), added_records.to_string());
        summary
    }

    async fn apply(
        &mut self,
        base: &TableMetadata,
        ctx: &mut SnapshotContext,
    ) -> Result<Vec<String>> {
        self.validate_added_data_files()?;

        let output = ctx.new_manifest_output()?;
        let location = output.location().to_string();
        // Tracked before writing so a partial write is still cleaned up.
        self.written_manifests.push(location.clone());

        Manifest::new(None, self.added_data_files.clone())
            .write_to(&output)
            .await?;

        let mut manifests = vec![location];
        if let Some(current) = base.current_snapshot() {
            manifests.extend(current.manifests().iter().cloned());
        }
        Ok(manifests)
    }

    async fn clean_uncommitted(&mut self, committed: &HashSet<String>, ctx: &mut SnapshotContext) {
        let (kept, uncommitted): (Vec<_>, Vec<_>) = std::mem::take(&mut self.written_manifests)
            .into_iter()
            .partition(|path| committed.contains(path));

        for path in &uncommitted {
            ctx.delete_file(path).await;
        }
        self.written_manifests = kept;
    }
}
