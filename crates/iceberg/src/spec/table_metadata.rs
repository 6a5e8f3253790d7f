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

//! Defines the [table metadata](https://iceberg.apache.org/spec/#table-metadata).
//! The main struct here is [TableMetadata] which defines the data for a table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SchemaRef, Snapshot, SnapshotRef, TableProperties};
use crate::error::Result;
use crate::{Error, ErrorKind};

/// Sequence number of a table with no snapshots.
pub const INITIAL_SEQUENCE_NUMBER: i64 = 0;

/// Reference to [`TableMetadata`].
pub type TableMetadataRef = Arc<TableMetadata>;

/// Table metadata: everything a commit reads from and writes to the shared metadata pointer.
///
/// Values are immutable. A commit derives a new value with [`TableMetadata::with_new_snapshot`]
/// and swaps it in atomically.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(try_from = "self::_serde::TableMetadataV2", into = "self::_serde::TableMetadataV2")]
pub struct TableMetadata {
    pub(crate) table_uuid: Uuid,
    pub(crate) location: String,
    pub(crate) last_sequence_number: i64,
    pub(crate) last_updated_ms: i64,
    pub(crate) schema: SchemaRef,
    pub(crate) properties: HashMap<String, String>,
    pub(crate) current_snapshot_id: Option<i64>,
    pub(crate) snapshots: HashMap<i64, SnapshotRef>,
    pub(crate) snapshot_log: Vec<SnapshotLog>,
}

impl TableMetadata {
    /// Creates metadata for a new, empty table.
    pub fn new(
        location: impl Into<String>,
        schema: SchemaRef,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            table_uuid: Uuid::new_v4(),
            location: location.into(),
            last_sequence_number: INITIAL_SEQUENCE_NUMBER,
            last_updated_ms: Utc::now().timestamp_millis(),
            schema,
            properties,
            current_snapshot_id: None,
            snapshots: HashMap::new(),
            snapshot_log: Vec::new(),
        }
    }

    /// Returns uuid of current table.
    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.table_uuid
    }

    /// Returns table location.
    #[inline]
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Returns last sequence number.
    #[inline]
    pub fn last_sequence_number(&self) -> i64 {
        self.last_sequence_number
    }

    /// Returns the sequence number assigned to the next snapshot.
    #[inline]
    pub fn next_sequence_number(&self) -> i64 {
        self.last_sequence_number + 1
    }

    /// Returns last updated time.
    #[inline]
    pub fn last_updated_timestamp(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_updated_ms).ok_or_else(|| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid last updated timestamp: {}", self.last_updated_ms),
            )
        })
    }

    /// Returns last updated time in milliseconds.
    #[inline]
    pub fn last_updated_ms(&self) -> i64 {
        self.last_updated_ms
    }

    /// Get current schema
    #[inline]
    pub fn current_schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Returns properties of table.
    #[inline]
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Returns the commit-related properties, parsed.
    pub fn table_properties(&self) -> Result<TableProperties> {
        TableProperties::try_from(&self.properties)
    }

    /// Returns all snapshots
    #[inline]
    pub fn snapshots(&self) -> impl ExactSizeIterator<Item = &SnapshotRef> {
        self.snapshots.values()
    }

    /// Lookup snapshot by id.
    #[inline]
    pub fn snapshot_by_id(&self, snapshot_id: i64) -> Option<&SnapshotRef> {
        self.snapshots.get(&snapshot_id)
    }

    /// Returns snapshot history.
    #[inline]
    pub fn history(&self) -> &[SnapshotLog] {
        &self.snapshot_log
    }

    /// Get current snapshot
    #[inline]
    pub fn current_snapshot(&self) -> Option<&SnapshotRef> {
        self.current_snapshot_id
            .and_then(|id| self.snapshot_by_id(id))
    }

    /// Get the current snapshot id
    #[inline]
    pub fn current_snapshot_id(&self) -> Option<i64> {
        self.current_snapshot_id
    }

    /// Returns a copy of this metadata with `snapshot` added and made current.
    ///
    /// Fails if a snapshot with the same id already exists.
    pub fn with_new_snapshot(&self, snapshot: Snapshot) -> Result<TableMetadata> {
        if self.snapshots.contains_key(&snapshot.snapshot_id()) {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "Snapshot already exists for: '{}'",
                    snapshot.snapshot_id()
                ),
            ));
        }

        let mut metadata = self.clone();
        metadata.last_sequence_number = metadata
            .last_sequence_number
            .max(snapshot.sequence_number());
        metadata.last_updated_ms = snapshot.timestamp_ms();
        metadata.current_snapshot_id = Some(snapshot.snapshot_id());
        metadata.snapshot_log.push(SnapshotLog {
            snapshot_id: snapshot.snapshot_id(),
            timestamp_ms: snapshot.timestamp_ms(),
        });
        metadata
            .snapshots
            .insert(snapshot.snapshot_id(), Arc::new(snapshot));
        Ok(metadata)
    }
}

mod _serde {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_derive::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::{SnapshotLog, TableMetadata};
    use crate::spec::{Schema, Snapshot};
    use crate::{Error, ErrorKind};

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub(super) struct TableMetadataV2 {
        pub table_uuid: Uuid,
        pub location: String,
        pub last_sequence_number: i64,
        pub last_updated_ms: i64,
        pub schema: Schema,
        #[serde(default)]
        pub properties: HashMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        pub current_snapshot_id: Option<i64>,
        #[serde(default)]
        pub snapshots: Vec<Snapshot>,
        #[serde(default)]
        pub snapshot_log: Vec<SnapshotLog>,
    }

    impl TryFrom<TableMetadataV2> for TableMetadata {
        type Error = Error;

        fn try_from(value: TableMetadataV2) -> Result<Self, Self::Error> {
            let snapshots: HashMap<_, _> = value
                .snapshots
                .into_iter()
                .map(|s| (s.snapshot_id(), Arc::new(s)))
                .collect();
            if let Some(id) = value.current_snapshot_id {
                if !snapshots.contains_key(&id) {
                    return Err(Error::new(
                        ErrorKind::DataInvalid,
                        format!("Snapshot for current snapshot id {id} does not exist"),
                    ));
                }
            }
            Ok(TableMetadata {
                table_uuid: value.table_uuid,
                location: value.location,
                last_sequence_number: value.last_sequence_number,
                last_updated_ms: value.last_updated_ms,
                schema: Arc::new(value.schema),
                properties: value.properties,
                current_snapshot_id: value.current_snapshot_id,
                snapshots,
                snapshot_log: value.snapshot_log,
            })
        }
    }

    impl From<TableMetadata> for TableMetadataV2 {
        fn from(v: TableMetadata) -> Self {
            let mut snapshots: Vec<Snapshot> = v
                .snapshots
                .into_values()
                .map(Arc::unwrap_or_clone)
                .collect();
            snapshots.sort_by_key(|s| s.sequence_number());
            TableMetadataV2 {
                table_uuid: v.table_uuid,
                location: v.location,
                last_sequence_number: v.last_sequence_number,
                last_updated_ms: v.last_updated_ms,
                schema: Arc::unwrap_or_clone(v.schema),
                properties: v.properties,
                current_snapshot_id: v.current_snapshot_id,
                snapshots,
                snapshot_log: v.snapshot_log,
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
/// A log of when each snapshot was made.
pub struct SnapshotLog {
    /// Id of the snapshot.
    pub snapshot_id: i64,
    /// Last updated timestamp
    pub timestamp_ms: i64,
}
