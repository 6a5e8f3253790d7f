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

/*!
 * Snapshots
*/
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::Result;
use crate::spec::SchemaId;
use crate::{Error, ErrorKind};

/// Reference to [`Snapshot`].
pub type SnapshotRef = Arc<Snapshot>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
/// The operation field is used by some operations, like snapshot expiration, to skip processing certain snapshots.
pub enum Operation {
    /// Only data files were added and no files were removed.
    #[default]
    Append,
    /// Data and delete files were added and removed without changing table data;
    /// i.e., compaction, changing the data file format, or relocating data files.
    Replace,
    /// Data and delete files were added and removed in a logical overwrite operation.
    Overwrite,
    /// Data files were removed and their contents logically deleted and/or delete files were added to delete rows.
    Delete,
}

impl Operation {
    /// Returns the string representation (lowercase) of the operation.
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Append => "append",
            Operation::Replace => "replace",
            Operation::Overwrite => "overwrite",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
/// Summarises the changes in the snapshot.
pub struct Summary {
    /// The type of operation in the snapshot
    pub operation: Operation,
    /// Other summary data.
    #[serde(flatten)]
    pub additional_properties: HashMap<String, String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "kebab-case")]
#[builder(field_defaults(setter(prefix = "with_")))]
/// A snapshot represents the state of a table at some time and is used to access the complete set of data files in the table.
pub struct Snapshot {
    /// A unique long ID
    snapshot_id: i64,
    /// The snapshot ID of the snapshot’s parent.
    /// Omitted for any snapshot with no parent
    #[builder(default = None)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    parent_snapshot_id: Option<i64>,
    /// A monotonically increasing long that tracks the order of
    /// changes to a table.
    sequence_number: i64,
    /// A timestamp when the snapshot was created, used for garbage
    /// collection and table inspection
    timestamp_ms: i64,
    /// Locations of the manifests that together list every data file
    /// visible in this snapshot.
    #[builder(setter(into))]
    manifests: Vec<String>,
    /// A string map that summarizes the snapshot changes, including operation.
    summary: Summary,
    /// ID of the table’s current schema when the snapshot was created.
    #[builder(setter(strip_option), default = None)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    schema_id: Option<SchemaId>,
}

impl Snapshot {
    /// Get the id of the snapshot
    #[inline]
    pub fn snapshot_id(&self) -> i64 {
        self.snapshot_id
    }

    /// Get parent snapshot id.
    #[inline]
    pub fn parent_snapshot_id(&self) -> Option<i64> {
        self.parent_snapshot_id
    }

    /// Get sequence_number of the snapshot.
    #[inline]
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    /// Get the manifest locations of this snapshot.
    #[inline]
    pub fn manifests(&self) -> &[String] {
        &self.manifests
    }

    /// Get summary of the snapshot
    #[inline]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Get the raw commit timestamp in milliseconds.
    #[inline]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Get the timestamp of when the snapshot was created
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms).ok_or_else(|| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid snapshot timestamp: {}", self.timestamp_ms),
            )
        })
    }

    /// Get the schema id of this snapshot.
    #[inline]
    pub fn schema_id(&self) -> Option<SchemaId> {
        self.schema_id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let record = r#"
        {
            "snapshot-id": 3051729675574597004,
            "timestamp-ms": 1515100955770,
            "sequence-number": 1,
            "summary": {
                "operation": "append",
                "added-data-files": "2"
            },
            "manifests": ["s3://b/wh/.../m0.json"],
            "schema-id": 0
        }
        "#;

        let result: Snapshot = serde_json::from_str(record).unwrap();
        assert_eq!(3051729675574597004, result.snapshot_id());
        assert_eq!(None, result.parent_snapshot_id());
        assert_eq!(
            DateTime::from_timestamp_millis(1515100955770).unwrap(),
            result.timestamp().unwrap()
        );
        assert_eq!(Operation::Append, result.summary().operation);
        assert_eq!(
            Some(&"2".to_string()),
            result.summary().additional_properties.get("added-data-files")
        );
        assert_eq!(vec!["s3://b/wh/.../m0.json".to_string()], result.manifests());
        assert_eq!(Some(0), result.schema_id());
    }

    #[test]
    fn test_builder_defaults() {
        let snapshot = Snapshot::builder()
            .with_snapshot_id(1)
            .with_sequence_number(1)
            .with_timestamp_ms(0)
            .with_manifests(vec!["m0.json".to_string()])
            .with_summary(Summary::default())
            .build();

        assert_eq!(snapshot.parent_snapshot_id(), None);
        assert_eq!(snapshot.schema_id(), None);
        assert_eq!(snapshot.summary().operation.as_str(), "append");
    }
}
