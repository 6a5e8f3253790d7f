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

use std::collections::HashMap;

use serde_bytes::ByteBuf;
use serde_derive::{Deserialize, Serialize};

/// Per-file column statistics consulted when pruning files.
///
/// Every map is sparse. A column id missing from a map means the statistic was not collected,
/// never that it is zero.
pub trait FileMetrics {
    /// Number of records in the file. Zero or negative means the file holds no rows.
    fn record_count(&self) -> i64;
    /// Map from column id to number of values in the column, including nulls.
    fn value_counts(&self) -> &HashMap<i32, u64>;
    /// Map from column id to number of null values in the column.
    fn null_value_counts(&self) -> &HashMap<i32, u64>;
    /// Map from column id to lower bound, in single-value binary serialization.
    fn lower_bounds(&self) -> &HashMap<i32, ByteBuf>;
    /// Map from column id to upper bound, in single-value binary serialization.
    fn upper_bounds(&self) -> &HashMap<i32, ByteBuf>;
}

/// Data file carries data file path and metrics.
#[derive(Debug, PartialEq, Clone, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(rename_all = "kebab-case")]
pub struct DataFile {
    /// Full URI for the file with FS scheme
    pub(crate) file_path: String,
    /// Number of records in this file
    pub(crate) record_count: i64,
    /// Total file size in bytes
    #[builder(default)]
    #[serde(default)]
    pub(crate) file_size_in_bytes: u64,
    /// Map from column id to number of values in the column (including null
    /// and NaN values)
    #[builder(default)]
    #[serde(default)]
    pub(crate) value_counts: HashMap<i32, u64>,
    /// Map from column id to number of null values in the column
    #[builder(default)]
    #[serde(default)]
    pub(crate) null_value_counts: HashMap<i32, u64>,
    /// Map from column id to lower bound in the column serialized as binary.
    #[builder(default)]
    #[serde(default)]
    pub(crate) lower_bounds: HashMap<i32, ByteBuf>,
    /// Map from column id to upper bound in the column serialized as binary.
    #[builder(default)]
    #[serde(default)]
    pub(crate) upper_bounds: HashMap<i32, ByteBuf>,
}

impl DataFile {
    /// Get the file path.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Get the file size in bytes.
    pub fn file_size_in_bytes(&self) -> u64 {
        self.file_size_in_bytes
    }
}

impl FileMetrics for DataFile {
    fn record_count(&self) -> i64 {
        self.record_count
    }

    fn value_counts(&self) -> &HashMap<i32, u64> {
        &self.value_counts
    }

    fn null_value_counts(&self) -> &HashMap<i32, u64> {
        &self.null_value_counts
    }

    fn lower_bounds(&self) -> &HashMap<i32, ByteBuf> {
        &self.lower_bounds
    }

    fn upper_bounds(&self) -> &HashMap<i32, ByteBuf> {
        &self.upper_bounds
    }
}
