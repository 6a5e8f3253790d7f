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

//! This module contains the snapshot commit api.
//!
//! A [`SnapshotProducer`] decides which manifests make up a new snapshot. [`SnapshotUpdate`]
//! commits that snapshot with optimistic concurrency: it refreshes the table, applies the
//! producer and swaps the new metadata in, retrying when another writer committed first.
//!
//! Below is a basic example using the "fast-append" producer:
//!
//! ```ignore
//! use iceberg_core::transaction::{FastAppend, SnapshotUpdate};
//!
//! let append = FastAppend::new().add_data_files(my_data_files);
//!
//! // Manifests written by attempts that lost a race are deleted once the commit settles.
//! let snapshot = SnapshotUpdate::new(my_table_ops, append).commit().await?;
//! ```

mod append;
mod retry;
mod snapshot;

pub use append::*;
pub use retry::RetryPolicy;
pub use snapshot::{SnapshotContext, SnapshotProducer, SnapshotUpdate};
