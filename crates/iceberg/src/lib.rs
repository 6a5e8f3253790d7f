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
//! Snapshot commits and metrics-based file pruning for Apache Iceberg tables.
//!
//! # Examples
//!
//! ## Append And Scan
//!
//! ```rust, no_run
//! use std::sync::Arc;
//!
//! use iceberg_core::expr::Reference;
//! use iceberg_core::io::FileIO;
//! use iceberg_core::scan::plan_files;
//! use iceberg_core::spec::{DataFileBuilder, Datum, TableMetadata};
//! use iceberg_core::table_operations::{MemoryTableOperations, TableOperations};
//! use iceberg_core::transaction::{FastAppend, SnapshotUpdate};
//! use iceberg_core::Result;
//!
//! # async fn run(metadata: TableMetadata) -> Result<()> {
//! // Create a table in memory.
//! let ops = Arc::new(MemoryTableOperations::create(FileIO::new_with_memory(), metadata).await?);
//!
//! // Append a data file.
//! let data_file = DataFileBuilder::default()
//!     .file_path("memory://warehouse/t/data/1.parquet")
//!     .record_count(100)
//!     .build()
//!     .expect("required fields are set");
//! SnapshotUpdate::new(ops.clone(), FastAppend::new().add_data_files([data_file]))
//!     .commit()
//!     .await?;
//!
//! // Plan the files a filter might match.
//! let metadata = ops.refresh().await?;
//! let files = plan_files(
//!     ops.file_io(),
//!     &metadata,
//!     Reference::new("id").greater_than(Datum::long(10)),
//!     true,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate derive_builder;

mod error;
pub use error::{Error, ErrorKind, Result};

pub mod expr;
pub mod io;
pub mod scan;
pub mod spec;
pub mod table_operations;
pub mod transaction;

mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
