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

//! File io implementation.
//!
//! # How to use `FileIO`
//!
//! ```rust
//! use bytes::Bytes;
//! use iceberg_core::io::FileIO;
//!
//! # async fn test() -> iceberg_core::Result<()> {
//! let file_io = FileIO::new_with_memory();
//! let output = file_io.new_output("memory://warehouse/t/metadata/a.json")?;
//! output.write(Bytes::from_static(b"{}")).await?;
//! assert!(file_io.exists("memory://warehouse/t/metadata/a.json").await?);
//! # Ok(())
//! # }
//! ```
//!
//! `FileIO` provides simple methods for file operations:
//!
//! - `delete`: Delete file.
//! - `exists`: Check if file exists.
//! - `new_input`: Create input file for reading.
//! - `new_output`: Create output file for writing.

mod file_io;
pub use file_io::*;

mod storage;
pub use storage::Storage;

mod memory;
pub use memory::MemoryStorage;
