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

use std::sync::Arc;

use bytes::Bytes;

use super::{MemoryStorage, Storage};
use crate::{Error, ErrorKind, Result};

/// Handle to the storage a table lives in.
///
/// Paths are absolute locations including the scheme, such as `memory://warehouse/t/a.json`.
/// Cloning is cheap and clones share the storage.
#[derive(Clone, Debug)]
pub struct FileIO {
    storage: Arc<dyn Storage>,
}

impl FileIO {
    /// Create a new FileIO over the given storage.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create a new FileIO backed by a fresh [`MemoryStorage`].
    pub fn new_with_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Deletes file. Deleting a missing file succeeds.
    pub async fn delete(&self, path: impl AsRef<str>) -> Result<()> {
        self.storage.delete(checked_path(path.as_ref())?).await
    }

    /// Check file exists.
    pub async fn exists(&self, path: impl AsRef<str>) -> Result<bool> {
        self.storage.exists(checked_path(path.as_ref())?).await
    }

    /// Creates input file.
    pub fn new_input(&self, path: impl AsRef<str>) -> Result<InputFile> {
        Ok(InputFile {
            storage: self.storage.clone(),
            path: checked_path(path.as_ref())?.to_string(),
        })
    }

    /// Creates output file.
    pub fn new_output(&self, path: impl AsRef<str>) -> Result<OutputFile> {
        Ok(OutputFile {
            storage: self.storage.clone(),
            path: checked_path(path.as_ref())?.to_string(),
        })
    }
}

fn checked_path(path: &str) -> Result<&str> {
    if path.trim().is_empty() {
        return Err(Error::new(ErrorKind::DataInvalid, "File path must not be empty"));
    }
    Ok(path)
}

/// A file to read from.
#[derive(Debug)]
pub struct InputFile {
    storage: Arc<dyn Storage>,
    path: String,
}

impl InputFile {
    /// Absolute path of the file.
    pub fn location(&self) -> &str {
        &self.path
    }

    /// Check if file exists.
    pub async fn exists(&self) -> Result<bool> {
        self.storage.exists(&self.path).await
    }

    /// Whole content of the file.
    pub async fn read(&self) -> Result<Bytes> {
        self.storage.read(&self.path).await
    }
}

/// A file to write to.
#[derive(Debug)]
pub struct OutputFile {
    storage: Arc<dyn Storage>,
    path: String,
}

impl OutputFile {
    /// Absolute path of the file.
    pub fn location(&self) -> &str {
        &self.path
    }

    /// Checks if file exists.
    pub async fn exists(&self) -> Result<bool> {
        self.storage.exists(&self.path).await
    }

    /// Converts into [`InputFile`].
    pub fn to_input_file(self) -> InputFile {
        InputFile {
            storage: self.storage,
            path: self.path,
        }
    }

    /// Write `bs` as the whole content of the file.
    pub async fn write(&self, bs: Bytes) -> Result<()> {
        self.storage.write(&self.path, bs).await
    }
}
