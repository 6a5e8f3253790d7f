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

//! Storage that keeps every object in process memory.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::Storage;
use crate::{Error, ErrorKind, Result};

const SCHEME: &str = "memory:";

/// [`Storage`] over a shared map from path to bytes.
///
/// Clones share the same objects. `memory://a/b`, `memory:/a/b`, `/a/b` and `a/b` all name
/// the same object.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn object_key(path: &str) -> String {
        path.strip_prefix(SCHEME)
            .unwrap_or(path)
            .trim_start_matches('/')
            .to_string()
    }

    /// Keys of all stored objects, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.objects()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn objects(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Bytes>>> {
        self.objects
            .read()
            .map_err(|e| Error::new(ErrorKind::Unexpected, format!("Memory storage poisoned: {e}")))
    }

    fn objects_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Bytes>>> {
        self.objects
            .write()
            .map_err(|e| Error::new(ErrorKind::Unexpected, format!("Memory storage poisoned: {e}")))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects()?.contains_key(&Self::object_key(path)))
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        self.objects()?
            .get(&Self::object_key(path))
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::DataInvalid, "Object not found").with_context("path", path)
            })
    }

    async fn write(&self, path: &str, bs: Bytes) -> Result<()> {
        self.objects_mut()?.insert(Self::object_key(path), bs);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects_mut()?.remove(&Self::object_key(path));
        Ok(())
    }
}
