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

//! Manifest for Iceberg.

use bytes::Bytes;
use serde_derive::{Deserialize, Serialize};

use super::DataFile;
use crate::error::Result;
use crate::io::{InputFile, OutputFile};
use crate::{Error, ErrorKind};

/// A manifest contains metadata and a list of data files.
///
/// Manifests are written once and never modified, so a manifest location uniquely identifies
/// its content.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    /// Id of the snapshot attempt that wrote this manifest, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    added_snapshot_id: Option<i64>,
    data_files: Vec<DataFile>,
}

impl Manifest {
    /// Create a new manifest.
    pub fn new(added_snapshot_id: Option<i64>, data_files: Vec<DataFile>) -> Self {
        Self {
            added_snapshot_id,
            data_files,
        }
    }

    /// Data files listed by this manifest.
    pub fn data_files(&self) -> &[DataFile] {
        &self.data_files
    }

    /// Consume this Manifest, returning its data files.
    pub fn into_data_files(self) -> Vec<DataFile> {
        self.data_files
    }

    /// Id of the snapshot attempt that wrote this manifest.
    pub fn added_snapshot_id(&self) -> Option<i64> {
        self.added_snapshot_id
    }

    /// Parse manifest from bytes of a JSON file.
    pub fn parse_json(bs: &[u8]) -> Result<Self> {
        serde_json::from_slice(bs).map_err(|e| {
            Error::new(ErrorKind::DataInvalid, "Failed to parse manifest").with_source(e)
        })
    }

    /// Serialize this manifest to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Write this manifest to `output`.
    pub async fn write_to(&self, output: &OutputFile) -> Result<()> {
        output.write(self.to_json_bytes()?).await
    }

    /// Load a manifest from `input`.
    pub async fn read_from(input: &InputFile) -> Result<Self> {
        let bs = input.read().await?;
        Self::parse_json(&bs).map_err(|e| e.with_context("location", input.location()))
    }
}
