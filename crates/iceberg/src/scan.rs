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

//! Table scan planning.

use futures::{StreamExt, TryStreamExt, future, stream};

use crate::error::{Error, Result};
use crate::expr::Predicate;
use crate::expr::visitors::InclusiveMetricsEvaluator;
use crate::io::FileIO;
use crate::spec::{DataFile, Manifest, TableMetadata};
use crate::utils::available_parallelism;

/// Returns the data files of the current snapshot that might contain rows matching
/// `predicate`.
///
/// Files are pruned with their column statistics only, so the result may still include files
/// without matching rows. Files are returned in manifest order.
pub async fn plan_files(
    file_io: &FileIO,
    metadata: &TableMetadata,
    predicate: Predicate,
    case_sensitive: bool,
) -> Result<Vec<DataFile>> {
    let Some(snapshot) = metadata.current_snapshot() else {
        return Ok(vec![]);
    };

    let evaluator = InclusiveMetricsEvaluator::new(
        metadata.current_schema().clone(),
        predicate,
        case_sensitive,
    )?;
    let concurrency_limit = available_parallelism().get();

    let manifests: Vec<Manifest> = stream::iter(snapshot.manifests())
        .map(|location| async move {
            let input = file_io.new_input(location)?;
            Manifest::read_from(&input).await
        })
        .buffered(concurrency_limit)
        .try_collect()
        .await?;

    stream::iter(manifests.into_iter().flat_map(Manifest::into_data_files))
        .map(|data_file| {
            let evaluator = &evaluator;
            async move { Ok::<_, Error>(evaluator.eval(&data_file)?.then_some(data_file)) }
        })
        .buffered(concurrency_limit)
        .try_filter_map(future::ok)
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::plan_files;
    use crate::ErrorKind;
    use crate::expr::{Predicate, Reference};
    use crate::io::FileIO;
    use crate::spec::{DataFile, DataFileBuilder, Datum};
    use crate::table_operations::{MemoryTableOperations, TableOperations};
    use crate::test_utils::{RecordingSleeper, test_table_metadata};
    use crate::transaction::{FastAppend, SnapshotUpdate};

    fn file_with_ids(path: &str, lower: i64, upper: i64) -> DataFile {
        DataFileBuilder::default()
            .file_path(path)
            .record_count(upper - lower + 1)
            .lower_bounds(HashMap::from([(1, Datum::long(lower).to_bytes().unwrap())]))
            .upper_bounds(HashMap::from([(1, Datum::long(upper).to_bytes().unwrap())]))
            .build()
            .unwrap()
    }

    async fn table_with_two_appends() -> Arc<MemoryTableOperations> {
        let ops = Arc::new(
            MemoryTableOperations::create(FileIO::new_with_memory(), test_table_metadata())
                .await
                .unwrap(),
        );

        for files in [
            vec![
                file_with_ids("memory://t/data/a.parquet", 0, 9),
                file_with_ids("memory://t/data/b.parquet", 10, 19),
            ],
            vec![file_with_ids("memory://t/data/c.parquet", 20, 29)],
        ] {
            SnapshotUpdate::new(ops.clone(), FastAppend::new().add_data_files(files))
                .commit_with_sleeper(RecordingSleeper::default())
                .await
                .unwrap();
        }
        ops
    }

    async fn plan(ops: &MemoryTableOperations, predicate: Predicate) -> Vec<String> {
        let metadata = ops.refresh().await.unwrap();
        plan_files(ops.file_io(), &metadata, predicate, true)
            .await
            .unwrap()
            .iter()
            .map(|f| f.file_path().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_plan_files_prunes_by_bounds() {
        let ops = table_with_two_appends().await;

        assert_eq!(
            plan(&ops, Reference::new("id").greater_than(Datum::long(15))).await,
            vec!["memory://t/data/c.parquet", "memory://t/data/b.parquet"]
        );
        assert_eq!(
            plan(&ops, Reference::new("id").equal_to(Datum::long(5))).await,
            vec!["memory://t/data/a.parquet"]
        );
        assert_eq!(
            plan(&ops, Reference::new("id").less_than(Datum::long(0))).await,
            Vec::<String>::new()
        );
        assert_eq!(plan(&ops, Predicate::AlwaysTrue).await.len(), 3);
    }

    #[tokio::test]
    async fn test_plan_files_empty_table() {
        let ops = MemoryTableOperations::create(FileIO::new_with_memory(), test_table_metadata())
            .await
            .unwrap();

        assert!(plan(&ops, Predicate::AlwaysTrue).await.is_empty());
    }

    #[tokio::test]
    async fn test_plan_files_unknown_column() {
        let ops = table_with_two_appends().await;
        let metadata = ops.refresh().await.unwrap();

        let err = plan_files(
            ops.file_io(),
            &metadata,
            Reference::new("missing").is_null(),
            true,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Binding);
    }
}
