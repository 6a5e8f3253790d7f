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
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Typed view of the table properties a commit consults.
///
/// Missing keys take their default. A value that does not parse, or a minimum wait above the
/// maximum wait, is a [`ErrorKind::DataInvalid`] error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProperties {
    /// The number of times to retry a commit.
    pub commit_num_retries: usize,
    /// The minimum wait time between retries.
    pub commit_min_retry_wait_ms: u64,
    /// The maximum wait time between retries.
    pub commit_max_retry_wait_ms: u64,
    /// The total timeout for commit retries.
    pub commit_total_retry_timeout_ms: u64,
}

impl TableProperties {
    /// Property key for number of commit retries.
    pub const PROPERTY_COMMIT_NUM_RETRIES: &str = "commit.retry.num-retries";
    /// Default value for number of commit retries.
    pub const PROPERTY_COMMIT_NUM_RETRIES_DEFAULT: usize = 4;

    /// Property key for minimum wait time (ms) between retries.
    pub const PROPERTY_COMMIT_MIN_RETRY_WAIT_MS: &str = "commit.retry.min-wait-ms";
    /// Default value for minimum wait time (ms) between retries.
    pub const PROPERTY_COMMIT_MIN_RETRY_WAIT_MS_DEFAULT: u64 = 100;

    /// Property key for maximum wait time (ms) between retries.
    pub const PROPERTY_COMMIT_MAX_RETRY_WAIT_MS: &str = "commit.retry.max-wait-ms";
    /// Default value for maximum wait time (ms) between retries.
    pub const PROPERTY_COMMIT_MAX_RETRY_WAIT_MS_DEFAULT: u64 = 60 * 1000;

    /// Property key for total maximum retry time (ms).
    pub const PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS: &str = "commit.retry.total-timeout-ms";
    /// Default value for total maximum retry time (ms).
    pub const PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS_DEFAULT: u64 = 30 * 60 * 1000;
}

impl Default for TableProperties {
    fn default() -> Self {
        Self {
            commit_num_retries: Self::PROPERTY_COMMIT_NUM_RETRIES_DEFAULT,
            commit_min_retry_wait_ms: Self::PROPERTY_COMMIT_MIN_RETRY_WAIT_MS_DEFAULT,
            commit_max_retry_wait_ms: Self::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS_DEFAULT,
            commit_total_retry_timeout_ms: Self::PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS_DEFAULT,
        }
    }
}

struct PropertyReader<'a>(&'a HashMap<String, String>);

impl PropertyReader<'_> {
    fn get_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.0.get(key) else {
            return Ok(default);
        };
        value.trim().parse().map_err(|e| {
            Error::new(
                ErrorKind::DataInvalid,
                format!("Invalid value for {key}: {e}"),
            )
            .with_context("value", value)
        })
    }
}

impl TryFrom<&HashMap<String, String>> for TableProperties {
    type Error = Error;

    fn try_from(props: &HashMap<String, String>) -> Result<Self> {
        let reader = PropertyReader(props);
        let parsed = TableProperties {
            commit_num_retries: reader.get_or(
                Self::PROPERTY_COMMIT_NUM_RETRIES,
                Self::PROPERTY_COMMIT_NUM_RETRIES_DEFAULT,
            )?,
            commit_min_retry_wait_ms: reader.get_or(
                Self::PROPERTY_COMMIT_MIN_RETRY_WAIT_MS,
                Self::PROPERTY_COMMIT_MIN_RETRY_WAIT_MS_DEFAULT,
            )?,
            commit_max_retry_wait_ms: reader.get_or(
                Self::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS,
                Self::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS_DEFAULT,
            )?,
            commit_total_retry_timeout_ms: reader.get_or(
                Self::PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS,
                Self::PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS_DEFAULT,
            )?,
        };

        if parsed.commit_min_retry_wait_ms > parsed.commit_max_retry_wait_ms {
            return Err(Error::new(
                ErrorKind::DataInvalid,
                format!(
                    "{} must not exceed {}",
                    Self::PROPERTY_COMMIT_MIN_RETRY_WAIT_MS,
                    Self::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS
                ),
            )
            .with_context("min", parsed.commit_min_retry_wait_ms.to_string())
            .with_context("max", parsed.commit_max_retry_wait_ms.to_string()));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_table_properties_default() {
        let props = HashMap::new();
        let table_properties = TableProperties::try_from(&props).unwrap();
        assert_eq!(table_properties, TableProperties::default());
        assert_eq!(table_properties.commit_num_retries, 4);
        assert_eq!(table_properties.commit_min_retry_wait_ms, 100);
        assert_eq!(table_properties.commit_max_retry_wait_ms, 60_000);
        assert_eq!(table_properties.commit_total_retry_timeout_ms, 1_800_000);
    }

    #[test]
    fn test_table_properties_valid() {
        let props = HashMap::from([
            (
                TableProperties::PROPERTY_COMMIT_NUM_RETRIES.to_string(),
                "10".to_string(),
            ),
            (
                TableProperties::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS.to_string(),
                "20".to_string(),
            ),
        ]);
        let table_properties = TableProperties::try_from(&props).unwrap();
        assert_eq!(table_properties.commit_num_retries, 10);
        assert_eq!(table_properties.commit_max_retry_wait_ms, 20);
        assert_eq!(table_properties.commit_min_retry_wait_ms, 100);
    }

    #[test]
    fn test_table_properties_invalid() {
        let invalid_retries = HashMap::from([(
            TableProperties::PROPERTY_COMMIT_NUM_RETRIES.to_string(),
            "abc".to_string(),
        )]);

        let err = TableProperties::try_from(&invalid_retries).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
        assert!(
            err.to_string().contains(
                "Invalid value for commit.retry.num-retries: invalid digit found in string"
            )
        );

        let invalid_total = HashMap::from([(
            TableProperties::PROPERTY_COMMIT_TOTAL_RETRY_TIME_MS.to_string(),
            "-1".to_string(),
        )]);
        let err = TableProperties::try_from(&invalid_total).unwrap_err();
        assert!(
            err.to_string()
                .contains("Invalid value for commit.retry.total-timeout-ms")
        );
    }

    #[test]
    fn test_min_wait_above_max_wait() {
        let props = HashMap::from([
            (
                TableProperties::PROPERTY_COMMIT_MIN_RETRY_WAIT_MS.to_string(),
                "500".to_string(),
            ),
            (
                TableProperties::PROPERTY_COMMIT_MAX_RETRY_WAIT_MS.to_string(),
                "100".to_string(),
            ),
        ]);
        let err = TableProperties::try_from(&props).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataInvalid);
    }
}
