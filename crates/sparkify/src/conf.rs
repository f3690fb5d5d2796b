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

//! Configuration for an ETL run: storage locations, credentials and engine settings.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::errors::EtlError;
use crate::readwriter::ParquetWriteOptions;
use crate::storage::StorageLocation;

pub const INPUT_ENV: &str = "SPARKIFY_INPUT";
pub const OUTPUT_ENV: &str = "SPARKIFY_OUTPUT";

const DEFAULT_INPUT: &str = "s3a://udacity-dend/";
const DEFAULT_OUTPUT: &str = "./sparkify-output/";

/// Static AWS credentials for the S3 object store.
///
/// Any value left unset falls back to the standard `AWS_*` environment variables.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AwsCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub region: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");

        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("region", &self.region)
            .finish()
    }
}

/// Config handler for an ETL run.
///
/// Values are resolved as: explicit setters, then a TOML config file, then the
/// `SPARKIFY_INPUT` / `SPARKIFY_OUTPUT` environment variables, then built-in defaults.
///
/// # Example
/// ```toml
/// input = "s3a://udacity-dend/"
/// output = "s3://my-bucket/sparkify/"
///
/// [aws]
/// access_key_id = "AKIA..."
/// secret_access_key = "..."
/// region = "us-west-2"
///
/// [options]
/// "datafusion.execution.target_partitions" = "8"
///
/// [parquet]
/// compression = "snappy"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    pub input: String,
    pub output: String,
    pub song_data: String,
    pub log_data: String,
    pub aws: Option<AwsCredentials>,
    pub options: HashMap<String, String>,
    pub parquet: ParquetWriteOptions,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            input: env::var(INPUT_ENV).unwrap_or_else(|_| DEFAULT_INPUT.to_string()),
            output: env::var(OUTPUT_ENV).unwrap_or_else(|_| DEFAULT_OUTPUT.to_string()),
            song_data: "song_data/".to_string(),
            log_data: "log_data/".to_string(),
            aws: None,
            options: HashMap::new(),
            parquet: ParquetWriteOptions::default(),
        }
    }
}

impl EtlConfig {
    pub fn new() -> Self {
        EtlConfig::default()
    }

    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, EtlError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn input(mut self, val: &str) -> Self {
        self.input = val.to_string();
        self
    }

    pub fn output(mut self, val: &str) -> Self {
        self.output = val.to_string();
        self
    }

    pub fn song_data(mut self, val: &str) -> Self {
        self.song_data = val.to_string();
        self
    }

    pub fn log_data(mut self, val: &str) -> Self {
        self.log_data = val.to_string();
        self
    }

    pub fn aws(mut self, val: AwsCredentials) -> Self {
        self.aws = Some(val);
        self
    }

    /// Sets an engine setting, e.g. `datafusion.execution.target_partitions`
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn parquet(mut self, val: ParquetWriteOptions) -> Self {
        self.parquet = val;
        self
    }

    pub fn input_location(&self) -> Result<StorageLocation, EtlError> {
        StorageLocation::parse(&self.input)
    }

    pub fn output_location(&self) -> Result<StorageLocation, EtlError> {
        StorageLocation::parse(&self.output)
    }

    /// Root of the song catalog tree
    pub fn song_data_location(&self) -> Result<StorageLocation, EtlError> {
        self.input_location()?.join(&self.song_data)
    }

    /// Root of the event log tree
    pub fn log_data_location(&self) -> Result<StorageLocation, EtlError> {
        self.input_location()?.join(&self.log_data)
    }
}
