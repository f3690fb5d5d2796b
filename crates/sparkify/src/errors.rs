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

//! Defines an [EtlError] for representing failures in the ETL job.
//! Most of these are wrappers for DataFusion, arrow or object store error messages
use std::fmt::Debug;

use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use thiserror::Error;

/// Different `ETL` Error types
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Already Exists: {0}")]
    AlreadyExists(String),

    #[error("Apache Arrow Error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("DataFusion Error: {0}")]
    DataFusionError(#[from] DataFusionError),

    #[error("Invalid Storage Location: {0}")]
    InvalidStorageLocation(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),

    #[error("Io Error: {0}")]
    IoError(String, std::io::Error),

    #[error("Object Store Error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Tags an error with the pipeline stage it escaped from.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            EtlError::Stage { .. } => self,
            other => EtlError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

impl From<std::io::Error> for EtlError {
    fn from(error: std::io::Error) -> Self {
        EtlError::IoError(error.to_string(), error)
    }
}

impl From<url::ParseError> for EtlError {
    fn from(value: url::ParseError) -> Self {
        EtlError::InvalidStorageLocation(value.to_string())
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(value: toml::de::Error) -> Self {
        EtlError::Config(value.to_string())
    }
}
