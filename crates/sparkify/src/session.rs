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

//! Sparkify Session wrapping the DataFusion execution context

use std::collections::HashMap;
use std::sync::Arc;

use datafusion::execution::context::SessionContext;
use datafusion::prelude::SessionConfig;
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::conf::{AwsCredentials, EtlConfig};
use crate::errors::EtlError;
use crate::readwriter::DataFrameReader;
use crate::storage::{Scheme, StorageLocation};

/// SparkifySessionBuilder creates the execution context shared by both pipelines.
#[derive(Clone, Debug)]
pub struct SparkifySessionBuilder {
    app_name: String,
    configs: HashMap<String, String>,
    credentials: Option<AwsCredentials>,
    object_stores: Vec<(Url, Arc<dyn ObjectStore>)>,
}

impl Default for SparkifySessionBuilder {
    fn default() -> Self {
        Self {
            app_name: "sparkify-etl".to_string(),
            configs: HashMap::new(),
            credentials: None,
            object_stores: vec![],
        }
    }
}

impl SparkifySessionBuilder {
    pub fn new() -> Self {
        SparkifySessionBuilder::default()
    }

    /// Builder seeded with the engine options and credentials of an [EtlConfig]
    pub fn from_config(config: &EtlConfig) -> Self {
        let builder = SparkifySessionBuilder::new().configs(&config.options);

        match &config.aws {
            Some(credentials) => builder.credentials(credentials.clone()),
            None => builder,
        }
    }

    /// Sets an engine config option, e.g. `datafusion.execution.target_partitions`.
    pub fn config(mut self, key: &str, value: &str) -> Self {
        self.configs.insert(key.into(), value.into());
        self
    }

    /// Sets many engine config options at once
    pub fn configs<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.configs.extend(
            options
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        self
    }

    /// Sets a name for the application, which will be shown in the job logs.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = name.to_string();
        self
    }

    /// Static credentials for S3 locations registered on the session
    pub fn credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Registers an object store up front, e.g. an in-memory store under `mem://`
    pub fn with_object_store(mut self, url: &Url, store: Arc<dyn ObjectStore>) -> Self {
        self.object_stores.push((url.clone(), store));
        self
    }

    /// Create the execution context and return a [SparkifySession]
    pub fn build(&self) -> Result<SparkifySession, EtlError> {
        let mut config = SessionConfig::new();

        // input trees nest their files a few directories deep
        config
            .options_mut()
            .execution
            .listing_table_ignore_subdirectory = false;

        for (key, value) in &self.configs {
            config.options_mut().set(key, value)?;
        }

        let ctx = SessionContext::new_with_config(config);

        for (url, store) in &self.object_stores {
            ctx.register_object_store(url, Arc::clone(store));
        }

        let session = SparkifySession {
            ctx,
            app_name: self.app_name.clone(),
            run_id: Uuid::new_v4(),
            credentials: self.credentials.clone(),
        };

        info!(
            app_name = %session.app_name,
            run_id = %session.run_id,
            "session started"
        );
        debug!("session configs {:?}", self.configs);

        Ok(session)
    }
}

/// The entry point to the execution engine.
///
/// The session is passed explicitly to every pipeline step.
#[derive(Clone)]
pub struct SparkifySession {
    ctx: SessionContext,
    app_name: String,
    run_id: Uuid,
    credentials: Option<AwsCredentials>,
}

impl SparkifySession {
    /// Returns a [DataFrameReader] that can be used to read data in as a DataFrame
    pub fn read(&self) -> DataFrameReader {
        DataFrameReader::new(self.clone())
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Make sure an object store is available for `location`.
    ///
    /// S3 buckets get an `AmazonS3` store built from the session credentials and the
    /// `AWS_*` environment. Local files are always available. In-memory stores have
    /// to be registered on the builder.
    pub fn register_storage(&self, location: &StorageLocation) -> Result<(), EtlError> {
        let store_url = location.object_store_url()?;

        if self.ctx.runtime_env().object_store(&store_url).is_ok() {
            return Ok(());
        }

        match location.scheme() {
            Scheme::S3 => {
                let bucket = location.bucket().ok_or_else(|| {
                    EtlError::InvalidStorageLocation(format!("No bucket in {location}"))
                })?;

                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

                if let Some(creds) = &self.credentials {
                    if let Some(key) = &creds.access_key_id {
                        builder = builder.with_access_key_id(key);
                    }
                    if let Some(secret) = &creds.secret_access_key {
                        builder = builder.with_secret_access_key(secret);
                    }
                    if let Some(token) = &creds.session_token {
                        builder = builder.with_token(token);
                    }
                    if let Some(region) = &creds.region {
                        builder = builder.with_region(region);
                    }
                }

                let store: Arc<dyn ObjectStore> = Arc::new(builder.build()?);
                self.ctx.register_object_store(store_url.as_ref(), store);

                info!(bucket, "registered S3 object store");
                Ok(())
            }
            Scheme::File => Ok(()),
            Scheme::Memory => Err(EtlError::InvalidStorageLocation(format!(
                "No in-memory object store registered for {location}"
            ))),
        }
    }

    /// The object store backing `location`
    pub fn object_store(
        &self,
        location: &StorageLocation,
    ) -> Result<Arc<dyn ObjectStore>, EtlError> {
        let store_url = location.object_store_url()?;
        Ok(self.ctx.runtime_env().object_store(&store_url)?)
    }
}

impl std::fmt::Debug for SparkifySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparkifySession")
            .field("session_id", &self.ctx.session_id())
            .field("app_name", &self.app_name)
            .field("run_id", &self.run_id)
            .finish()
    }
}
