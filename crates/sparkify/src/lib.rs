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

//! Sparkify data lake ETL
//!
//! Loads the Sparkify song catalog and app event logs from object storage and
//! writes them back as a star schema of partitioned Parquet artifact sets:
//! `songs`, `artists`, `users`, `time` and `songplays`.
//!
//! Reading, joining and writing run on an embedded [datafusion] engine. Storage
//! goes through [object_store], so the same job runs against S3, the local
//! filesystem, or an in-memory store.
//!
//! # Quickstart
//!
//! Run the whole job against the public input bucket:
//!
//! ```rust
//! use sparkify_etl::{EtlConfig, SparkifySessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//!     let config = EtlConfig::new()
//!         .input("s3a://udacity-dend/")
//!         .output("s3://my-bucket/sparkify/");
//!
//!     let session = SparkifySessionBuilder::from_config(&config).build()?;
//!
//!     let summary = sparkify_etl::run(&session, &config).await?;
//!
//!     for table in summary.tables {
//!         println!("{} rows -> {}", table.rows, table.location);
//!     }
//!
//!     Ok(())
//! };
//!```
//!
//! Each pipeline step is a plain function over a [datafusion::dataframe::DataFrame],
//! so steps can also be run on their own:
//!
//! ```rust
//! use sparkify_etl::{logs, schema, SparkifySessionBuilder, StorageLocation};
//! use sparkify_etl::readwriter::JsonOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//!     let session = SparkifySessionBuilder::new().build()?;
//!
//!     let log_data = StorageLocation::parse("/data/sparkify/log_data/")?;
//!
//!     let events = session.read().json(&log_data, JsonOptions::default()).await?;
//!
//!     let time = logs::time_table(logs::with_start_time(logs::song_plays(events)?)?)?;
//!
//!     time.show().await?;
//!
//!     Ok(())
//! };
//!```

pub mod conf;
pub mod errors;
pub mod etl;
pub mod functions;
pub mod logs;
pub mod readwriter;
pub mod schema;
pub mod session;
pub mod songs;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use conf::EtlConfig;
pub use errors::EtlError;
pub use etl::{run, EtlSummary, TableWrite};
pub use schema::Table;
pub use session::{SparkifySession, SparkifySessionBuilder};
pub use storage::StorageLocation;
