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

//! DataFrameReader & DataFrameWriter representations

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{AsArray, RecordBatch};
use arrow::datatypes::{DataType, UInt64Type};
use datafusion::config::ConfigField;
use datafusion::dataframe::{DataFrame, DataFrameWriteOptions};
use datafusion::logical_expr::Expr;
use datafusion::prelude::{NdJsonReadOptions, ParquetReadOptions};
use futures_util::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::ObjectStore;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::EtlError;
use crate::functions::{partition_key, restore_partition_key};
use crate::session::SparkifySession;
use crate::storage::StorageLocation;
use crate::types::StructType;

/// A trait used to convert to the expected engine options for readwriters
///
/// This sets multiple options at once using a HashMap
pub trait ConfigOpts {
    fn to_options(&self) -> HashMap<String, String>;
}

#[macro_export]
macro_rules! define_file_options {
    (
        $(#[doc = $struct_d:tt])* // Struct-level documentation attributes
        $vis:vis struct $struct_name:ident {
            // Custom fields with options
            $(
                $field_name:ident : $field_type:ty,
                key = $key:expr
            )*$(,)*
        }
    ) => {

        $(#[doc = $struct_d])* // Apply struct documentation
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        $vis struct $struct_name {
            // Custom fields
            $(
               $field_name: Option<$field_type>,
            )*
        }

        impl $struct_name {
            // Builder methods for custom fields
            $(
                pub fn $field_name(mut self, value: $field_type) -> Self {
                    self.$field_name = Some(value);
                    self
                }
            )*
        }

        impl ConfigOpts for $struct_name {
            fn to_options(&self) -> HashMap<String, String> {
                let mut options: HashMap<String, String> = HashMap::new();

                $(
                    if let Some(value) = &self.$field_name {
                        options.insert(
                            $key.to_string(),
                            value.to_string()
                        );
                    }
                )*

                options
            }
        }
    };
}

define_file_options! {
    /// A struct that represents options for writing Parquet artifact sets.
    ///
    /// Unset options keep the session's `datafusion.execution.parquet.*` defaults.
    ///
    /// # Options
    ///
    /// - `compression`: Codec for data pages, e.g. `snappy`, `zstd(3)`, `uncompressed`.
    /// - `max_row_group_size`: Maximum number of rows per row group.
    /// - `writer_version`: Parquet writer version, `1.0` or `2.0`.
    /// - `statistics_enabled`: Statistics level, `none`, `chunk` or `page`.
    /// - `dictionary_enabled`: Whether dictionary encoding is used.
    /// - `created_by`: Value written to the `created_by` file metadata.
    ///
    /// # Example
    /// ```
    /// let options = ParquetWriteOptions::default()
    ///     .compression("snappy".to_string())
    ///     .max_row_group_size(1024 * 1024);
    /// ```
    pub struct ParquetWriteOptions {
        compression : String, key = "compression"
        max_row_group_size : usize, key = "max_row_group_size"
        writer_version : String, key = "writer_version"
        statistics_enabled : String, key = "statistics_enabled"
        dictionary_enabled : bool, key = "dictionary_enabled"
        created_by : String, key = "created_by"
    }
}

/// Options for reading newline-delimited JSON.
///
/// Without a `schema` the input schema is inferred from the data.
/// Files in nested directories are read as well.
#[derive(Clone, Debug, Default)]
pub struct JsonOptions {
    schema: Option<StructType>,
    file_extension: Option<String>,
}

impl JsonOptions {
    /// Declared schema of the input records
    pub fn schema(mut self, schema: StructType) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Only files ending with this extension are read. Defaults to `.json`.
    pub fn file_extension(mut self, extension: &str) -> Self {
        self.file_extension = Some(extension.to_string());
        self
    }
}

/// Specifies the behavior when data already exists at the target location
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveMode {
    /// Add new files next to whatever is there
    Append,
    /// Remove every object under the location, then write
    #[default]
    Overwrite,
    /// Fail if the location holds any object
    ErrorIfExists,
    /// Silently skip the write if the location holds any object
    Ignore,
}

/// DataFrameReader represents the entrypoint to create a DataFrame
/// from a specific file format.
#[derive(Clone, Debug)]
pub struct DataFrameReader {
    session: SparkifySession,
}

impl DataFrameReader {
    /// Create a new DataFrameReader with a [SparkifySession]
    pub fn new(session: SparkifySession) -> Self {
        Self { session }
    }

    /// Reads every JSON file below `location`, recursively.
    pub async fn json(
        self,
        location: &StorageLocation,
        options: JsonOptions,
    ) -> Result<DataFrame, EtlError> {
        let schema = options.schema.as_ref().map(|s| s.to_arrow());
        let extension = options.file_extension.as_deref().unwrap_or(".json");

        let mut read_options = NdJsonReadOptions::default().file_extension(extension);

        if let Some(schema) = &schema {
            read_options = read_options.schema(schema);
        }

        debug!(%location, declared_schema = schema.is_some(), "reading json");

        Ok(self
            .session
            .context()
            .read_json(location.as_str(), read_options)
            .await?)
    }

    /// Reads a Parquet artifact set written with Hive-style partition directories.
    ///
    /// Partition columns come back as strings, with the Hive null sentinel
    /// restored to null.
    pub async fn parquet(
        self,
        location: &StorageLocation,
        partition_columns: &[&str],
    ) -> Result<DataFrame, EtlError> {
        let table_partition_cols = partition_columns
            .iter()
            .map(|name| (name.to_string(), DataType::Utf8))
            .collect();

        let options = ParquetReadOptions::default().table_partition_cols(table_partition_cols);

        debug!(%location, ?partition_columns, "reading parquet");

        let df = self
            .session
            .context()
            .read_parquet(location.as_str(), options)
            .await?;

        if partition_columns.is_empty() {
            return Ok(df);
        }

        let exprs: Vec<Expr> = df
            .schema()
            .columns()
            .into_iter()
            .map(|column| {
                if partition_columns.contains(&column.name.as_str()) {
                    let name = column.name.clone();
                    restore_partition_key(Expr::Column(column)).alias(name)
                } else {
                    Expr::Column(column)
                }
            })
            .collect();

        Ok(df.select(exprs)?)
    }
}

/// DataFrameWriter provides the ability to output a [DataFrame]
/// as a partitioned Parquet artifact set
pub struct DataFrameWriter {
    session: SparkifySession,
    dataframe: DataFrame,
    mode: SaveMode,
    partition_by: Vec<String>,
}

impl DataFrameWriter {
    /// Create a new DataFrameWriter from a provided [DataFrame]
    ///
    /// # Defaults
    /// - `mode`: [SaveMode::Overwrite],
    /// - `partition_by`: vec![],
    pub fn new(session: SparkifySession, dataframe: DataFrame) -> Self {
        Self {
            session,
            dataframe,
            mode: SaveMode::Overwrite,
            partition_by: vec![],
        }
    }

    /// Specifies the behavior when data already exists
    pub fn mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Partitions the output by the given columns on the file system
    pub fn partition_by<'a, I>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.partition_by = cols.into_iter().map(|col| col.to_string()).collect();
        self
    }

    /// Writes the DataFrame to Parquet files below `location`.
    ///
    /// Returns the number of rows written.
    pub async fn parquet(
        self,
        location: &StorageLocation,
        options: &ParquetWriteOptions,
    ) -> Result<u64, EtlError> {
        let store = self.session.object_store(location)?;
        let prefix = location.prefix()?;

        match self.mode {
            SaveMode::Overwrite => {
                let removed = delete_prefix(&store, &prefix).await?;
                debug!(%location, removed, "cleared previous output");
            }
            SaveMode::ErrorIfExists => {
                if has_objects(&store, &prefix).await? {
                    return Err(EtlError::AlreadyExists(location.to_string()));
                }
            }
            SaveMode::Ignore => {
                if has_objects(&store, &prefix).await? {
                    info!(%location, "output exists, skipping write");
                    return Ok(0);
                }
            }
            SaveMode::Append => {}
        }

        let mut parquet_options = self.session.context().copied_table_options().parquet;
        let overrides = options.to_options();
        for (key, value) in &overrides {
            parquet_options.set(key, value)?;
        }
        debug!(?overrides, "parquet writer options");

        let dataframe = self.partitioned_frame()?;
        let write_options =
            DataFrameWriteOptions::new().with_partition_by(self.partition_by.clone());

        let batches = dataframe
            .write_parquet(location.as_str(), write_options, Some(parquet_options))
            .await?;

        Ok(rows_written(&batches))
    }

    /// Replaces partition columns by their Hive directory values
    fn partitioned_frame(&self) -> Result<DataFrame, EtlError> {
        if self.partition_by.is_empty() {
            return Ok(self.dataframe.clone());
        }

        let columns = self.dataframe.schema().columns();

        if let Some(missing) = self
            .partition_by
            .iter()
            .find(|p| !columns.iter().any(|c| &c.name == *p))
        {
            return Err(EtlError::InvalidArgument(format!(
                "Partition column '{missing}' is not in the DataFrame"
            )));
        }

        let exprs: Vec<Expr> = columns
            .into_iter()
            .map(|column| {
                if self.partition_by.contains(&column.name) {
                    let name = column.name.clone();
                    partition_key(Expr::Column(column)).alias(name)
                } else {
                    Expr::Column(column)
                }
            })
            .collect();

        Ok(self.dataframe.clone().select(exprs)?)
    }
}

impl SparkifySession {
    /// Returns a [DataFrameWriter] for `dataframe`
    pub fn write(&self, dataframe: DataFrame) -> DataFrameWriter {
        DataFrameWriter::new(self.clone(), dataframe)
    }
}

async fn has_objects(store: &Arc<dyn ObjectStore>, prefix: &Path) -> Result<bool, EtlError> {
    match store.list(Some(prefix)).next().await {
        Some(Ok(_)) => Ok(true),
        Some(Err(object_store::Error::NotFound { .. })) | None => Ok(false),
        Some(Err(e)) => Err(e.into()),
    }
}

async fn delete_prefix(store: &Arc<dyn ObjectStore>, prefix: &Path) -> Result<usize, EtlError> {
    let locations = store
        .list(Some(prefix))
        .map_ok(|meta| meta.location)
        .boxed();

    let deleted: Vec<Path> = store.delete_stream(locations).try_collect().await?;

    Ok(deleted.len())
}

/// Sums the `count` column the engine returns from a write
fn rows_written(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter_map(|count| count.as_primitive_opt::<UInt64Type>())
        .flat_map(|count| count.iter().flatten())
        .sum()
}
