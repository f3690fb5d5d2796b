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

//! Song pipeline: the song catalog into the `songs` and `artists` relations

use datafusion::dataframe::DataFrame;
use datafusion::prelude::col;
use tracing::{debug, info};

use crate::errors::EtlError;
use crate::etl::{write_table, TableWrite};
use crate::readwriter::{JsonOptions, ParquetWriteOptions};
use crate::schema::{song_schema, Table};
use crate::session::SparkifySession;
use crate::storage::StorageLocation;
use crate::types::SparkDataType;

/// Projects the `songs` relation, one row per song record
pub fn songs_table(songs: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(songs.select_columns(Table::Songs.columns())?)
}

/// Projects the `artists` relation, one row per song record
pub fn artists_table(songs: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(songs.select(vec![
        col("artist_id"),
        col("artist_name").alias("name"),
        col("artist_location").alias("location"),
        col("artist_latitude").alias("latitude"),
        col("artist_longitude").alias("longitude"),
    ])?)
}

/// Reads the song catalog below `song_data` and writes the `songs` and
/// `artists` artifact sets below `output`.
pub async fn process_song_data(
    session: &SparkifySession,
    song_data: &StorageLocation,
    output: &StorageLocation,
    options: &ParquetWriteOptions,
) -> Result<Vec<TableWrite>, EtlError> {
    let schema = song_schema();
    debug!(schema = %schema.json(), "song record schema");

    let songs = session
        .read()
        .json(song_data, JsonOptions::default().schema(schema))
        .await?;

    info!(location = %song_data, "processing song data");

    let songs_write = write_table(
        session,
        songs_table(songs.clone())?,
        Table::Songs,
        output,
        options,
    )
    .await?;

    let artists_write =
        write_table(session, artists_table(songs)?, Table::Artists, output, options).await?;

    Ok(vec![songs_write, artists_write])
}
