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

//! Log pipeline: event logs into the `users`, `time` and `songplays` relations

use arrow::datatypes::DataType;
use datafusion::common::Column;
use datafusion::dataframe::DataFrame;
use datafusion::logical_expr::{cast, ident, Expr, JoinType};
use datafusion::prelude::{col, lit};
use tracing::{debug, info};

use crate::errors::EtlError;
use crate::etl::{write_table, TableWrite};
use crate::functions::{
    dayofmonth, dayofweek, hour, month, timestamp_from_millis, weekofyear, year,
};
use crate::readwriter::{JsonOptions, ParquetWriteOptions};
use crate::schema::{Table, NEXT_SONG_PAGE};
use crate::session::SparkifySession;
use crate::storage::StorageLocation;

/// Keeps the events that record a song being played.
///
/// Events without a `page` are dropped as well.
pub fn song_plays(events: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(events.filter(col("page").eq(lit(NEXT_SONG_PAGE)))?)
}

/// Projects the `users` relation.
///
/// There is one row per event, a user playing N songs shows up N times.
pub fn users_table(events: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(events.select(vec![
        ident("userId").alias("user_id"),
        ident("firstName").alias("first_name"),
        ident("lastName").alias("last_name"),
        col("gender"),
        col("level"),
    ])?)
}

/// Adds `start_time`, the event's epoch milliseconds `ts` as a timestamp
pub fn with_start_time(events: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(events.with_column("start_time", timestamp_from_millis(col("ts")))?)
}

/// Breaks `start_time` down into calendar fields, one row per event
pub fn time_table(events: DataFrame) -> Result<DataFrame, EtlError> {
    Ok(events.select(vec![
        col("start_time"),
        hour(col("start_time")).alias("hour"),
        dayofmonth(col("start_time")).alias("day"),
        weekofyear(col("start_time")).alias("week"),
        month(col("start_time")).alias("month"),
        year(col("start_time")).alias("year"),
        dayofweek(col("start_time")).alias("weekday"),
    ])?)
}

/// Reads back the `songs` artifact set written below `output`
pub async fn read_songs(
    session: &SparkifySession,
    output: &StorageLocation,
) -> Result<DataFrame, EtlError> {
    let location = output.join(Table::Songs.dir_name())?;

    session
        .read()
        .parquet(&location, Table::Songs.partition_columns())
        .await
}

/// A column of `relation`, taken verbatim so camelCase event fields keep their case
fn column_of(relation: &str, name: &str) -> Expr {
    Expr::Column(Column::new(Some(relation), name))
}

/// Projects the `songplays` relation from events carrying `start_time`.
///
/// Events are matched to the catalog by exact, case-sensitive equality of the
/// free-text `song` field and the song title. This is lossy: any difference in
/// spelling leaves `song_id` and `artist_id` null, and a title shared by several
/// catalog songs yields one row per catalog song. No event is dropped.
pub fn songplays_table(events: DataFrame, songs: DataFrame) -> Result<DataFrame, EtlError> {
    // parquet may hand strings back as views
    let songs = songs
        .select(vec![
            cast(col("title"), DataType::Utf8).alias("title"),
            cast(col("song_id"), DataType::Utf8).alias("song_id"),
            cast(col("artist_id"), DataType::Utf8).alias("artist_id"),
        ])?
        .alias("songs")?;

    let plays = events.alias("events")?.join_on(
        songs,
        JoinType::Left,
        [column_of("events", "song").eq(column_of("songs", "title"))],
    )?;

    Ok(plays.select(vec![
        column_of("events", "start_time").alias("start_time"),
        column_of("events", "userId").alias("userId"),
        column_of("events", "level").alias("level"),
        column_of("songs", "song_id").alias("song_id"),
        column_of("songs", "artist_id").alias("artist_id"),
        column_of("events", "sessionId").alias("sessionId"),
        column_of("events", "location").alias("location"),
        column_of("events", "userAgent").alias("userAgent"),
        year(column_of("events", "start_time")).alias("year"),
        month(column_of("events", "start_time")).alias("month"),
    ])?)
}

/// Reads the event logs below `log_data` and writes the `users`, `time` and
/// `songplays` artifact sets below `output`.
///
/// The `songs` artifact set must already be in `output`.
pub async fn process_log_data(
    session: &SparkifySession,
    log_data: &StorageLocation,
    output: &StorageLocation,
    options: &ParquetWriteOptions,
) -> Result<Vec<TableWrite>, EtlError> {
    let events = session
        .read()
        .json(log_data, JsonOptions::default())
        .await?;

    debug!(schema = %events.schema(), "inferred log event schema");
    info!(location = %log_data, "processing log data");

    let plays = song_plays(events)?;

    let users = write_table(
        session,
        users_table(plays.clone())?,
        Table::Users,
        output,
        options,
    )
    .await?;

    // time and songplays share one start_time derivation
    let plays = with_start_time(plays)?.cache().await?;

    let time = write_table(
        session,
        time_table(plays.clone())?,
        Table::Time,
        output,
        options,
    )
    .await?;

    let songs = read_songs(session, output).await?;

    let songplays = write_table(
        session,
        songplays_table(plays, songs)?,
        Table::Songplays,
        output,
        options,
    )
    .await?;

    Ok(vec![users, time, songplays])
}
