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

//! Runs the song pipeline and then the log pipeline against one session

use std::time::{Duration, Instant};

use datafusion::dataframe::DataFrame;
use tracing::info;
use uuid::Uuid;

use crate::conf::EtlConfig;
use crate::errors::EtlError;
use crate::logs::process_log_data;
use crate::readwriter::{ParquetWriteOptions, SaveMode};
use crate::schema::Table;
use crate::session::SparkifySession;
use crate::songs::process_song_data;
use crate::storage::StorageLocation;

/// One artifact set written by a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableWrite {
    pub table: Table,
    pub location: StorageLocation,
    pub rows: u64,
}

/// Outcome of a complete run
#[derive(Clone, Debug)]
pub struct EtlSummary {
    pub run_id: Uuid,
    pub output: StorageLocation,
    pub tables: Vec<TableWrite>,
    pub elapsed: Duration,
}

impl EtlSummary {
    /// Rows written for `table`
    pub fn rows(&self, table: Table) -> Option<u64> {
        self.tables
            .iter()
            .find(|write| write.table == table)
            .map(|write| write.rows)
    }
}

/// Replaces the artifact set of `table` below `output` with `df`
pub(crate) async fn write_table(
    session: &SparkifySession,
    df: DataFrame,
    table: Table,
    output: &StorageLocation,
    options: &ParquetWriteOptions,
) -> Result<TableWrite, EtlError> {
    let location = output.join(table.dir_name())?;

    let rows = session
        .write(df)
        .mode(SaveMode::Overwrite)
        .partition_by(table.partition_columns().iter().copied())
        .parquet(&location, options)
        .await?;

    info!(%table, %location, rows, "table written");

    Ok(TableWrite {
        table,
        location,
        rows,
    })
}

/// Runs the whole job: the song pipeline, then the log pipeline.
///
/// The log pipeline reads back the `songs` artifact set, so the song
/// pipeline has to be finished first. The first failure aborts the run and
/// is tagged with the pipeline it came from.
pub async fn run(session: &SparkifySession, config: &EtlConfig) -> Result<EtlSummary, EtlError> {
    let started = Instant::now();

    let song_data = config.song_data_location()?;
    let log_data = config.log_data_location()?;
    let output = config.output_location()?;

    for location in [&song_data, &log_data, &output] {
        session
            .register_storage(location)
            .map_err(|e| e.in_stage("storage setup"))?;
    }

    info!(
        run_id = %session.run_id(),
        %song_data,
        %log_data,
        %output,
        "starting etl run"
    );

    let mut tables = process_song_data(session, &song_data, &output, &config.parquet)
        .await
        .map_err(|e| e.in_stage("song pipeline"))?;

    tables.extend(
        process_log_data(session, &log_data, &output, &config.parquet)
            .await
            .map_err(|e| e.in_stage("log pipeline"))?,
    );

    let summary = EtlSummary {
        run_id: session.run_id(),
        output,
        tables,
        elapsed: started.elapsed(),
    };

    info!(
        run_id = %summary.run_id,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "etl run finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use arrow::util::pretty::pretty_format_batches;

    use crate::session::SparkifySessionBuilder;
    use crate::test_utils::{memory_session, put, seed_input, SONG_PLAYS, SONG_RECORDS};

    fn config() -> EtlConfig {
        EtlConfig::new().input("mem:///input/").output("mem:///output/")
    }

    /// Sorted rows of every artifact set, as rendered tables
    async fn snapshot(
        session: &SparkifySession,
        output: &StorageLocation,
    ) -> Result<Vec<Vec<String>>, EtlError> {
        let mut tables = vec![];

        for table in Table::ALL {
            let batches = session
                .read()
                .parquet(&output.join(table.dir_name())?, table.partition_columns())
                .await?
                .select_columns(table.columns())?
                .collect()
                .await?;

            let rendered = pretty_format_batches(&batches)?.to_string();
            let mut rows: Vec<String> = rendered.lines().map(String::from).collect();
            rows.sort();
            tables.push(rows);
        }

        Ok(tables)
    }

    #[tokio::test]
    async fn test_run_writes_every_table() -> Result<(), EtlError> {
        let (session, store) = memory_session();
        seed_input(&store, "input").await?;

        let summary = run(&session, &config()).await?;

        let songs = SONG_RECORDS.len() as u64;
        let plays = SONG_PLAYS as u64;

        assert_eq!(summary.run_id, session.run_id());
        assert_eq!(
            summary
                .tables
                .iter()
                .map(|w| (w.table, w.rows))
                .collect::<Vec<_>>(),
            vec![
                (Table::Songs, songs),
                (Table::Artists, songs),
                (Table::Users, plays),
                (Table::Time, plays),
                (Table::Songplays, plays),
            ]
        );
        assert_eq!(
            "mem:///output/time_table.parquet/",
            summary.tables[3].location.as_str()
        );

        let matched = session
            .read()
            .parquet(
                &summary.output.join(Table::Songplays.dir_name())?,
                Table::Songplays.partition_columns(),
            )
            .await?
            .filter(datafusion::prelude::col("song_id").is_not_null())?
            .count()
            .await?;

        assert_eq!(matched, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_is_idempotent() -> Result<(), EtlError> {
        let (session, store) = memory_session();
        seed_input(&store, "input").await?;
        let config = config();

        let first = run(&session, &config).await?;
        let before = snapshot(&session, &first.output).await?;

        let second = run(&session, &config).await?;
        let after = snapshot(&session, &second.output).await?;

        assert_eq!(first.rows(Table::Songplays), second.rows(Table::Songplays));
        assert_eq!(before, after);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_overwrites_local_output() -> Result<(), EtlError> {
        let (session, store) = memory_session();
        seed_input(&store, "input").await?;

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("lake");
        let stale = output.join("songs.parquet").join("stale.txt");
        fs::create_dir_all(output.join("songs.parquet"))?;
        fs::write(&stale, "left over from an earlier run")?;

        let config = EtlConfig::new()
            .input("mem:///input/")
            .output(&output.display().to_string());

        run(&session, &config).await?;
        let summary = run(&session, &config).await?;

        assert!(!stale.exists());
        for table in Table::ALL {
            assert!(output.join(table.dir_name()).is_dir(), "{table} missing");
        }
        assert_eq!(summary.rows(Table::Songs), Some(SONG_RECORDS.len() as u64));

        let songs = session
            .read()
            .parquet(
                &summary.output.join(Table::Songs.dir_name())?,
                Table::Songs.partition_columns(),
            )
            .await?
            .count()
            .await?;

        assert_eq!(songs, SONG_RECORDS.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_run_tags_failing_pipeline() -> Result<(), EtlError> {
        let (session, store) = memory_session();
        for (path, record) in SONG_RECORDS {
            put(&store, &format!("input/{path}"), record).await?;
        }

        let res = run(&session, &config()).await;

        assert!(matches!(
            res,
            Err(EtlError::Stage {
                stage: "log pipeline",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_requires_registered_memory_store() {
        let session = SparkifySessionBuilder::new().build().unwrap();

        let res = run(&session, &config()).await;

        assert!(matches!(
            res,
            Err(EtlError::Stage {
                stage: "storage setup",
                ..
            })
        ));
    }
}
