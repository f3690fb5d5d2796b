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

//! Declared input schema and the output relations of the star schema

use std::fmt;

use crate::types::{DataType, StructField, StructType};

/// Page value marking a log event as a song play
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Schema of a raw song metadata record.
///
/// Field names and types must match the upstream JSON producer exactly.
/// Drift shows up as null columns or read failures, it is not validated here.
pub fn song_schema() -> StructType {
    StructType::new(vec![
        StructField::new("num_songs", DataType::Integer, None),
        StructField::new("artist_id", DataType::String, None),
        StructField::new("artist_latitude", DataType::Double, None),
        StructField::new("artist_longitude", DataType::Double, None),
        StructField::new("artist_location", DataType::String, None),
        StructField::new("artist_name", DataType::String, None),
        StructField::new("song_id", DataType::String, None),
        StructField::new("title", DataType::String, None),
        StructField::new("duration", DataType::Double, None),
        StructField::new("year", DataType::Integer, None),
    ])
}

/// The relations written by the job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Songs,
        Table::Artists,
        Table::Users,
        Table::Time,
        Table::Songplays,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Users => "users",
            Table::Time => "time",
            Table::Songplays => "songplays",
        }
    }

    /// Directory of the artifact set below the output root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Table::Songs => "songs.parquet",
            Table::Artists => "artists.parquet",
            Table::Users => "users.parquet",
            Table::Time => "time_table.parquet",
            Table::Songplays => "songplays.parquet",
        }
    }

    /// Output columns, partition columns included, in projection order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Table::Songs => &["song_id", "title", "artist_id", "year", "duration"],
            Table::Artists => &["artist_id", "name", "location", "latitude", "longitude"],
            Table::Users => &["user_id", "first_name", "last_name", "gender", "level"],
            Table::Time => &[
                "start_time",
                "hour",
                "day",
                "week",
                "month",
                "year",
                "weekday",
            ],
            Table::Songplays => &[
                "start_time",
                "userId",
                "level",
                "song_id",
                "artist_id",
                "sessionId",
                "location",
                "userAgent",
                "year",
                "month",
            ],
        }
    }

    pub fn partition_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Songs => &["year", "artist_id"],
            Table::Artists | Table::Users => &[],
            Table::Time | Table::Songplays => &["year", "month"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
