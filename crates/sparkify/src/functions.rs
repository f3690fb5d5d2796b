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

//! Spark-named column functions expressed as DataFusion expressions

use arrow::datatypes::{DataType, TimeUnit};
use datafusion::functions::expr_fn::{coalesce, date_part, nullif};
use datafusion::logical_expr::{cast, lit, Expr};

/// Directory value Hive uses for a null partition key
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

macro_rules! gen_date_func {
    ($func_name:ident, $part:literal, $doc:expr) => {
        #[doc = $doc]
        pub fn $func_name(col: Expr) -> Expr {
            cast(date_part(lit($part), col), DataType::Int32)
        }
    };
}

// Datetime Functions

gen_date_func!(hour, "hour", "Extract the hours of a given timestamp as integer.");
gen_date_func!(dayofmonth, "day", "Extract the day of the month of a given timestamp as integer.");
gen_date_func!(weekofyear, "week", "Extract the ISO 8601 week number of a given timestamp as integer.");
gen_date_func!(month, "month", "Extract the month of a given timestamp as integer.");
gen_date_func!(year, "year", "Extract the year of a given timestamp as integer.");

/// Extract the day of the week of a given timestamp as integer.
///
/// Ranges from 1 for a Sunday through to 7 for a Saturday.
pub fn dayofweek(col: Expr) -> Expr {
    cast(date_part(lit("dow"), col), DataType::Int32) + lit(1_i32)
}

/// Converts an integer count of milliseconds since the Unix epoch into a
/// timestamp without time zone, read as UTC.
pub fn timestamp_from_millis(col: Expr) -> Expr {
    cast(
        cast(col, DataType::Int64),
        DataType::Timestamp(TimeUnit::Millisecond, None),
    )
}

/// Renders a value as the directory value of a Hive partition.
///
/// Nulls map onto [HIVE_DEFAULT_PARTITION].
pub fn partition_key(col: Expr) -> Expr {
    coalesce(vec![cast(col, DataType::Utf8), lit(HIVE_DEFAULT_PARTITION)])
}

/// Inverse of [partition_key] for a partition column read back from storage.
pub fn restore_partition_key(col: Expr) -> Expr {
    nullif(col, lit(HIVE_DEFAULT_PARTITION))
}

#[cfg(test)]
mod tests {
    use super::*;

    use datafusion::assert_batches_eq;
    use datafusion::prelude::{col, SessionContext};

    use crate::errors::EtlError;

    async fn setup() -> SessionContext {
        SessionContext::new()
    }

    #[tokio::test]
    async fn test_func_calendar_parts() -> Result<(), EtlError> {
        let ctx = setup().await;

        let df = ctx
            .sql("SELECT CAST(1541207073796 AS BIGINT) AS ts")
            .await?
            .with_column("start_time", timestamp_from_millis(col("ts")))?;

        let res = df
            .select(vec![
                col("start_time"),
                hour(col("start_time")).alias("hour"),
                dayofmonth(col("start_time")).alias("day"),
                weekofyear(col("start_time")).alias("week"),
                month(col("start_time")).alias("month"),
                year(col("start_time")).alias("year"),
                dayofweek(col("start_time")).alias("weekday"),
            ])?
            .collect()
            .await?;

        #[rustfmt::skip]
        let expected = [
            "+-------------------------+------+-----+------+-------+------+---------+",
            "| start_time              | hour | day | week | month | year | weekday |",
            "+-------------------------+------+-----+------+-------+------+---------+",
            "| 2018-11-03T01:04:33.796 | 1    | 3   | 44   | 11    | 2018 | 7       |",
            "+-------------------------+------+-----+------+-------+------+---------+",
        ];
        assert_batches_eq!(expected, &res);
        Ok(())
    }

    #[tokio::test]
    async fn test_func_dayofweek_sunday_is_one() -> Result<(), EtlError> {
        let ctx = setup().await;

        // 2018-11-04 is a Sunday
        let df = ctx
            .sql("SELECT CAST(1541289600000 AS BIGINT) AS ts")
            .await?
            .select(vec![
                dayofweek(timestamp_from_millis(col("ts"))).alias("weekday")
            ])?;

        let res = df.collect().await?;

        #[rustfmt::skip]
        let expected = [
            "+---------+",
            "| weekday |",
            "+---------+",
            "| 1       |",
            "+---------+",
        ];
        assert_batches_eq!(expected, &res);
        Ok(())
    }

    #[tokio::test]
    async fn test_func_partition_key_round_trip_null() -> Result<(), EtlError> {
        let ctx = setup().await;

        let df = ctx
            .sql("SELECT CAST(NULL AS INT) AS year UNION ALL SELECT 2018")
            .await?
            .select(vec![partition_key(col("year")).alias("year")])?
            .sort(vec![col("year").sort(true, true)])?;

        let keys = df.clone().collect().await?;

        #[rustfmt::skip]
        let expected = [
            "+----------------------------+",
            "| year                       |",
            "+----------------------------+",
            "| 2018                       |",
            "| __HIVE_DEFAULT_PARTITION__ |",
            "+----------------------------+",
        ];
        assert_batches_eq!(expected, &keys);

        let restored = df
            .select(vec![restore_partition_key(col("year")).alias("year")])?
            .filter(col("year").is_null())?
            .count()
            .await?;

        assert_eq!(restored, 1);
        Ok(())
    }
}
