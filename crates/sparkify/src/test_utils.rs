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

//! Shared fixtures for the pipeline tests

use std::sync::Arc;

use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use url::Url;

use crate::errors::EtlError;
use crate::session::{SparkifySession, SparkifySessionBuilder};

/// One song record per file, the way the catalog is laid out upstream
pub(crate) const SONG_RECORDS: [(&str, &str); 3] = [
    (
        "song_data/A/A/A/TRAAAAW128F429D538.json",
        r#"{"num_songs": 1, "artist_id": "ARDR4AC1187FB371A1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Des'ree", "song_id": "SOMZWCG12A8C13C480", "title": "You Gotta Be", "duration": 246.30812, "year": 1994}"#,
    ),
    (
        "song_data/A/A/B/TRAABJL12903CDCF1A.json",
        r#"{"num_songs": 1, "artist_id": "AR8ZCNI1187B9A069B", "artist_latitude": 35.14968, "artist_longitude": -90.04892, "artist_location": "Memphis, TN", "artist_name": "Planet P Project", "song_id": "SOIAZJW12AB01853F1", "title": "Pink World", "duration": 269.81832, "year": 0}"#,
    ),
    (
        "song_data/A/B/A/TRABACN128F425B784.json",
        r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOQLGFP12A58A7800E", "title": "OAKtown", "duration": 259.44771, "year": null}"#,
    ),
];

/// A day of events: four song plays by two users and two other page views
pub(crate) const LOG_EVENTS: (&str, &str) = (
    "log_data/2018/11/2018-11-03-events.json",
    concat!(
        r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","lastName":"Summers","level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","page":"NextSong","sessionId":139,"song":"You Gotta Be","ts":1541207073796,"userAgent":"Mozilla/5.0","userId":"8"}"#,
        "\n",
        r#"{"artist":null,"auth":"Logged In","firstName":"Kaylee","gender":"F","lastName":"Summers","level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","page":"Home","sessionId":139,"song":null,"ts":1541207100000,"userAgent":"Mozilla/5.0","userId":"8"}"#,
        "\n",
        r#"{"artist":"Mr Oizo","auth":"Logged In","firstName":"Kaylee","gender":"F","lastName":"Summers","level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","page":"NextSong","sessionId":139,"song":"Flat 55","ts":1541207350796,"userAgent":"Mozilla/5.0","userId":"8"}"#,
        "\n",
        r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"lastName":null,"level":"paid","location":null,"page":"Login","sessionId":52,"song":null,"ts":1541207500000,"userAgent":null,"userId":""}"#,
        "\n",
        r#"{"artist":"Planet P Project","auth":"Logged In","firstName":"Lily","gender":"F","lastName":"Koch","level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","page":"NextSong","sessionId":172,"song":"Pink World","ts":1543622579796,"userAgent":"Mozilla/5.0","userId":"15"}"#,
        "\n",
        r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","lastName":"Summers","level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","page":"NextSong","sessionId":139,"song":"you gotta be","ts":1541207400796,"userAgent":"Mozilla/5.0","userId":"8"}"#,
        "\n",
    ),
);

/// Number of `NextSong` events in [LOG_EVENTS]
pub(crate) const SONG_PLAYS: usize = 4;

/// A session with an empty in-memory store registered under `mem://`
pub(crate) fn memory_session() -> (SparkifySession, Arc<dyn ObjectStore>) {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());

    let session = SparkifySessionBuilder::new()
        .app_name("sparkify-test")
        .with_object_store(&Url::parse("mem://").unwrap(), Arc::clone(&store))
        .build()
        .unwrap();

    (session, store)
}

pub(crate) async fn put(
    store: &Arc<dyn ObjectStore>,
    path: &str,
    contents: &str,
) -> Result<(), EtlError> {
    store
        .put(
            &Path::from(path),
            PutPayload::from(contents.as_bytes().to_vec()),
        )
        .await?;
    Ok(())
}

/// Writes the song catalog and event logs below `root`
pub(crate) async fn seed_input(store: &Arc<dyn ObjectStore>, root: &str) -> Result<(), EtlError> {
    for (path, record) in SONG_RECORDS {
        put(store, &format!("{root}/{path}"), record).await?;
    }

    let (path, events) = LOG_EVENTS;
    put(store, &format!("{root}/{path}"), events).await
}
