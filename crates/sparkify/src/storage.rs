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

//! Storage locations for input trees and output artifact sets

use std::fmt;
use std::path::Path as FsPath;

use datafusion::execution::object_store::ObjectStoreUrl;
use object_store::path::Path;
use url::Url;

use crate::errors::EtlError;

/// Object store schemes a [StorageLocation] can point at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    S3,
    File,
    Memory,
}

/// A directory-like location on an object store.
///
/// Accepts `s3://bucket/prefix/`, `s3a://bucket/prefix/` (Hadoop style, normalised
/// to `s3://`), `file:///abs/path/`, `mem:///prefix/` and plain filesystem paths.
/// The location always carries a trailing `/` so the engine treats it as a
/// directory rather than a single file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLocation {
    url: Url,
    scheme: Scheme,
}

impl StorageLocation {
    /// Parse and validate a location string
    pub fn parse(location: &str) -> Result<StorageLocation, EtlError> {
        let location = location.trim();

        if location.is_empty() {
            return Err(EtlError::InvalidStorageLocation(
                "The storage location must not be empty".to_string(),
            ));
        }

        let url = match Url::parse(location) {
            Ok(url) if url.scheme().len() > 1 => url,
            // bare paths, including windows drive letters parsed as a scheme
            _ => return StorageLocation::from_path(location),
        };

        StorageLocation::from_url(url)
    }

    fn from_path(path: &str) -> Result<StorageLocation, EtlError> {
        let path = FsPath::new(path);

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let url = Url::from_directory_path(&absolute).map_err(|_| {
            EtlError::InvalidStorageLocation(format!(
                "Failed to convert '{}' into a file URL",
                absolute.display()
            ))
        })?;

        StorageLocation::from_url(url)
    }

    fn from_url(mut url: Url) -> Result<StorageLocation, EtlError> {
        let scheme = match url.scheme() {
            "s3" | "s3a" => Scheme::S3,
            "file" => Scheme::File,
            "mem" => Scheme::Memory,
            other => {
                return Err(EtlError::InvalidStorageLocation(format!(
                    "Unsupported scheme '{other}'. Use one of 's3://', 's3a://', 'file://' or 'mem://'"
                )))
            }
        };

        // hadoop's s3a connector and object_store address the same buckets
        if url.scheme() == "s3a" && url.set_scheme("s3").is_err() {
            return Err(EtlError::InvalidStorageLocation(format!(
                "Failed to rewrite '{url}' to the 's3://' scheme"
            )));
        }

        if scheme == Scheme::S3 && url.host_str().map_or(true, str::is_empty) {
            return Err(EtlError::InvalidStorageLocation(
                "The bucket must not be empty. Please update the location to follow the correct format, e.g., 's3://bucket/prefix/'".to_string(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        url.set_query(None);
        url.set_fragment(None);

        Ok(StorageLocation { url, scheme })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Bucket name for S3 locations
    pub fn bucket(&self) -> Option<&str> {
        match self.scheme {
            Scheme::S3 => self.url.host_str(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Location of a child directory
    pub fn join(&self, name: &str) -> Result<StorageLocation, EtlError> {
        let name = name.trim_start_matches('/');
        let child = self.url.join(name)?;
        StorageLocation::from_url(child)
    }

    /// The `scheme://authority` part the object store is registered under
    pub fn object_store_url(&self) -> Result<ObjectStoreUrl, EtlError> {
        let authority = self.url.host_str().unwrap_or_default();
        Ok(ObjectStoreUrl::parse(format!(
            "{}://{}",
            self.url.scheme(),
            authority
        ))?)
    }

    /// Path of this location inside its object store
    pub fn prefix(&self) -> Result<Path, EtlError> {
        Ok(Path::from_url_path(self.url.path())?)
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl From<object_store::path::Error> for EtlError {
    fn from(value: object_store::path::Error) -> Self {
        EtlError::InvalidStorageLocation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3a_is_normalised() {
        let location = StorageLocation::parse("s3a://udacity-dend/").unwrap();

        assert_eq!("s3://udacity-dend/", location.as_str());
        assert_eq!(Scheme::S3, location.scheme());
        assert_eq!(Some("udacity-dend"), location.bucket());
    }

    #[test]
    fn test_s3a_keeps_prefix() {
        let location = StorageLocation::parse("s3a://udacity-dend/log_data?versionId=1").unwrap();

        assert_eq!("s3://udacity-dend/log_data/", location.as_str());
        assert_eq!("log_data", location.prefix().unwrap().to_string());
    }

    #[test]
    fn test_trailing_slash_added() {
        let location = StorageLocation::parse("s3://bucket/sparkify").unwrap();

        assert_eq!("s3://bucket/sparkify/", location.as_str());
    }

    #[test]
    fn test_join_child_directory() {
        let output = StorageLocation::parse("s3://bucket/sparkify/").unwrap();

        let songs = output.join("songs.parquet").unwrap();

        assert_eq!("s3://bucket/sparkify/songs.parquet/", songs.as_str());
        assert_eq!("sparkify/songs.parquet", songs.prefix().unwrap().to_string());
        assert_eq!("s3://bucket/", songs.object_store_url().unwrap().as_str());
    }

    #[test]
    fn test_memory_location() {
        let location = StorageLocation::parse("mem:///input/").unwrap();

        assert_eq!(Scheme::Memory, location.scheme());
        assert_eq!(None, location.bucket());
        assert_eq!("input", location.prefix().unwrap().to_string());
        assert_eq!("mem:///", location.object_store_url().unwrap().as_str());
    }

    #[test]
    fn test_relative_path_is_absolute_file_url() {
        let location = StorageLocation::parse("./sparkify-output").unwrap();

        assert_eq!(Scheme::File, location.scheme());
        assert!(location.as_str().starts_with("file:///"));
        assert!(location.as_str().ends_with("/sparkify-output/"));
    }

    #[test]
    fn test_panic_missing_bucket() {
        assert!(StorageLocation::parse("s3:///prefix/").is_err())
    }

    #[test]
    fn test_panic_unsupported_scheme() {
        assert!(StorageLocation::parse("hdfs://namenode/data/").is_err())
    }

    #[test]
    fn test_panic_empty_location() {
        assert!(StorageLocation::parse("  ").is_err())
    }
}
