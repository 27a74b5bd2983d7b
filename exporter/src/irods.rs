//! Facilities for reading collections from iRODS and reporting on them.

use crate::metadata::CollectionMetadata;
use anyhow::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod client;
#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use client::{Client, Options};

/// The number of bytes requested from iRODS in a single read.
pub const BLOCK_SIZE: usize = 1024 * 8192;

/// The data object in each collection holding its descriptive metadata.
pub const METADATA_FILE: &str = "metadata.json";

/// Collection AVU caching the total size of the collection, in bytes.
pub const BYTESIZE_ATTRIBUTE: &str = "dcat:byteSize";

/// Collection AVU caching the number of files in the collection.
pub const NUMFILES_ATTRIBUTE: &str = "numFiles";

/// An iRODS client.
#[async_trait]
pub trait Irods: Send + Sync {
    /// List all data objects in `collection` and its sub-collections.
    async fn list(&self, collection: &str) -> Result<Vec<DataObject>, Error>;

    /// Read up to `count` bytes of the data object at `path`, starting at `offset`.
    ///
    /// Fewer than `count` bytes are returned only at the end of the object.
    async fn read(&self, path: &str, offset: u64, count: usize) -> Result<Vec<u8>, Error>;

    /// The SHA-256 checksum of the data object at `path`, as a lowercase hex string.
    ///
    /// The checksum is computed by the iRODS server from the stored replica.
    async fn checksum(&self, path: &str) -> Result<String, Error>;

    /// The AVUs attached to a collection.
    async fn avus(&self, collection: &str) -> Result<Vec<Avu>, Error>;

    /// Attach an AVU to a collection.
    async fn add_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error>;

    /// Detach an AVU from a collection.
    async fn remove_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error>;

    /// Delete the data object at `path`.
    async fn remove(&self, path: &str) -> Result<(), Error>;

    /// Read the full contents of the data object at `path`.
    async fn read_all(&self, path: &str) -> Result<Vec<u8>, Error> {
        let mut bytes = vec![];
        loop {
            let chunk = self.read(path, bytes.len() as u64, BLOCK_SIZE).await?;
            let done = chunk.len() < BLOCK_SIZE;
            bytes.extend(chunk);
            if done {
                return Ok(bytes);
            }
        }
    }

    /// Read the descriptive metadata of `collection`.
    async fn read_metadata(&self, collection: &str) -> Result<CollectionMetadata, Error> {
        let path = format!("{collection}/{METADATA_FILE}");
        let bytes = self.read_all(&path).await?;
        let mut md: CollectionMetadata = serde_json::from_slice(&bytes)
            .map_err(|err| Error::msg(format!("metadata file {path} is malformed: {err}")))?;

        let avus = self.avus(collection).await?;
        let cached = |attribute: &str| {
            avus.iter()
                .find(|avu| avu.attribute == attribute)
                .and_then(|avu| avu.value.parse::<u64>().ok())
        };
        match (cached(BYTESIZE_ATTRIBUTE), cached(NUMFILES_ATTRIBUTE)) {
            (Some(bytesize), Some(numfiles)) => {
                md.bytesize = bytesize;
                md.numfiles = numfiles;
            }
            _ => {
                tracing::debug!("collection {collection} has no cached size, listing it");
                let objects = self.list(collection).await?;
                md.bytesize = objects.iter().map(|obj| obj.size).sum();
                md.numfiles = objects.len() as u64;
            }
        }
        Ok(md)
    }
}

/// A data object (file) in iRODS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataObject {
    /// Absolute logical path of the object.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

impl DataObject {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// The last component of the path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The path of this object relative to `collection`.
    ///
    /// If the object is not inside `collection`, the absolute path is returned.
    pub fn relative_path(&self, collection: &str) -> &str {
        self.path
            .strip_prefix(collection.trim_end_matches('/'))
            .and_then(|path| path.strip_prefix('/'))
            .unwrap_or(&self.path)
    }
}

/// An attribute-value-unit metadata triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Avu {
    pub attribute: String,
    pub value: String,
    #[serde(default)]
    pub unit: String,
}

impl Avu {
    /// An AVU without a unit.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_unit(attribute, value, "")
    }

    pub fn with_unit(
        attribute: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            unit: unit.into(),
        }
    }
}
