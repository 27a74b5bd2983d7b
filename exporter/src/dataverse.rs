//! Facilities for depositing datasets in Dataverse.

use anyhow::Error;
use async_trait::async_trait;
use futures::io::AsyncBufRead;
use serde_json::Value;

mod client;
#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use client::{Client, Options};

/// The contents of a file to upload.
pub type Upload = Box<dyn AsyncBufRead + Unpin + Send + Sync>;

/// A Dataverse client.
#[async_trait]
pub trait Dataverse: Send + Sync {
    /// Create a draft dataset in the Dataverse collection `alias`.
    ///
    /// `dataset` is the JSON description of the dataset, including its citation metadata.
    ///
    /// # Returns
    ///
    /// The persistent identifier of the new dataset.
    async fn create_dataset(&self, alias: &str, dataset: &Value) -> Result<String, Error>;

    /// Add a file of `len` bytes named `name` to the dataset `pid`.
    ///
    /// If `restrict` is set, access to the file is restricted.
    ///
    /// # Returns
    ///
    /// The MD5 checksum Dataverse computed for the stored file, in hex.
    async fn add_file(
        &self,
        pid: &str,
        name: &str,
        contents: Upload,
        len: u64,
        restrict: bool,
    ) -> Result<String, Error>;

    /// Submit the dataset `pid` for review by the curators of its collection.
    async fn submit_for_review(&self, pid: &str) -> Result<(), Error>;

    /// The URL at which users can view the draft of dataset `pid`.
    fn dataset_url(&self, pid: &str) -> String;
}
