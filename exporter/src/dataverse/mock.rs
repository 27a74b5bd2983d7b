//! In-memory instantiation of the [`Dataverse`](super::Dataverse) interface.

use super::{Dataverse, Upload};
use anyhow::Error;
use async_std::sync::{Arc, Mutex};
use async_trait::async_trait;
use futures::io::AsyncReadExt;
use md5::{Digest, Md5};
use serde_json::Value;

/// A file deposited in the mock Dataverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deposit {
    pub pid: String,
    pub name: String,
    pub contents: Vec<u8>,
    pub restrict: bool,
}

#[derive(Debug, Default)]
struct State {
    datasets: Vec<(String, Value)>,
    deposits: Vec<Deposit>,
    reviews: Vec<String>,
    reject_datasets: bool,
    reject_files: bool,
    corrupt_files: bool,
    reject_reviews: bool,
}

/// An in-memory Dataverse.
///
/// Clones share the same installation.
#[derive(Clone, Debug, Default)]
pub struct MockDataverse(Arc<Mutex<State>>);

impl MockDataverse {
    /// Fail every dataset creation.
    pub fn rejecting_datasets(self) -> Self {
        self.update(|state| state.reject_datasets = true)
    }

    /// Fail every file upload.
    pub fn rejecting_files(self) -> Self {
        self.update(|state| state.reject_files = true)
    }

    /// Report a wrong checksum for every uploaded file.
    pub fn corrupting_files(self) -> Self {
        self.update(|state| state.corrupt_files = true)
    }

    /// Fail every submission for review.
    pub fn rejecting_reviews(self) -> Self {
        self.update(|state| state.reject_reviews = true)
    }

    /// Datasets created so far, with their aliases.
    pub async fn datasets(&self) -> Vec<(String, Value)> {
        self.0.lock().await.datasets.clone()
    }

    /// Files deposited so far.
    pub async fn deposits(&self) -> Vec<Deposit> {
        self.0.lock().await.deposits.clone()
    }

    /// Datasets submitted for review so far.
    pub async fn reviews(&self) -> Vec<String> {
        self.0.lock().await.reviews.clone()
    }

    fn update(self, f: impl FnOnce(&mut State)) -> Self {
        {
            let mut state = self
                .0
                .try_lock()
                .expect("mock Dataverse is configured before it is shared");
            f(&mut state);
        }
        self
    }
}

#[async_trait]
impl Dataverse for MockDataverse {
    async fn create_dataset(&self, alias: &str, dataset: &Value) -> Result<String, Error> {
        let mut state = self.0.lock().await;
        if state.reject_datasets {
            return Err(Error::msg("Dataverse responded 400 Bad Request"));
        }
        state.datasets.push((alias.into(), dataset.clone()));
        Ok(format!("doi:10.5072/FK2/{:06}", state.datasets.len()))
    }

    async fn add_file(
        &self,
        pid: &str,
        name: &str,
        mut contents: Upload,
        len: u64,
        restrict: bool,
    ) -> Result<String, Error> {
        let mut bytes = vec![];
        contents.read_to_end(&mut bytes).await?;
        if bytes.len() as u64 != len {
            return Err(Error::msg(format!(
                "upload announced {len} bytes but sent {}",
                bytes.len()
            )));
        }

        let mut state = self.0.lock().await;
        if state.reject_files {
            return Err(Error::msg("Dataverse responded 500 Internal Server Error"));
        }
        let md5 = if state.corrupt_files {
            format!("{:x}", Md5::digest(b"corrupted"))
        } else {
            format!("{:x}", Md5::digest(&bytes))
        };
        state.deposits.push(Deposit {
            pid: pid.into(),
            name: name.into(),
            contents: bytes,
            restrict,
        });
        Ok(md5)
    }

    async fn submit_for_review(&self, pid: &str) -> Result<(), Error> {
        let mut state = self.0.lock().await;
        if state.reject_reviews {
            return Err(Error::msg("Dataverse responded 403 Forbidden"));
        }
        state.reviews.push(pid.into());
        Ok(())
    }

    fn dataset_url(&self, pid: &str) -> String {
        format!("https://dataverse.test/dataset.xhtml?persistentId={pid}&version=DRAFT")
    }
}
