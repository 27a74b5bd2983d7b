//! In-memory instantiation of the [`Irods`](super::Irods) interface.
//!
//! Useful for testing the export pipeline in isolation from an actual iRODS server.

use super::{Avu, DataObject, Irods};
use anyhow::Error;
use async_std::sync::{Arc, Mutex};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    checksums: HashMap<String, String>,
    avus: BTreeMap<String, Vec<Avu>>,
    added: Vec<(String, Avu)>,
    removed: Vec<String>,
}

/// An in-memory iRODS zone.
///
/// Clones share the same zone.
#[derive(Clone, Debug, Default)]
pub struct MockIrods(Arc<Mutex<State>>);

impl MockIrods {
    /// Add a collection with no AVUs.
    pub fn with_collection(self, collection: impl Into<String>) -> Self {
        self.update(|state| {
            state.avus.entry(collection.into()).or_default();
        })
    }

    /// Add a data object, creating its collection if necessary.
    pub fn with_file(self, path: impl Into<String>, contents: Vec<u8>) -> Self {
        let path = path.into();
        let collection = path.rsplit_once('/').map(|(coll, _)| coll.to_string());
        self.update(|state| {
            if let Some(collection) = collection {
                state.avus.entry(collection).or_default();
            }
            state.files.insert(path, contents);
        })
    }

    /// Make iRODS report `checksum` for the object at `path`, whatever its contents.
    pub fn with_checksum(self, path: impl Into<String>, checksum: impl Into<String>) -> Self {
        self.update(|state| {
            state.checksums.insert(path.into(), checksum.into());
        })
    }

    /// Every AVU ever attached to a collection, in order.
    pub async fn added_avus(&self) -> Vec<(String, Avu)> {
        self.0.lock().await.added.clone()
    }

    /// Paths of the data objects deleted so far, in order.
    pub async fn removed(&self) -> Vec<String> {
        self.0.lock().await.removed.clone()
    }

    fn update(self, f: impl FnOnce(&mut State)) -> Self {
        {
            let mut state = self
                .0
                .try_lock()
                .expect("mock zone is configured before it is shared");
            f(&mut state);
        }
        self
    }
}

#[async_trait]
impl Irods for MockIrods {
    async fn list(&self, collection: &str) -> Result<Vec<DataObject>, Error> {
        let state = self.0.lock().await;
        if !state.avus.contains_key(collection) {
            return Err(Error::msg(format!("collection {collection} does not exist")));
        }
        let prefix = format!("{}/", collection.trim_end_matches('/'));
        Ok(state
            .files
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .map(|(path, contents)| DataObject::new(path.clone(), contents.len() as u64))
            .collect())
    }

    async fn read(&self, path: &str, offset: u64, count: usize) -> Result<Vec<u8>, Error> {
        let state = self.0.lock().await;
        let contents = state
            .files
            .get(path)
            .ok_or_else(|| Error::msg(format!("data object {path} does not exist")))?;
        let start = (offset as usize).min(contents.len());
        let end = start.saturating_add(count).min(contents.len());
        Ok(contents[start..end].to_vec())
    }

    async fn checksum(&self, path: &str) -> Result<String, Error> {
        let state = self.0.lock().await;
        if let Some(checksum) = state.checksums.get(path) {
            return Ok(checksum.clone());
        }
        let contents = state
            .files
            .get(path)
            .ok_or_else(|| Error::msg(format!("data object {path} does not exist")))?;
        Ok(format!("{:x}", Sha256::digest(contents)))
    }

    async fn avus(&self, collection: &str) -> Result<Vec<Avu>, Error> {
        self.0
            .lock()
            .await
            .avus
            .get(collection)
            .cloned()
            .ok_or_else(|| Error::msg(format!("collection {collection} does not exist")))
    }

    async fn add_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error> {
        let mut state = self.0.lock().await;
        let avus = state
            .avus
            .get_mut(collection)
            .ok_or_else(|| Error::msg(format!("collection {collection} does not exist")))?;
        if avus.contains(avu) {
            return Err(Error::msg(format!(
                "collection {collection} already has AVU {avu:?}"
            )));
        }
        avus.push(avu.clone());
        state.added.push((collection.into(), avu.clone()));
        Ok(())
    }

    async fn remove_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error> {
        let mut state = self.0.lock().await;
        let avus = state
            .avus
            .get_mut(collection)
            .ok_or_else(|| Error::msg(format!("collection {collection} does not exist")))?;
        let len = avus.len();
        avus.retain(|existing| existing != avu);
        if avus.len() == len {
            return Err(Error::msg(format!(
                "collection {collection} has no AVU {avu:?}"
            )));
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        let mut state = self.0.lock().await;
        state
            .files
            .remove(path)
            .ok_or_else(|| Error::msg(format!("data object {path} does not exist")))?;
        state.removed.push(path.into());
        Ok(())
    }
}
