//! Export progress, as reported on the exported collection.
//!
//! While an export is running, the collection carries an AVU
//! ```text
//! exporterState = <repository>:<state>
//! ```
//! which the DataHub front end polls to show progress to the user. Each step of the export
//! replaces the AVU for the previous state with the AVU for the next one.

use crate::irods::{Avu, Irods};
use anyhow::Error;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The attribute of progress AVUs.
pub const ATTRIBUTE: &str = "exporterState";

/// The attribute under which the persistent identifier of a finished export is recorded.
pub const EXTERNAL_PID: &str = "externalPID";

/// A repository we can export to.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter, EnumString, Deserialize, Serialize,
)]
pub enum Repository {
    Dataverse,
    #[strum(serialize = "EASY")]
    #[serde(rename = "EASY")]
    Easy,
}

/// A step in the progress of an export.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ExporterState {
    CreateExporter,
    CreateDataset,
    CreateDatasetFailed,
    DatasetUnknown,
    PrepareCollection,
    ZipCollection,
    UploadZippedCollection,
    ValidateChecksum,
    ValidateUpload,
    UploadCorrupted,
    UploadFailed,
    Finalize,
    Exported,
}

impl ExporterState {
    /// The AVU recording that an export to `repository` is in this state.
    pub fn avu(&self, repository: Repository) -> Avu {
        Avu::new(ATTRIBUTE, format!("{repository}:{self}"))
    }
}

/// Progress reporting for one export of one collection.
pub struct Progress<'a, I> {
    irods: &'a I,
    collection: String,
    repository: Repository,
}

impl<'a, I: Irods> Progress<'a, I> {
    pub fn new(irods: &'a I, collection: impl Into<String>, repository: Repository) -> Self {
        Self {
            irods,
            collection: collection.into(),
            repository,
        }
    }

    /// Move from state `old` to state `new`.
    ///
    /// It is not an error if the collection is not currently in state `old`.
    pub async fn update(&self, old: ExporterState, new: ExporterState) -> Result<(), Error> {
        tracing::debug!(collection = %self.collection, "{old} -> {new}");
        let old = old.avu(self.repository);
        if self.has(&old).await? {
            self.irods.remove_avu(&self.collection, &old).await?;
        }
        self.irods
            .add_avu(&self.collection, &new.avu(self.repository))
            .await
    }

    /// Remove the AVU for `state`, if present.
    pub async fn clear(&self, state: ExporterState) -> Result<(), Error> {
        let avu = state.avu(self.repository);
        if self.has(&avu).await? {
            self.irods.remove_avu(&self.collection, &avu).await?;
        }
        Ok(())
    }

    /// Remove every progress AVU of this repository from the collection.
    pub async fn cleanup(&self) -> Result<(), Error> {
        let prefix = format!("{}:", self.repository);
        for avu in self.irods.avus(&self.collection).await? {
            if avu.attribute == ATTRIBUTE && avu.value.starts_with(&prefix) {
                tracing::info!(collection = %self.collection, "removing {}", avu.value);
                self.irods.remove_avu(&self.collection, &avu).await?;
            }
        }
        Ok(())
    }

    async fn has(&self, avu: &Avu) -> Result<bool, Error> {
        Ok(self.irods.avus(&self.collection).await?.contains(avu))
    }
}
