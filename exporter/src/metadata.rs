//! Descriptive metadata of a project collection.

use serde::{Deserialize, Serialize};

/// Metadata describing a collection, as recorded in iRODS.
///
/// The descriptive part is stored in the collection itself, in a `metadata.json` data object
/// written by the DataHub front end. [`bytesize`](Self::bytesize) and
/// [`numfiles`](Self::numfiles) are not part of that document; they are filled in from the
/// collection's AVUs or its listing when the metadata is read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    pub title: String,
    pub creator: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    #[serde(rename = "PID")]
    pub pid: String,
    #[serde(default)]
    pub depositor: String,
    #[serde(default, rename = "contact")]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub tissue: Option<Term>,
    #[serde(default)]
    pub technology: Option<Term>,
    #[serde(default)]
    pub organism: Option<Term>,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default)]
    pub articles: Vec<String>,
    #[serde(skip)]
    pub bytesize: u64,
    #[serde(skip)]
    pub numfiles: u64,
}

/// A contact person for a dataset.
///
/// The front end writes an empty object for contact slots the user left blank, so every field
/// is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub affiliation: String,
}

impl Contact {
    /// Whether this is a blank contact slot.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.email.is_empty()
            && self.affiliation.is_empty()
    }

    /// The contact's full name.
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A term from a controlled vocabulary, such as an ontology class.
///
/// Like contacts, blank vocabulary slots come as empty objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Term {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vocabulary: String,
    #[serde(default)]
    pub uri: String,
}

impl Term {
    /// Whether this is a blank vocabulary slot.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
