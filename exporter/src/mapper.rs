//! Mapping of collection metadata onto a Dataverse dataset.
//!
//! Dataverse describes a dataset as a list of citation fields, each of the form
//! ```json
//! {
//!     "typeName": "title",
//!     "multiple": false,
//!     "typeClass": "primitive",
//!     "value": "..."
//! }
//! ```
//! where `"value"` is a string for primitive fields, and a list of objects mapping sub-field names
//! to primitive fields for compound fields.

use crate::metadata::{CollectionMetadata, Contact, Term};
use anyhow::Error;
use serde_json::{json, Map, Value};

/// The skeleton of every dataset we create.
const TEMPLATE: &str = include_str!("template.json");

/// The only subject we deposit under.
pub const SUBJECT: &str = "Medicine, Health and Life Sciences";

/// Build the JSON document for creating a dataset from `md`.
pub fn map_dataset(md: &CollectionMetadata) -> Result<Value, Error> {
    let mut dataset: Value = serde_json::from_str(TEMPLATE)?;
    let version = dataset
        .get_mut("datasetVersion")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| Error::msg("dataset template has no datasetVersion"))?;

    tracing::info!("mapping metadata of {}", md.pid);
    let (authority, identifier) = split_pid(&md.pid)?;
    version.insert("protocol".into(), "hdl".into());
    version.insert("authority".into(), authority.into());
    version.insert("identifier".into(), identifier.into());

    let mut fields = vec![
        compound("author", [[("authorName", primitive(&md.creator))]]),
        compound(
            "dsDescription",
            [[(
                "dsDescriptionValue",
                primitive(md.description.as_deref().unwrap_or_default()),
            )]],
        ),
        field("productionDate", false, "primitive", md.date.as_str()),
        field("title", false, "primitive", md.title.as_str()),
        field("subject", true, "controlledVocabulary", json!([SUBJECT])),
    ];

    let mut contacts = vec![vec![("datasetContactEmail", primitive(&md.creator))]];
    contacts.extend(
        md.contacts
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| Vec::from(contact(c))),
    );
    fields.push(compound("datasetContact", contacts));

    let keywords = [&md.tissue, &md.technology, &md.organism]
        .into_iter()
        .flatten()
        .filter(|term| !term.is_empty())
        .map(keyword)
        .chain(md.factors.iter().map(|factor| {
            keyword(&Term {
                name: factor.clone(),
                ..Default::default()
            })
        }))
        .collect::<Vec<_>>();
    fields.push(compound("keyword", keywords));

    let publications = md
        .articles
        .iter()
        .filter_map(|url| match publication(url) {
            Some(publication) => Some(publication),
            None => {
                tracing::warn!("article {url} is not a recognizable publication URL, skipping");
                None
            }
        })
        .collect::<Vec<_>>();
    fields.push(compound("publication", publications));

    *citation_fields(version)? = fields;
    Ok(dataset)
}

/// Split a handle into its authority and identifier.
pub fn split_pid(pid: &str) -> Result<(&str, &str), Error> {
    pid.split_once('/')
        .ok_or_else(|| Error::msg(format!("PID {pid} is not of the form authority/identifier")))
}

fn citation_fields(version: &mut Map<String, Value>) -> Result<&mut Vec<Value>, Error> {
    version
        .get_mut("metadataBlocks")
        .and_then(|blocks| blocks.get_mut("citation"))
        .and_then(|citation| citation.get_mut("fields"))
        .and_then(Value::as_array_mut)
        .ok_or_else(|| Error::msg("dataset template has no citation fields"))
}

fn field(type_name: &str, multiple: bool, type_class: &str, value: impl Into<Value>) -> Value {
    json!({
        "typeName": type_name,
        "multiple": multiple,
        "typeClass": type_class,
        "value": value.into(),
    })
}

fn primitive(value: &str) -> Value {
    field("", false, "primitive", value)
}

/// A compound field with one entry per element of `entries`.
///
/// Sub-fields are given without their `typeName`, which is filled in from their key.
fn compound<E, I>(type_name: &str, entries: E) -> Value
where
    E: IntoIterator<Item = I>,
    I: IntoIterator<Item = (&'static str, Value)>,
{
    let entries = entries.into_iter().map(entry).collect::<Vec<_>>();
    field(type_name, true, "compound", entries)
}

fn entry(subfields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    Value::Object(
        subfields
            .into_iter()
            .map(|(name, mut subfield)| {
                subfield["typeName"] = name.into();
                (name.to_string(), subfield)
            })
            .collect(),
    )
}

fn contact(contact: &Contact) -> [(&'static str, Value); 3] {
    [
        ("datasetContactAffiliation", primitive(&contact.affiliation)),
        ("datasetContactEmail", primitive(&contact.email)),
        ("datasetContactName", primitive(&contact.name())),
    ]
}

fn keyword(term: &Term) -> [(&'static str, Value); 3] {
    [
        ("keywordValue", primitive(&term.name)),
        ("keywordVocabulary", primitive(&term.vocabulary)),
        ("keywordVocabularyURI", primitive(&term.uri)),
    ]
}

/// Describe a publication by its URL.
///
/// URLs look like `https://doi.org/10.1000/182`: the identifier is made of the two path segments
/// following the host, and the identifier type is the host without its `.org` suffix.
fn publication(url: &str) -> Option<[(&'static str, Value); 3]> {
    let segments = url.split('/').collect::<Vec<_>>();
    if segments.len() < 5 {
        return None;
    }
    let id = format!("{}{}", segments[3], segments[4]);
    let id_type = segments[2].strip_suffix(".org").unwrap_or(segments[2]);
    Some([
        ("publicationIDNumber", primitive(&id)),
        (
            "publicationIDType",
            field("", false, "controlledVocabulary", id_type),
        ),
        ("publicationURL", primitive(url)),
    ])
}
