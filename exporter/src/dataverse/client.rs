//! A client for the Dataverse native API.

use super::{Dataverse, Upload};
use anyhow::Error;
use async_trait::async_trait;
use clap::Args;
use futures::io::{AsyncReadExt, Cursor};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use surf::{http::StatusCode, Body, Url};

/// Dataverse connection options.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// Root URL of the Dataverse installation.
    #[clap(long, env = "DATAVERSE_HOST")]
    pub dataverse_host: Url,

    /// API token with which to deposit datasets.
    #[clap(long, env = "DATAVERSE_TOKEN")]
    pub dataverse_token: String,
}

impl Options {
    /// Connect to Dataverse.
    pub fn connect(&self) -> Result<Client, Error> {
        Client::new(self.dataverse_host.clone(), self.dataverse_token.clone())
    }
}

/// A Dataverse client.
pub struct Client {
    client: surf::Client,
    host: String,
    token: String,
}

impl Client {
    pub fn new(host: Url, token: String) -> Result<Self, Error> {
        Ok(Self {
            client: surf::Config::default()
                .set_timeout(None)
                .try_into()
                .map_err(Error::msg)?,
            host: host.as_str().trim_end_matches('/').into(),
            token,
        })
    }

    fn post(&self, path: impl AsRef<str>) -> surf::RequestBuilder {
        let url = format!("{}/api/{}", self.host, path.as_ref());
        tracing::info!("Dataverse request POST {url}");
        self.client
            .post(url)
            .header("X-Dataverse-key", self.token.as_str())
    }
}

#[async_trait]
impl Dataverse for Client {
    async fn create_dataset(&self, alias: &str, dataset: &Value) -> Result<String, Error> {
        let res = self
            .post(format!("dataverses/{alias}/datasets"))
            .body_json(dataset)
            .map_err(Error::msg)?
            .await
            .map_err(Error::msg)?;
        let created: Response<CreatedDataset> = expect(res, StatusCode::Created).await?;
        Ok(created.data.persistent_id)
    }

    async fn add_file(
        &self,
        pid: &str,
        name: &str,
        contents: Upload,
        len: u64,
        restrict: bool,
    ) -> Result<String, Error> {
        let multipart = Multipart::new(name, restrict);
        let (preamble, epilogue) = multipart.frame();
        let body_len = preamble.len() as u64 + len + epilogue.len() as u64;
        let reader = Cursor::new(preamble)
            .chain(contents)
            .chain(Cursor::new(epilogue));
        let body = Body::from_reader(reader, Some(body_len as usize));

        let res = self
            .post(format!("datasets/:persistentId/add?persistentId={pid}"))
            .body(body)
            .header("Content-Type", multipart.content_type())
            .await
            .map_err(Error::msg)?;
        let added: Response<AddedFiles> = expect(res, StatusCode::Ok).await?;
        let file = added
            .data
            .files
            .into_iter()
            .next()
            .ok_or_else(|| Error::msg("Dataverse did not report the uploaded file"))?;
        file.data_file.md5().ok_or_else(|| {
            Error::msg(format!(
                "Dataverse did not report an MD5 checksum for {}",
                file.data_file.filename
            ))
        })
    }

    async fn submit_for_review(&self, pid: &str) -> Result<(), Error> {
        let res = self
            .post(format!(
                "datasets/:persistentId/submitForReview?persistentId={pid}"
            ))
            .await
            .map_err(Error::msg)?;
        expect::<Value>(res, StatusCode::Ok).await?;
        tracing::info!("dataset submitted for review: {}", self.dataset_url(pid));
        Ok(())
    }

    fn dataset_url(&self, pid: &str) -> String {
        format!(
            "{}/dataset.xhtml?persistentId={pid}&version=DRAFT",
            self.host
        )
    }
}

/// Check the status of a response and parse its body.
async fn expect<T: for<'de> Deserialize<'de>>(
    mut res: surf::Response,
    status: StatusCode,
) -> Result<T, Error> {
    if res.status() != status {
        let body = res.body_string().await.unwrap_or_default();
        return Err(Error::msg(format!(
            "Dataverse responded {}: {body}",
            res.status()
        )));
    }
    res.body_json().await.map_err(Error::msg)
}

/// The body of a Dataverse API response.
///
/// Successful responses have the form
/// ```json
/// {
///     "status": "OK",
///     "data": { ... }
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
struct Response<T> {
    data: T,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDataset {
    persistent_id: String,
}

#[derive(Clone, Debug, Deserialize)]
struct AddedFiles {
    files: Vec<AddedFile>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddedFile {
    data_file: DataFile,
}

#[derive(Clone, Debug, Deserialize)]
struct DataFile {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    md5: Option<String>,
    #[serde(default)]
    checksum: Option<Checksum>,
}

impl DataFile {
    fn md5(&self) -> Option<String> {
        self.md5.clone().or_else(|| {
            self.checksum
                .as_ref()
                .filter(|checksum| checksum.kind == "MD5")
                .map(|checksum| checksum.value.clone())
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
struct Checksum {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// Framing of a `multipart/form-data` body with a JSON part followed by a file part.
///
/// The file contents are streamed, so only the framing around them is built in memory.
struct Multipart {
    boundary: String,
    filename: String,
    json: Value,
}

impl Multipart {
    fn new(filename: &str, restrict: bool) -> Self {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|t| t.as_nanos())
            .unwrap_or_default();
        Self {
            boundary: format!("exporter-{nonce:x}"),
            filename: filename.replace(['"', '\r', '\n'], "_"),
            json: json!({ "restrict": restrict }),
        }
    }

    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// The bytes preceding and following the file contents.
    fn frame(&self) -> (Vec<u8>, Vec<u8>) {
        let preamble = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"jsonData\"\r\n\r\n\
             {json}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = self.boundary,
            json = self.json,
            name = self.filename,
        );
        let epilogue = format!("\r\n--{}--\r\n", self.boundary);
        (preamble.into_bytes(), epilogue.into_bytes())
    }
}
