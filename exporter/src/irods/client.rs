//! A client for the iRODS HTTP API.

use super::{Avu, DataObject, Irods};
use anyhow::Error;
use async_std::sync::RwLock;
use async_trait::async_trait;
use base64::prelude::*;
use clap::Args;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::collections::BTreeMap;
use surf::{
    http::{Method, StatusCode},
    Body, Url,
};

/// iRODS connection options.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// Host running the iRODS HTTP API.
    #[clap(long, env = "IRODS_HOST")]
    pub irods_host: String,

    /// Port of the iRODS HTTP API.
    #[clap(long, env = "IRODS_HTTP_PORT", default_value = "9001")]
    pub irods_http_port: u16,

    /// Path under which the iRODS HTTP API is served.
    #[clap(
        long,
        env = "IRODS_HTTP_BASE",
        default_value = "/irods-http-api/0.3.0"
    )]
    pub irods_http_base: String,

    /// iRODS user as which to connect.
    #[clap(long, env = "IRODS_USER")]
    pub irods_user: String,

    /// Password of the iRODS user.
    #[clap(long, env = "IRODS_PASS")]
    pub irods_pass: String,

    /// The iRODS zone holding the projects.
    #[clap(long, env = "IRODS_ZONE", default_value = "nlmumc")]
    pub irods_zone: String,
}

impl Options {
    /// The root URL of the HTTP API.
    pub fn url(&self) -> Result<Url, Error> {
        Ok(format!(
            "http://{}:{}/{}/",
            self.irods_host,
            self.irods_http_port,
            self.irods_http_base.trim_matches('/')
        )
        .parse()?)
    }

    /// Connect to iRODS.
    pub async fn connect(&self) -> Result<Client, Error> {
        Client::connect(self.url()?, &self.irods_user, &self.irods_pass).await
    }
}

/// An iRODS client backed by the iRODS HTTP API.
pub struct Client {
    client: surf::Client,
    user: String,
    password: String,
    token: RwLock<String>,
}

impl Client {
    /// Authenticate with the iRODS HTTP API rooted at `url`.
    pub async fn connect(url: Url, user: &str, password: &str) -> Result<Self, Error> {
        let client = Self {
            client: surf::Config::default()
                .set_base_url(url)
                .try_into()
                .map_err(Error::msg)?,
            user: user.into(),
            password: password.into(),
            token: Default::default(),
        };
        client.authenticate().await?;
        Ok(client)
    }

    /// Obtain a fresh bearer token.
    async fn authenticate(&self) -> Result<(), Error> {
        tracing::info!(user = %self.user, "authenticating with iRODS");
        let credentials = BASE64_STANDARD.encode(format!("{}:{}", self.user, self.password));
        let mut res = self
            .client
            .post("authenticate")
            .header("Authorization", format!("Basic {credentials}"))
            .await
            .map_err(Error::msg)?;
        if !res.status().is_success() {
            return Err(Error::msg(format!(
                "iRODS authentication failed: {}",
                res.status()
            )));
        }
        *self.token.write().await = res.body_string().await.map_err(Error::msg)?;
        Ok(())
    }

    /// Send a request, authenticating again if the token has expired.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<surf::Response, Error> {
        for retry in [true, false] {
            let req = match method {
                Method::Get => self
                    .client
                    .get(endpoint)
                    .query(&params)
                    .map_err(Error::msg)?,
                _ => self
                    .client
                    .request(method, endpoint)
                    .body(Body::from_form(&params).map_err(Error::msg)?),
            };
            let token = self.token.read().await.clone();
            tracing::debug!(?params, "iRODS {method} {endpoint}");
            let mut res = req
                .header("Authorization", format!("Bearer {token}"))
                .await
                .map_err(Error::msg)?;
            if res.status() == StatusCode::Unauthorized && retry {
                self.authenticate().await?;
                continue;
            }
            if !res.status().is_success() {
                let body = res.body_string().await.unwrap_or_default();
                return Err(Error::msg(format!(
                    "iRODS {endpoint} request failed ({}): {body}",
                    res.status()
                )));
            }
            return Ok(res);
        }
        Err(Error::msg("iRODS rejected our credentials"))
    }

    /// Send a request and interpret the JSON response.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let res: Response<T> = self
            .send(method, endpoint, params)
            .await?
            .body_json()
            .await
            .map_err(Error::msg)?;
        match res.irods_response {
            Status {
                status_code: 0, ..
            } => Ok(res.data),
            Status {
                status_code,
                status_message,
            } => Err(Error::msg(format!(
                "iRODS error {status_code} on {endpoint}: {}",
                status_message.unwrap_or_default()
            ))),
        }
    }

    /// Run a GenQuery, returning all rows.
    async fn query(&self, query: String) -> Result<Vec<Vec<String>>, Error> {
        let mut rows = vec![];
        loop {
            let page: QueryResult = self
                .call(
                    Method::Get,
                    "query",
                    &[
                        ("op", "execute_genquery".into()),
                        ("query", query.clone()),
                        ("offset", rows.len().to_string()),
                    ],
                )
                .await?;
            if page.rows.is_empty() {
                return Ok(rows);
            }
            rows.extend(page.rows);
        }
    }

    async fn modify_metadata(&self, collection: &str, op: &str, avu: &Avu) -> Result<(), Error> {
        let operations = json!([{
            "operation": op,
            "attribute": avu.attribute,
            "value": avu.value,
            "units": avu.unit,
        }]);
        self.call::<Empty>(
            Method::Post,
            "collections",
            &[
                ("op", "modify_metadata".into()),
                ("lpath", collection.into()),
                ("operations", operations.to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Irods for Client {
    async fn list(&self, collection: &str) -> Result<Vec<DataObject>, Error> {
        let collection = quote(collection.trim_end_matches('/'))?;
        let mut objects = BTreeMap::new();
        for condition in [
            format!("COLL_NAME = '{collection}'"),
            format!("COLL_NAME like '{collection}/%'"),
        ] {
            let rows = self
                .query(format!(
                    "SELECT COLL_NAME, DATA_NAME, DATA_SIZE WHERE {condition}"
                ))
                .await?;
            // There is one row per replica; replicas of the same object have the same size.
            for row in rows {
                let [coll, name, size] = row.as_slice() else {
                    return Err(Error::msg(format!("malformed listing row {row:?}")));
                };
                objects.insert(format!("{coll}/{name}"), size.parse::<u64>()?);
            }
        }
        Ok(objects
            .into_iter()
            .map(|(path, size)| DataObject::new(path, size))
            .collect())
    }

    async fn read(&self, path: &str, offset: u64, count: usize) -> Result<Vec<u8>, Error> {
        self.send(
            Method::Get,
            "data-objects",
            &[
                ("op", "read".into()),
                ("lpath", path.into()),
                ("offset", offset.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await?
        .body_bytes()
        .await
        .map_err(Error::msg)
    }

    async fn checksum(&self, path: &str) -> Result<String, Error> {
        let res: ChecksumResult = self
            .call(
                Method::Post,
                "data-objects",
                &[
                    ("op", "calculate_checksum".into()),
                    ("lpath", path.into()),
                    ("force", "1".into()),
                ],
            )
            .await?;
        sha256_hex(&res.checksum)
    }

    async fn avus(&self, collection: &str) -> Result<Vec<Avu>, Error> {
        let rows = self
            .query(format!(
                "SELECT META_COLL_ATTR_NAME, META_COLL_ATTR_VALUE, META_COLL_ATTR_UNITS \
                 WHERE COLL_NAME = '{}'",
                quote(collection)?
            ))
            .await?;
        rows.into_iter()
            .map(|row| match <[String; 3]>::try_from(row) {
                Ok([attribute, value, unit]) => Ok(Avu::with_unit(attribute, value, unit)),
                Err(row) => Err(Error::msg(format!("malformed AVU row {row:?}"))),
            })
            .collect()
    }

    async fn add_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error> {
        self.modify_metadata(collection, "add", avu).await
    }

    async fn remove_avu(&self, collection: &str, avu: &Avu) -> Result<(), Error> {
        self.modify_metadata(collection, "remove", avu).await
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        tracing::info!("removing {path} from iRODS");
        self.call::<Empty>(
            Method::Post,
            "data-objects",
            &[("op", "remove".into()), ("lpath", path.into())],
        )
        .await?;
        Ok(())
    }
}

/// Every response of the HTTP API carries the status of the underlying iRODS operation.
#[derive(Debug, Deserialize)]
struct Response<T> {
    irods_response: Status,
    #[serde(flatten)]
    data: T,
}

#[derive(Debug, Deserialize)]
struct Status {
    status_code: i64,
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChecksumResult {
    checksum: String,
}

/// Convert an iRODS checksum (`sha2:<base64>`) to hex.
fn sha256_hex(checksum: &str) -> Result<String, Error> {
    let encoded = checksum.strip_prefix("sha2:").ok_or_else(|| {
        Error::msg(format!(
            "checksum {checksum} is not SHA-256; the server must use the SHA256 hash scheme"
        ))
    })?;
    Ok(BASE64_STANDARD
        .decode(encoded)?
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

/// Check that `path` can be used as a literal in a GenQuery condition.
fn quote(path: &str) -> Result<&str, Error> {
    if path.contains('\'') {
        Err(Error::msg(format!("cannot query path {path} containing '")))
    } else {
        Ok(path)
    }
}
