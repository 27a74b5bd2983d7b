//! Confirmation e-mails sent through the DataHub mail relay.

use crate::{metadata::CollectionMetadata, status::Repository};
use anyhow::Error;
use async_trait::async_trait;
use base64::prelude::*;
use chrono::Local;
use clap::Args;
use serde::Serialize;
use serde_json::json;

/// Template used by the relay to render export confirmations.
pub const TEMPLATE: &str = "OpenAccess_export_confirmation";

/// Mail relay options.
#[derive(Clone, Debug, Args)]
pub struct Options {
    /// Host (and optional port) of the mail relay.
    #[clap(long, env = "DH_MAILER_HOST")]
    pub dh_mailer_host: String,

    #[clap(long, env = "DH_MAILER_USERNAME")]
    pub dh_mailer_username: String,

    #[clap(long, env = "DH_MAILER_PASSWORD")]
    pub dh_mailer_password: String,

    /// Sender address of confirmation e-mails.
    #[clap(
        long,
        env = "DH_MAILER_FROM",
        default_value = "datahub@maastrichtuniversity.nl"
    )]
    pub dh_mailer_from: String,
}

impl Options {
    /// Connect to the mail relay.
    pub fn connect(&self) -> Result<Client, Error> {
        Client::new(
            &self.dh_mailer_host,
            &self.dh_mailer_username,
            &self.dh_mailer_password,
            &self.dh_mailer_from,
        )
    }
}

/// The contents of an export confirmation.
///
/// Serializes to the template options expected by [`TEMPLATE`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Confirmation {
    pub title: String,
    pub description: String,
    pub creator: String,
    pub date: String,
    pub bytesize: u64,
    pub numfiles: u64,
    pub pid: String,
    pub timestamp: String,
    pub depositor: String,
    pub repository: Repository,
    pub external_pid: String,
    pub dataset_url: String,
}

impl Confirmation {
    /// Confirm that `md` was exported to `repository` as `external_pid`.
    pub fn new(
        md: &CollectionMetadata,
        repository: Repository,
        external_pid: impl Into<String>,
        dataset_url: impl Into<String>,
    ) -> Self {
        Self {
            title: md.title.clone(),
            description: md.description.clone().unwrap_or_default(),
            creator: md.creator.clone(),
            date: md.date.clone(),
            bytesize: md.bytesize,
            numfiles: md.numfiles,
            pid: md.pid.clone(),
            timestamp: Local::now().format("%d-%m-%Y %H:%M:%S").to_string(),
            depositor: md.depositor.clone(),
            repository,
            external_pid: external_pid.into(),
            dataset_url: dataset_url.into(),
        }
    }
}

/// A service which delivers confirmation e-mails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `confirmation` to its depositor.
    async fn send(&self, confirmation: &Confirmation) -> Result<(), Error>;
}

/// A client of the mail relay's HTTP API.
pub struct Client {
    client: surf::Client,
    endpoint: String,
    credentials: String,
    from: String,
}

impl Client {
    pub fn new(host: &str, user: &str, password: &str, from: &str) -> Result<Self, Error> {
        Ok(Self {
            client: surf::Config::default().try_into().map_err(Error::msg)?,
            endpoint: format!("http://{host}/email/send"),
            credentials: BASE64_STANDARD.encode(format!("{user}:{password}")),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for Client {
    async fn send(&self, confirmation: &Confirmation) -> Result<(), Error> {
        let body = json!({
            "language": "en",
            "templateName": TEMPLATE,
            "templateOptions": confirmation,
            "emailOptions": {
                "from": self.from,
                "to": confirmation.depositor,
            },
        });
        let mut res = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Basic {}", self.credentials))
            .body_json(&body)
            .map_err(Error::msg)?
            .await
            .map_err(Error::msg)?;
        if !res.status().is_success() {
            let body = res.body_string().await.unwrap_or_default();
            return Err(Error::msg(format!(
                "mail relay responded {}: {body}",
                res.status()
            )));
        }
        tracing::info!(
            "reporting e-mail confirmation sent to {}",
            confirmation.depositor
        );
        Ok(())
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod mock {
    //! A mailer which keeps its mail.

    use super::{Confirmation, Mailer};
    use anyhow::Error;
    use async_std::sync::{Arc, Mutex};
    use async_trait::async_trait;

    #[derive(Clone, Debug, Default)]
    pub struct MockMailer {
        sent: Arc<Mutex<Vec<Confirmation>>>,
        failing: bool,
    }

    impl MockMailer {
        /// A mailer which fails to send anything.
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }

        /// Confirmations sent so far.
        pub async fn sent(&self) -> Vec<Confirmation> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, confirmation: &Confirmation) -> Result<(), Error> {
            if self.failing {
                return Err(Error::msg("mail relay unavailable"));
            }
            self.sent.lock().await.push(confirmation.clone());
            Ok(())
        }
    }
}
