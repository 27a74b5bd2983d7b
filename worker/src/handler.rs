//! Dispatch of export requests to the exporter for their repository.

use anyhow::Error;
use async_trait::async_trait;
use exporter::{
    dataverse::Dataverse,
    export::{ExportRequest, Exporter},
    irods::Irods,
    mailer::Mailer,
    status::Repository,
};

/// What to tell the broker about a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ack,
    /// Drop the message without requeueing it.
    Reject,
}

/// A consumer of export requests.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, req: ExportRequest) -> Result<(), Error>;

    /// Parse and handle a raw message.
    async fn dispatch(&self, body: &[u8]) -> Outcome {
        let req: ExportRequest = match serde_json::from_slice(body) {
            Ok(req) => req,
            Err(err) => {
                tracing::error!("malformed export request: {err}");
                return Outcome::Reject;
            }
        };
        tracing::info!("export request: {req}");
        match self.handle(req).await {
            Ok(()) => Outcome::Ack,
            Err(err) => {
                tracing::error!("export failed: {err:#}");
                Outcome::Reject
            }
        }
    }
}

/// Routes each request to the exporter for its repository.
pub struct Dispatcher<I, D, M> {
    dataverse: Exporter<I, D, M>,
    easy_host: Option<String>,
}

impl<I, D, M> Dispatcher<I, D, M> {
    pub fn new(dataverse: Exporter<I, D, M>, easy_host: Option<String>) -> Self {
        Self {
            dataverse,
            easy_host,
        }
    }
}

#[async_trait]
impl<I: Irods, D: Dataverse, M: Mailer> Handler for Dispatcher<I, D, M> {
    async fn handle(&self, req: ExportRequest) -> Result<(), Error> {
        match req.repository {
            Repository::Dataverse => {
                let pid = self.dataverse.export(&req).await?;
                tracing::info!("{req} finished as {pid}");
                Ok(())
            }
            Repository::Easy => Err(Error::msg(format!(
                "exports to EASY ({}) are not supported",
                self.easy_host.as_deref().unwrap_or("no host configured")
            ))),
        }
    }
}
