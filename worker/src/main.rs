use anyhow::Error;
use clap::Parser;
use exporter::{dataverse, export, export::Exporter, init_logging, irods, mailer};
use handler::Dispatcher;
use tracing::Instrument;

mod broker;
mod handler;

/// Export DataHub collections to research-data repositories, on request.
#[derive(Clone, Debug, Parser)]
struct Options {
    /// Default log level: DEBUG, INFO, WARNING or ERROR.
    #[clap(long, env = "LOG_LEVEL", default_value = "INFO")]
    log_level: String,

    /// Comma-separated tags attached to every log record.
    ///
    /// If set, logs are written as JSON, one record per line.
    #[clap(long, env = "LOGSTASH_TAGS", value_delimiter = ',')]
    logstash_tags: Vec<String>,

    /// Deposit endpoint of EASY.
    #[clap(long, env = "EASY_HOST")]
    easy_host: Option<String>,

    #[clap(flatten)]
    broker: broker::Options,

    #[clap(flatten)]
    irods: irods::Options,

    #[clap(flatten)]
    dataverse: dataverse::Options,

    #[clap(flatten)]
    mailer: mailer::Options,

    #[clap(flatten)]
    export: export::Options,
}

#[async_std::main]
async fn main() -> Result<(), Error> {
    let opt = Options::parse();
    let tags = opt
        .logstash_tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>();
    let span = init_logging(&opt.log_level, &tags)?;
    run(opt).instrument(span).await
}

async fn run(opt: Options) -> Result<(), Error> {
    let exporter = Exporter::new(
        opt.irods.connect().await?,
        opt.dataverse.connect()?,
        opt.mailer.connect()?,
        &opt.irods.irods_zone,
    )
    .with_options(&opt.export);
    let handler = Dispatcher::new(exporter, opt.easy_host.clone());

    let broker = opt.broker.connect().await?;
    if let Err(err) = broker.run(&handler).await {
        tracing::error!("worker stopped: {err:#}");
        return Err(err);
    }
    tracing::info!("worker stopped");
    Ok(())
}
