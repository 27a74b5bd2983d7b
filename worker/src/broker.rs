//! Consumption of export requests from RabbitMQ.

use crate::handler::{Handler, Outcome};
use anyhow::Error;
use async_std::task::spawn;
use clap::Args;
use futures::StreamExt;
use lapin::{
    message::Delivery,
    options::{
        BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicQosOptions,
        BasicRejectOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    uri::{AMQPAuthority, AMQPUri, AMQPUserInfo},
    Channel, Connection, ConnectionProperties, ExchangeKind,
};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_async_std::Signals;
use tracing::Instrument;

/// RabbitMQ connection options.
#[derive(Clone, Debug, Args)]
pub struct Options {
    #[clap(long, env = "RABBITMQ_HOST")]
    pub rabbitmq_host: String,

    #[clap(long, env = "RABBITMQ_PORT", default_value = "5672")]
    pub rabbitmq_port: u16,

    #[clap(long, env = "RABBITMQ_USER")]
    pub rabbitmq_user: String,

    #[clap(long, env = "RABBITMQ_PASS")]
    pub rabbitmq_pass: String,

    #[clap(long, env = "RABBITMQ_VHOST", default_value = "/")]
    pub rabbitmq_vhost: String,

    /// Topic exchange on which export requests are published.
    #[clap(long, env = "RABBITMQ_EXCHANGE", default_value = "datahub.events_tx")]
    pub rabbitmq_exchange: String,

    /// Queue from which this worker consumes.
    #[clap(
        long,
        env = "RABBITMQ_QUEUE",
        default_value = "repository.Dataverse-exporter"
    )]
    pub rabbitmq_queue: String,

    #[clap(
        long,
        env = "RABBITMQ_ROUTING_KEY",
        default_value = "projectCollection.exporter.requested"
    )]
    pub rabbitmq_routing_key: String,
}

impl Options {
    /// The AMQP URI of the broker.
    ///
    /// Credentials and vhost are taken as they are, without any URI escaping.
    pub fn uri(&self) -> AMQPUri {
        let vhost = match self.rabbitmq_vhost.as_str() {
            "/" => "/",
            vhost => vhost.trim_start_matches('/'),
        };
        AMQPUri {
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.rabbitmq_user.clone(),
                    password: self.rabbitmq_pass.clone(),
                },
                host: self.rabbitmq_host.clone(),
                port: self.rabbitmq_port,
            },
            vhost: vhost.into(),
            ..Default::default()
        }
    }

    /// Connect to the broker and set up the exchange, queue and binding.
    pub async fn connect(&self) -> Result<Broker, Error> {
        tracing::info!(
            "connecting to RabbitMQ at {}:{}",
            self.rabbitmq_host,
            self.rabbitmq_port
        );
        let connection = Connection::connect_uri(self.uri(), ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .exchange_declare(
                &self.rabbitmq_exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_declare(
                &self.rabbitmq_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                &self.rabbitmq_queue,
                &self.rabbitmq_exchange,
                &self.rabbitmq_routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        // One request at a time.
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        Ok(Broker {
            connection,
            channel,
            queue: self.rabbitmq_queue.clone(),
        })
    }
}

/// A connection to the broker, ready to consume.
pub struct Broker {
    connection: Connection,
    channel: Channel,
    queue: String,
}

impl Broker {
    /// Handle requests until the process is asked to stop.
    ///
    /// On SIGINT or SIGTERM, the request in progress is finished, after which the connection is
    /// closed and this function returns.
    pub async fn run<H: Handler>(self, handler: &H) -> Result<(), Error> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                "exporter",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let signals = Signals::new([SIGINT, SIGTERM])?;
        let signals_handle = signals.handle();
        let watcher = spawn(
            cancel_on_signal(signals, self.channel.clone(), consumer.tag().as_str().into())
                .in_current_span(),
        );

        tracing::info!("waiting for export requests on {}", self.queue);
        while let Some(delivery) = consumer.next().await {
            process(handler, delivery?).await?;
        }

        tracing::info!("closing connection");
        signals_handle.close();
        watcher.await;
        self.channel.close(200, "worker shutting down").await?;
        self.connection.close(200, "worker shutting down").await?;
        Ok(())
    }
}

/// Stop consuming once a shutdown signal arrives.
async fn cancel_on_signal(mut signals: Signals, channel: Channel, consumer_tag: String) {
    if let Some(signal) = signals.next().await {
        tracing::info!(signal, "shutdown signal");
        if let Err(err) = channel
            .basic_cancel(&consumer_tag, BasicCancelOptions::default())
            .await
        {
            tracing::error!("failed to cancel consumer: {err}");
        }
    }
}

async fn process<H: Handler>(handler: &H, delivery: Delivery) -> Result<(), Error> {
    tracing::info!(
        "received request {} on {}",
        delivery.delivery_tag,
        delivery.routing_key.as_str()
    );
    match handler.dispatch(&delivery.data).await {
        Outcome::Ack => delivery.ack(BasicAckOptions::default()).await?,
        Outcome::Reject => {
            delivery
                .reject(BasicRejectOptions { requeue: false })
                .await?
        }
    }
    Ok(())
}
