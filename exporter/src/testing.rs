//! Helpers for testing HTTP clients against a local server.
#![cfg(test)]

use async_std::{
    net::TcpStream,
    task::{sleep, spawn},
};
use portpicker::pick_unused_port;
use std::time::Duration;
use surf::Url;

/// Serve `app` on an unused local port, returning its root URL once it accepts connections.
pub async fn serve<S: Clone + Send + Sync + 'static>(app: tide::Server<S>) -> Url {
    let port = pick_unused_port().unwrap();
    spawn(async move {
        if let Err(err) = app.listen(format!("127.0.0.1:{port}")).await {
            tracing::error!("test server exited: {err}");
        }
    });
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    format!("http://127.0.0.1:{port}/").parse().unwrap()
}
