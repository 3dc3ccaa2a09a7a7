//! m2rs echo handler.
//!
//! Connects to a Mongrel2 server over ZeroMQ and answers every request with
//! an HTTP 200 carrying the request's path, headers and body as JSON.
//!
//! Usage: `m2rs-echo [config.yaml]` (default `m2rs.yaml`).

use tracing_subscriber::{fmt, EnvFilter};

use m2rs_handler::transport::ZmqTransport;
use m2rs_handler::{config, echo, Connection};

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "m2rs.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log.filter));
    fmt().with_env_filter(filter).init();

    let transport = ZmqTransport::new();
    let mut conn =
        Connection::from_config(&transport, &cfg.handler).expect("failed to open connection");

    match echo::run(&mut conn) {
        Ok(served) => tracing::info!(served, "echo handler stopped"),
        Err(e) => tracing::error!(error = %e, "echo handler failed"),
    }
    conn.close();
}
