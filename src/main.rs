//! sni-terminator
//!
//! Terminates TLS on one endpoint and picks the server certificate per
//! connection from the hostname the client sends via SNI.
//!
//! ```text
//! sni-terminator -c /etc/sni-terminator.toml
//! ```

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use sni_terminator::config::load_config;
use sni_terminator::lifecycle::signals;
use sni_terminator::observability::logging;
use sni_terminator::{AdapterRegistry, Server};

#[derive(Parser)]
#[command(name = "sni-terminator")]
#[command(about = "TLS terminator with SNI-based certificate selection", long_about = None)]
struct Cli {
    /// Config file.
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging is configured by the file, so failures before this point go to stderr.
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sni-terminator: {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.log) {
        eprintln!("sni-terminator: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.address,
        transport = %config.transport,
        sni_adapter = %config.sni_adapter,
        "sni-terminator starting"
    );

    let registry = AdapterRegistry::with_builtin();
    let server = match Server::new(&config, &registry).await {
        Ok(server) => Arc::new(server),
        Err(e) => fatal(e),
    };

    signals::stop_on_signal(Arc::clone(&server));
    server.run().await;

    tracing::info!("Shutdown complete");
}

fn fatal(error: impl Display) -> ! {
    tracing::error!(error = %error, "Setup failed");
    std::process::exit(1);
}
