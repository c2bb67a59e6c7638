//! Chat binary with the streamable HTTP transport fixed.

use mcp_chatbot::{Cli, TransportKind, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::for_transport(TransportKind::Http)).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
