use clap::Parser;
use fry_engine::adapter::inbound::cli::{command::Cli, dispatch, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if let Err(e) = dispatch::execute(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
