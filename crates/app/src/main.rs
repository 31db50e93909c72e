//! GamePart Hub CLI

use std::process;

mod cli;

use cli::Cli;

#[tokio::main]
pub async fn main() {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
