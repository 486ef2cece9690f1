use std::path::PathBuf;

use crate::{pkg::server::listen, prelude::Result};
use clap::{Parser, Subcommand};

mod import;

#[derive(Parser)]
#[command(about = "job application tracker service")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    /// Serve the jobs api
    Listen,
    /// Validate a jobs file and install it as the stored collection
    Import { path: PathBuf },
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    match args.command {
        Some(SubCommandType::Listen) => {
            listen().await?;
        }
        Some(SubCommandType::Import { path }) => {
            import::apply(&path).await?;
        }
        None => {
            tracing::error!("no subcommand passed");
        }
    }
    Ok(())
}
