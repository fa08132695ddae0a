mod article;
mod cli;
mod config;
mod logging;
mod usage;

use anyhow::Result;
use clap::Parser;

use cli::{ArticleFormat, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    match args.command {
        Some(Commands::Article {
            urls,
            json,
            markdown,
        }) => cli::commands::article::run(urls, ArticleFormat::from_flags(json, markdown)).await,
        None => cli::commands::report::run(args.report).await,
    }
}
