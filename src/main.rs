use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hnsearch::{commands, config::Config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hnsearch", version, about = "Search a local index of Hacker News posts")]
struct Cli {
   /// Configuration file (defaults to ~/.hnsearch/config.toml)
   #[arg(long, global = true, env = "HNSEARCH_CONFIG")]
   config: Option<PathBuf>,

   /// Database file, overriding the configured one
   #[arg(long, global = true)]
   db: Option<PathBuf>,

   #[command(subcommand)]
   command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
   /// Search indexed posts
   Search(commands::search::SearchArgs),

   /// Import a JSON array of API items into the index
   Import {
      file: PathBuf,
   },

   /// List known labels with stored post counts
   Labels,

   /// Show how posts are distributed across categories
   Categories,

   /// Print the effective configuration
   Config,
}

fn main() -> Result<()> {
   let cli = Cli::parse();

   let mut config = match &cli.config {
      Some(path) => Config::load_from(path),
      None => Config::load(),
   }
   .context("failed to load configuration")?;
   if let Some(db) = cli.db {
      config.db_path = db;
   }

   tracing_subscriber::registry()
      .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
      .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
      .init();

   match cli.command {
      Cmd::Search(args) => commands::search::execute(args, &config),
      Cmd::Import { file } => commands::import::execute(&file, &config),
      Cmd::Labels => commands::labels::execute(&config),
      Cmd::Categories => commands::categories::execute(&config),
      Cmd::Config => commands::config::execute(&config),
   }
}
