use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wayfarer-server", about = "Event and destination catalog server")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "wayfarer.toml")]
    pub config: PathBuf,

    /// Override the bind address from the config file.
    #[arg(long)]
    pub bind: Option<String>,

    /// Skip the idempotent destination seeding at startup.
    #[arg(long)]
    pub no_seed: bool,
}
