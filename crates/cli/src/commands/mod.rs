use anyhow::Result;
use clap::Subcommand;

pub mod config;
pub mod demo;

use self::config::ConfigCommands;
use self::demo::DemoArgs;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the example scenarios against a local session
    Demo(DemoArgs),

    /// Inspect the client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Demo(args) => demo::execute(args),
            Commands::Config { command } => command.execute(),
        }
    }
}
