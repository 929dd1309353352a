use anyhow::{Context, Result};
use cachet_cache::{ClientConfigLoader, ConfigSource};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration and where it came from
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the path of the configuration file
    Path,
}

impl ConfigCommands {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommands::Show { json } => {
                let config = ClientConfigLoader::load().context("failed to load configuration")?;
                if json {
                    let document = serde_json::json!({
                        "cache": config.client,
                        "source": config.source,
                    });
                    println!("{}", serde_json::to_string_pretty(&document)?);
                } else {
                    println!("default_ttl_ms:    {}", config.client.default_ttl_ms);
                    println!("sweep_interval_ms: {}", config.client.sweep_interval_ms);
                    println!("source:            {}", describe(&config.source));
                }
                Ok(())
            }
            ConfigCommands::Path => {
                let path = ClientConfigLoader::config_file_path()?;
                println!("{}", path.display());
                Ok(())
            }
        }
    }
}

fn describe(source: &ConfigSource) -> String {
    match source {
        ConfigSource::Default => "built-in defaults".to_string(),
        ConfigSource::ConfigFile(path) => format!("file {}", path.display()),
        ConfigSource::EnvironmentVariable(name) => format!("environment ({name})"),
        ConfigSource::CommandLine => "command line".to_string(),
    }
}
