//! Keys Command - generate participant keys and a head config

use std::path::PathBuf;

use clap::Args;

use crate::config::HeadConfig;

/// Generate fresh participant keys and write them as a head config
#[derive(Args)]
pub struct KeysCommand {
    /// Number of participants to generate
    #[arg(long, default_value_t = 3)]
    participants: usize,

    /// Output path for the config file
    #[arg(long, default_value = "head.toml")]
    out: PathBuf,
}

impl KeysCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> anyhow::Result<()> {
        let config = HeadConfig::generate(self.participants);
        let path = config_path.unwrap_or(self.out);
        config.save(&path)?;

        println!("Wrote {} participant keys to {}", self.participants, path.display());
        for (i, key) in config.signing_keys()?.iter().enumerate() {
            println!(
                "  participant {}: key hash {}",
                i,
                hex::encode(&key.verification_key().hash()[..16])
            );
        }
        Ok(())
    }
}
