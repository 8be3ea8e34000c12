use clap::Subcommand;
use worktimer_core::Config;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file if none exists
    Init,
}

pub fn run(action: ConfigAction, config: &Config) -> CliResult {
    match action {
        ConfigAction::Show => print_json(config)?,
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Init => {
            let path = Config::path()?;
            if path.exists() {
                println!("config already exists: {}", path.display());
            } else {
                let path = Config::default().save()?;
                println!("config written: {}", path.display());
            }
        }
    }
    Ok(())
}
