use clap::Subcommand;
use worktimer_core::Config;

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// Register a subject (or rename an existing one)
    Add {
        /// Subject ID
        id: String,
        /// Display name, defaults to the ID
        #[arg(long)]
        name: Option<String>,
    },
}

pub fn run(action: SubjectAction, config: &Config) -> CliResult {
    let store = open_store(config)?;
    match action {
        SubjectAction::Add { id, name } => {
            store.register_subject(&id, name.as_deref().unwrap_or(&id))?;
            println!("subject registered: {id}");
        }
    }
    Ok(())
}
