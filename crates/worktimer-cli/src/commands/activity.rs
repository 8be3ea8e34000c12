use clap::Subcommand;
use worktimer_core::Config;

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Register an activity under a subject
    Add {
        /// Activity ID
        id: String,
        /// Owning subject ID
        #[arg(long)]
        subject: String,
        /// Display name, defaults to the ID
        #[arg(long)]
        name: Option<String>,
    },
}

pub fn run(action: ActivityAction, config: &Config) -> CliResult {
    let store = open_store(config)?;
    match action {
        ActivityAction::Add { id, subject, name } => {
            store.register_activity(&id, &subject, name.as_deref().unwrap_or(&id))?;
            println!("activity registered: {id} ({subject})");
        }
    }
    Ok(())
}
