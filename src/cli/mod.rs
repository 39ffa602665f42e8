// CLI module
// Interactive management commands

mod commands;

pub use commands::{create_superuser, SuperuserOutcome, SuperuserPrompt, TerminalPrompt};
