// User-friendly error messages for the command line
//
// Turns low-level failures (bad TOML, unreachable database, busy port) into
// text that tells the operator what to change.

use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;

/// Wrap an error with an operator-facing suggestion
pub trait UserFriendlyError {
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self;
}

impl<T> UserFriendlyError for Result<T> {
    fn user_context_with_suggestion(self, problem: &str, suggestion: &str) -> Self {
        self.with_context(|| format!("{}\n\n\x1b[1;33mSuggestion:\x1b[0m {}", problem, suggestion))
    }
}

/// Config file exists but is not valid TOML (or has wrong types)
pub fn config_parse_error(path: &Path, error: &dyn Display) -> String {
    format!(
        "Failed to parse config file {}\n\n\
        \x1b[1;33mError:\x1b[0m {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check the file syntax:\n\
           \x1b[36mcat {}\x1b[0m\n\n\
        2. Common mistakes:\n\
           • Missing quotes around strings\n\
           • Keys placed under the wrong [section]\n\
           • Numbers given as strings (bcrypt_cost = \"12\")",
        path.display(),
        error,
        path.display()
    )
}

/// Database could not be opened or migrated
pub fn database_open_error(url: &str) -> String {
    format!(
        "Could not open database at {}\n\n\
        \x1b[1;33mPossible causes:\x1b[0m\n\
        • Parent directory does not exist or is not writable\n\
        • File was created by an incompatible schema version\n\n\
        \x1b[1;32mTry:\x1b[0m setting AI3D_DATABASE_URL, e.g.\n\
           \x1b[36mAI3D_DATABASE_URL=sqlite://ai3d.db\x1b[0m",
        url
    )
}

/// Listener could not bind
pub fn bind_error(address: &str) -> String {
    format!(
        "Could not listen on {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check whether another process holds the port:\n\
           \x1b[36mlsof -i :{}\x1b[0m\n\n\
        2. Pick another address:\n\
           \x1b[36mai3d serve --bind 127.0.0.1:8080\x1b[0m",
        address,
        address.rsplit(':').next().unwrap_or(address)
    )
}
