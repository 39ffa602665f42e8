// Management commands

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};

use crate::auth::{Authenticator, NewUser};
use crate::store::{UserRecord, UserRole, UserStore};

/// Input/output used by interactive commands
pub trait SuperuserPrompt {
    /// Visible prompt; returns the trimmed line.
    fn prompt(&mut self, label: &str) -> Result<String>;

    /// Hidden prompt for secrets.
    fn prompt_password(&mut self, label: &str) -> Result<String>;

    fn say(&mut self, message: &str);
}

/// Reads from the controlling terminal
pub struct TerminalPrompt;

impl SuperuserPrompt for TerminalPrompt {
    fn prompt(&mut self, label: &str) -> Result<String> {
        print!("{}: ", label);
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim().to_string())
    }

    fn prompt_password(&mut self, label: &str) -> Result<String> {
        rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
    }

    fn say(&mut self, message: &str) {
        println!("{}", message);
    }
}

#[derive(Debug)]
pub enum SuperuserOutcome {
    Created(UserRecord),
    /// Confirmation differed; nothing was written
    PasswordMismatch,
}

/// `ai3d create-superuser`: prompt for credentials and store an admin account.
pub async fn create_superuser<S, P>(
    store: &S,
    auth: &Authenticator,
    prompt: &mut P,
) -> Result<SuperuserOutcome>
where
    S: UserStore,
    P: SuperuserPrompt,
{
    let username = prompt.prompt("Username")?;
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    let email = prompt.prompt("Email (optional)")?;
    let password = prompt.prompt_password("Password")?;
    let confirm = prompt.prompt_password("Confirm Password")?;

    if password != confirm {
        prompt.say("Passwords do not match");
        return Ok(SuperuserOutcome::PasswordMismatch);
    }

    let user = auth
        .register_user(
            store,
            NewUser {
                username,
                password,
                email: Some(email),
                full_name: None,
                role: UserRole::Admin,
            },
        )
        .await
        .context("Failed to create superuser")?;

    tracing::info!(username = %user.username, user_id = %user.id, "superuser created");
    prompt.say(&format!("Superuser '{}' created", user.username));
    Ok(SuperuserOutcome::Created(user))
}
