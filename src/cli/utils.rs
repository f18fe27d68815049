use anyhow::{Result, Context};
use std::io::{self, Write};

use local_accounts::user::password_requirements;

/// Read a line of input from the terminal
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read from stdin")?;

    // Trim the line ending only; passwords may contain spaces
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Read a password from the terminal without echoing it.
///
/// Scripts without a terminal should pass `--password` instead.
pub fn read_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password from the terminal")
}

/// Use the password given on the command line, or prompt for one
pub fn password_or_prompt(given: Option<&str>, prompt: &str) -> Result<String> {
    match given {
        Some(password) => Ok(password.to_string()),
        None => read_password(prompt),
    }
}

/// Prompt for a new password twice and require both entries to match
pub fn read_new_password(prompt: &str) -> Result<String> {
    let password = read_password(prompt)?;
    if password.is_empty() {
        return Ok(password);
    }

    let confirmation = read_password("Confirm password: ")?;
    if password != confirmation {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

/// Print the strength rules `password` does not meet
pub fn display_password_hints(password: &str) {
    for requirement in password_requirements(password) {
        println!("  - {}", requirement);
    }
}
