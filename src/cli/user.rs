use anyhow::{Result, anyhow};
use log::error;
use std::path::Path;

use local_accounts::config::{self, Config};
use local_accounts::{validate_password, AccountError, AccountStore};

use crate::cli::auth;
use crate::cli::utils::{display_password_hints, password_or_prompt, read_new_password};

/// Handle account registration
pub fn register(store: &mut AccountStore, email: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(password) => password.to_string(),
        None => read_new_password("Password: ")?,
    };

    match store.register(email, &password) {
        Ok(account_id) => {
            println!("\n✅ Account registered. Account ID: {}", account_id);
            Ok(())
        }
        Err(e) => {
            error!("Registration failed for {}: {}", email, e);
            println!("\n❌ Registration failed: {}", e);
            if matches!(e, AccountError::WeakPassword) {
                display_password_hints(&password);
            }
            Err(anyhow!(e))
        }
    }
}

/// Handle a profile update: log in with the current password, then change
/// the email and, unless left blank, the password
pub fn update(
    store: &mut AccountStore,
    email: &str,
    new_email: Option<&str>,
    current_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<()> {
    let current = password_or_prompt(current_password, "Current password: ")?;
    auth::login(store, email, Some(&current))?;

    let new_password = match new_password {
        Some(password) => password.to_string(),
        None => read_new_password("New password (leave blank to keep current): ")?,
    };
    let new_email = new_email.unwrap_or(email);

    if new_email == email && new_password.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    let new_password = Some(new_password.as_str()).filter(|p| !p.is_empty());
    match store.update_account(email, new_email, new_password) {
        Ok(_) => {
            println!("\n✅ Profile updated for {}", new_email);
            Ok(())
        }
        Err(e) => {
            error!("Profile update failed for {}: {}", email, e);
            println!("\n❌ Update failed: {}", e);
            if let Some(password) = new_password.filter(|p| !validate_password(p)) {
                display_password_hints(password);
            }
            Err(anyhow!(e))
        }
    }
}

/// Show the profile of an account after logging in
pub fn show(store: &mut AccountStore, email: &str, password: Option<&str>) -> Result<()> {
    auth::login(store, email, password)?;

    let profile = store
        .profile(email)
        .ok_or_else(|| anyhow!("Account disappeared after login: {}", email))?;

    println!("\nEmail:      {}", profile.email);
    println!("Account ID: {}", profile.id);
    println!("Created:    {}", profile.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

/// Write a default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!("{} already exists; use --force to overwrite", path.display()));
    }

    config::save_config(path, &Config::default())?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
