use anyhow::{Result, anyhow};
use log::error;

use local_accounts::AccountStore;

use crate::cli::utils::password_or_prompt;

/// Handle account login
pub fn login(store: &mut AccountStore, email: &str, password: Option<&str>) -> Result<String> {
    let password = password_or_prompt(password, "Password: ")?;

    println!("Authenticating...");
    match store.login(email, &password) {
        Ok(account_id) => {
            println!("\n✅ Login successful. Account ID: {}", account_id);
            Ok(account_id)
        }
        Err(e) => {
            error!("Login failed for {}: {}", email, e);
            println!("\n❌ Login failed: {}", e);
            Err(anyhow!(e))
        }
    }
}
