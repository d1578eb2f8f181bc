//! Register command implementation

use anyhow::{bail, Result};

use super::app::App;

/// Register a user (or toggle an existing one) for local operation
pub async fn register_command(app: &App, username: &str, deactivate: bool) -> Result<()> {
    let users = app.store.users();

    if deactivate {
        let Some(canonical) = users.canonical_name(username)? else {
            bail!("Unknown user: {}", username);
        };
        users.set_active(&canonical, false)?;
        println!("Deactivated: {}", canonical);
        return Ok(());
    }

    if username.trim().is_empty() {
        bail!("Username must not be empty");
    }
    let canonical = users.register(username)?;
    users.set_active(&canonical, true)?;
    if canonical != username.trim() {
        println!("Already registered as {}", canonical);
    } else {
        println!("Registered: {}", canonical);
    }
    Ok(())
}
