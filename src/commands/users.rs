use anyhow::{bail, Context, Result};

use super::App;
use crate::storage::StorageError;

/// Create a new user and log them in.
pub async fn register(app: &mut App, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("user name must not be empty");
    }

    let user = match app.db.create_user(name).await {
        Ok(user) => user,
        Err(StorageError::DuplicateKey) => bail!("user '{}' already exists", name),
        Err(e) => return Err(e).context("couldn't create user"),
    };

    app.config
        .set_current_user(&user.name, &app.config_path)
        .context("couldn't persist current user")?;

    println!("User '{}' created and logged in.", user.name);
    Ok(())
}

/// Switch the current user to an existing one.
pub async fn login(app: &mut App, name: &str) -> Result<()> {
    let Some(user) = app
        .db
        .get_user_by_name(name)
        .await
        .context("couldn't look up user")?
    else {
        bail!("user '{}' does not exist", name);
    };

    app.config
        .set_current_user(&user.name, &app.config_path)
        .context("couldn't persist current user")?;

    println!("Logged in as '{}'.", user.name);
    Ok(())
}

/// List all users, marking the current one.
pub async fn list_users(app: &App) -> Result<()> {
    let users = app.db.list_users().await.context("couldn't list users")?;

    for user in users {
        if app.config.current_user.as_deref() == Some(user.name.as_str()) {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}

/// Delete all users (and, by cascade, all sources, follows, and entries).
pub async fn reset(app: &App) -> Result<()> {
    app.db
        .delete_users()
        .await
        .context("couldn't reset the database")?;

    println!("Database reset.");
    Ok(())
}
