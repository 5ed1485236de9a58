use anyhow::{bail, Context, Result};
use url::Url;

use super::App;
use crate::storage::StorageError;

/// Register a new source for the current user and follow it.
pub async fn add_source(app: &App, name: &str, raw_url: &str) -> Result<()> {
    let user = app.require_user().await?;
    let url = validate_feed_url(raw_url)?;

    let source = match app.db.create_source(name, url.as_str(), user.id).await {
        Ok(source) => source,
        Err(StorageError::DuplicateKey) => {
            bail!("a source with URL '{}' is already registered", url)
        }
        Err(e) => return Err(e).context("couldn't create source"),
    };

    app.db
        .create_follow(user.id, source.id)
        .await
        .context("couldn't follow the new source")?;

    println!("Source '{}' added and followed ({}).", source.name, source.url);
    Ok(())
}

/// Print all registered sources with their owners.
pub async fn list_sources(app: &App) -> Result<()> {
    let sources = app
        .db
        .list_sources()
        .await
        .context("couldn't list sources")?;

    if sources.is_empty() {
        println!("No sources registered yet. Add one with `trawl add <name> <url>`.");
        return Ok(());
    }

    for source in sources {
        let owner = source.owner.as_deref().unwrap_or("-");
        println!("* {:<24} {} (added by {})", source.name, source.url, owner);
    }
    Ok(())
}

/// Follow an already-registered source by URL.
pub async fn follow(app: &App, raw_url: &str) -> Result<()> {
    let user = app.require_user().await?;

    let Some(source) = app
        .db
        .get_source_by_url(raw_url)
        .await
        .context("couldn't look up source")?
    else {
        bail!("no source registered with URL '{}'", raw_url);
    };

    match app.db.create_follow(user.id, source.id).await {
        Ok(()) => {
            println!("'{}' is now following '{}'.", user.name, source.name);
            Ok(())
        }
        Err(StorageError::DuplicateKey) => {
            bail!("'{}' already follows '{}'", user.name, source.name)
        }
        Err(e) => Err(e).context("couldn't create follow"),
    }
}

/// Stop following a source.
pub async fn unfollow(app: &App, raw_url: &str) -> Result<()> {
    let user = app.require_user().await?;

    let Some(source) = app
        .db
        .get_source_by_url(raw_url)
        .await
        .context("couldn't look up source")?
    else {
        bail!("no source registered with URL '{}'", raw_url);
    };

    let removed = app
        .db
        .delete_follow(user.id, source.id)
        .await
        .context("couldn't remove follow")?;

    if removed {
        println!("'{}' unfollowed '{}'.", user.name, source.name);
    } else {
        println!("'{}' was not following '{}'.", user.name, source.name);
    }
    Ok(())
}

/// List the sources the current user follows.
pub async fn following(app: &App) -> Result<()> {
    let user = app.require_user().await?;

    let names = app
        .db
        .follows_for_user(user.id)
        .await
        .context("couldn't list follows")?;

    if names.is_empty() {
        println!("'{}' is not following any sources yet.", user.name);
        return Ok(());
    }

    println!("Sources followed by '{}':", user.name);
    for name in names {
        println!("* {}", name);
    }
    Ok(())
}

fn validate_feed_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("'{}' is not a valid URL", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("unsupported URL scheme '{}': only http and https feeds can be polled", other),
    }
}
