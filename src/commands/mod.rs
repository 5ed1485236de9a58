//! CLI command handlers.
//!
//! Each handler is a thin async fn over [`App`]: argument checks, a couple
//! of storage calls, and human-readable output. Anything that mutates data
//! resolves the current user first via [`App::require_user`].

mod browse;
mod sources;
mod users;

pub use browse::browse;
pub use sources::{add_source, follow, following, list_sources, unfollow};
pub use users::{list_users, login, register, reset};

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::storage::{Database, User};

/// Shared handler state: the open database, the loaded config, and where to
/// persist config changes.
pub struct App {
    pub db: Database,
    pub config: Config,
    pub config_path: PathBuf,
}

impl App {
    /// Resolve the logged-in user, failing with an actionable message when
    /// nobody is logged in or the configured user no longer exists.
    pub async fn require_user(&self) -> Result<User> {
        let Some(name) = self.config.current_user.as_deref() else {
            bail!("no user is logged in; run `trawl register <name>` or `trawl login <name>` first");
        };

        match self
            .db
            .get_user_by_name(name)
            .await
            .context("couldn't look up the current user")?
        {
            Some(user) => Ok(user),
            None => bail!("current user '{}' no longer exists; run `trawl register {}` again", name, name),
        }
    }
}
