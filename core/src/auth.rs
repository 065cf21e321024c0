/*
    spotify-transfer-rs | Rust CLI tool to move a Spotify library between accounts.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::config::{AccountRole, TransferConfig};
use log::{debug, info};
use rspotify::{prelude::*, AuthCodeSpotify, Config, Credentials, OAuth};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "No cached token for the {role} account at '{}'. Run `transfer-cli login {role}` first.",
        .path.display()
    )]
    MissingCache { role: AccountRole, path: PathBuf },
    #[error("Cached token for the {0} account is unreadable. Delete it and log in again.")]
    InvalidCache(AccountRole),
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
}

/// Fails if either account's token cache is missing. Nothing touches the
/// network before this passes.
pub fn check_token_caches(config: &TransferConfig) -> Result<(), AuthError> {
    for role in [AccountRole::Source, AccountRole::Destination] {
        let path = config.cache_path(role);
        if !path.is_file() {
            return Err(AuthError::MissingCache {
                role,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Builds an unauthenticated client whose token cache is the file for `role`.
fn client_for(config: &TransferConfig, role: AccountRole) -> AuthCodeSpotify {
    let creds = Credentials::new(&config.client_id, &config.client_secret);

    let oauth = OAuth {
        redirect_uri: config.redirect_uri.clone(),
        scopes: config
            .scopes
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        ..Default::default()
    };

    // Expired tokens are refreshed transparently and written back to the cache.
    let spotify_config = Config {
        token_cached: true,
        token_refreshing: true,
        cache_path: config.cache_path(role).to_path_buf(),
        ..Default::default()
    };

    AuthCodeSpotify::with_config(creds, oauth, spotify_config)
}

/// Opens a session for `role` from its cached token, without any user
/// interaction.
pub async fn connect(
    config: &TransferConfig,
    role: AccountRole,
) -> Result<AuthCodeSpotify, AuthError> {
    let path = config.cache_path(role);
    if !path.is_file() {
        return Err(AuthError::MissingCache {
            role,
            path: path.to_path_buf(),
        });
    }

    let spotify = client_for(config, role);
    // Accept an expired token: the refresh token inside it is still good.
    let token = spotify
        .read_token_cache(true)
        .await
        .map_err(|_| AuthError::InvalidCache(role))?
        .ok_or(AuthError::InvalidCache(role))?;

    {
        let mut slot = spotify
            .token
            .lock()
            .await
            .map_err(|_| AuthError::InvalidCache(role))?;
        *slot = Some(token);
    }

    debug!("Loaded {} token from {}", role, path.display());
    Ok(spotify)
}

/// Runs the Authorization Code flow for `role` and stores the resulting token
/// in that role's cache file.
///
/// The authorization URL is opened in the browser when possible, otherwise it
/// is printed, and the redirect URL is read back from stdin.
pub async fn login(
    config: &TransferConfig,
    role: AccountRole,
) -> Result<AuthCodeSpotify, AuthError> {
    let spotify = client_for(config, role);

    let url = spotify.get_authorize_url(false)?;
    spotify.prompt_for_token(&url).await?;

    info!(
        "Stored {} token in {}",
        role,
        config.cache_path(role).display()
    );
    Ok(spotify)
}
