use crate::api::{ApiError, LibraryApi};
use crate::auth::AuthError;
use crate::batch::{BatchWriter, LIBRARY_BATCH_SIZE, PLAYLIST_BATCH_SIZE};
use crate::config::{AccountRole, ConfigError};
use crate::models::{
    Account, FollowedArtistsReport, LikedSongsReport, NewPlaylist, Playlist, PlaylistAction,
    PlaylistOutcome, PlaylistsReport, TrackEntry, TransferSummary,
};
use crate::paginate::paginate;
use crate::throttle::Throttle;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Page size for saved tracks, followed artists and playlist listings.
pub const LIBRARY_PAGE_SIZE: u32 = 50;
/// Page size for the items of a single playlist.
pub const PLAYLIST_ITEMS_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Could not resolve the {role} account: {source}")]
    Identity { role: AccountRole, source: ApiError },
    #[error("Failed to fetch {what}: {source}")]
    Fetch { what: String, source: ApiError },
}

fn fetch_failed(what: impl Into<String>) -> impl FnOnce(ApiError) -> TransferError {
    let what = what.into();
    move |source| TransferError::Fetch { what, source }
}

/// The two accounts of a run, resolved once before any transfer starts.
#[derive(Debug, Clone)]
pub struct Accounts {
    pub source: Account,
    pub destination: Account,
}

/// Which transfers a run performs. They always run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub liked_songs: bool,
    pub followed_artists: bool,
    pub playlists: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            liked_songs: true,
            followed_artists: true,
            playlists: true,
        }
    }
}

/// IDs of the saved tracks in listing order. Rows without a track payload
/// (removed content) or without an ID (local files) are dropped.
pub fn saved_track_ids(entries: Vec<TrackEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.track?.id)
        .collect()
}

/// URIs of the playable rows of a playlist, in playlist order.
pub fn playable_uris(entries: Vec<TrackEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| entry.track?.uri)
        .collect()
}

/// Copies a library from a source session to a destination session.
pub struct Migrator {
    source: Arc<dyn LibraryApi>,
    destination: Arc<dyn LibraryApi>,
    writer: BatchWriter,
    throttle: Throttle,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn LibraryApi>,
        destination: Arc<dyn LibraryApi>,
        throttle: Throttle,
    ) -> Self {
        Self {
            source,
            destination,
            writer: BatchWriter::new(throttle),
            throttle,
        }
    }

    pub async fn resolve_accounts(&self) -> Result<Accounts, TransferError> {
        let source = self
            .source
            .current_account()
            .await
            .map_err(|source| TransferError::Identity {
                role: AccountRole::Source,
                source,
            })?;
        let destination = self
            .destination
            .current_account()
            .await
            .map_err(|source| TransferError::Identity {
                role: AccountRole::Destination,
                source,
            })?;
        Ok(Accounts {
            source,
            destination,
        })
    }

    /// Runs the selected transfers one after the other. Batch and playlist
    /// level failures end up in the summary; only a failed listing aborts.
    pub async fn run(
        &self,
        accounts: Accounts,
        options: &TransferOptions,
    ) -> Result<TransferSummary, TransferError> {
        let liked_songs = if options.liked_songs {
            Some(self.transfer_liked_songs().await?)
        } else {
            info!("Skipping liked songs");
            None
        };

        let followed_artists = if options.followed_artists {
            Some(self.transfer_followed_artists().await?)
        } else {
            info!("Skipping followed artists");
            None
        };

        let playlists = if options.playlists {
            Some(self.transfer_playlists(&accounts).await?)
        } else {
            info!("Skipping playlists");
            None
        };

        Ok(TransferSummary {
            source: accounts.source,
            destination: accounts.destination,
            liked_songs,
            followed_artists,
            playlists,
        })
    }

    /// Saving is idempotent on the service, so there is no duplicate check.
    pub async fn transfer_liked_songs(&self) -> Result<LikedSongsReport, TransferError> {
        info!("Starting liked songs transfer");
        let source = self.source.as_ref();
        let destination = self.destination.as_ref();

        let entries = paginate(LIBRARY_PAGE_SIZE, move |req| source.saved_tracks(req))
            .await
            .map_err(fetch_failed("source liked songs"))?;
        let ids = saved_track_ids(entries);
        info!("Found {} liked songs in source account", ids.len());

        let batches = self
            .writer
            .write("saved tracks", &ids, LIBRARY_BATCH_SIZE, move |chunk| {
                destination.save_tracks(chunk)
            })
            .await;

        info!("Liked songs transfer complete");
        Ok(LikedSongsReport {
            found: ids.len(),
            batches,
        })
    }

    pub async fn transfer_followed_artists(&self) -> Result<FollowedArtistsReport, TransferError> {
        info!("Starting followed artists transfer");
        let source = self.source.as_ref();
        let destination = self.destination.as_ref();

        let artists = paginate(LIBRARY_PAGE_SIZE, move |req| source.followed_artists(req))
            .await
            .map_err(fetch_failed("source followed artists"))?;
        let ids: Vec<String> = artists.into_iter().map(|a| a.id).collect();
        info!("Found {} followed artists", ids.len());

        let batches = self
            .writer
            .write("artist follows", &ids, LIBRARY_BATCH_SIZE, move |chunk| {
                destination.follow_artists(chunk)
            })
            .await;

        info!("Followed artists transfer complete");
        Ok(FollowedArtistsReport {
            found: ids.len(),
            batches,
        })
    }

    /// Re-creates owned playlists and follows everybody else's.
    ///
    /// Owned playlists whose name already exists on the destination are
    /// skipped; the name is the only duplicate key.
    pub async fn transfer_playlists(
        &self,
        accounts: &Accounts,
    ) -> Result<PlaylistsReport, TransferError> {
        info!("Starting playlists transfer");
        let source = self.source.as_ref();
        let destination = self.destination.as_ref();

        let existing: HashSet<String> =
            paginate(LIBRARY_PAGE_SIZE, move |req| destination.playlists(req))
                .await
                .map_err(fetch_failed("destination playlists"))?
                .into_iter()
                .map(|p| p.name)
                .collect();
        info!("Found {} playlists on destination account", existing.len());

        let playlists = paginate(LIBRARY_PAGE_SIZE, move |req| source.playlists(req))
            .await
            .map_err(fetch_failed("source playlists"))?;
        info!("Found {} playlists on source account to process", playlists.len());

        let total = playlists.len();
        let mut report = PlaylistsReport {
            destination_existing: existing.len(),
            outcomes: Vec::with_capacity(total),
        };

        for (i, playlist) in playlists.into_iter().enumerate() {
            info!("Processing playlist {}/{}: '{}'", i + 1, total, playlist.name);

            let action = if playlist.is_owned_by(&accounts.source.id) {
                self.copy_playlist(&playlist, &existing, &accounts.destination)
                    .await?
            } else {
                self.follow_playlist(&playlist).await
            };

            let outcome = PlaylistOutcome {
                name: playlist.name,
                action,
            };
            info!("{}", outcome);
            report.outcomes.push(outcome);

            self.throttle.wait().await;
        }

        info!("Playlists transfer complete");
        Ok(report)
    }

    async fn copy_playlist(
        &self,
        playlist: &Playlist,
        existing: &HashSet<String>,
        destination_account: &Account,
    ) -> Result<PlaylistAction, TransferError> {
        if existing.contains(&playlist.name) {
            return Ok(PlaylistAction::SkippedExisting);
        }

        let source = self.source.as_ref();
        let destination = self.destination.as_ref();

        // A failed listing must not leave an empty same-named copy behind.
        let source_id = playlist.id.as_str();
        let entries = paginate(PLAYLIST_ITEMS_PAGE_SIZE, move |req| {
            source.playlist_entries(source_id, req)
        })
        .await
        .map_err(fetch_failed(format!("tracks of playlist '{}'", playlist.name)))?;
        let uris = playable_uris(entries);

        if uris.is_empty() {
            info!("Playlist '{}' is empty, no tracks to add", playlist.name);
        }

        let description = match source.playlist_description(&playlist.id).await {
            Ok(description) => description,
            Err(e) => {
                warn!("Could not read description of '{}': {}", playlist.name, e);
                None
            }
        };

        let new = NewPlaylist::copy_of(playlist, description);
        let created = match destination
            .create_playlist(&destination_account.id, &new)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                warn!("Could not create playlist '{}': {}", playlist.name, e);
                return Ok(PlaylistAction::CreateFailed {
                    reason: e.to_string(),
                });
            }
        };
        debug!("Created playlist {} for '{}'", created.id, created.name);

        let target_id = created.id.as_str();
        let batches = self
            .writer
            .write("playlist items", &uris, PLAYLIST_BATCH_SIZE, move |chunk| {
                destination.add_playlist_items(target_id, chunk)
            })
            .await;

        Ok(PlaylistAction::Created {
            playlist_id: created.id.clone(),
            tracks: uris.len(),
            batches,
        })
    }

    /// A failure here is usually "already followed" and never aborts the run.
    async fn follow_playlist(&self, playlist: &Playlist) -> PlaylistAction {
        match self.destination.follow_playlist(&playlist.id).await {
            Ok(()) => PlaylistAction::Followed,
            Err(e) => PlaylistAction::FollowFailed {
                reason: e.to_string(),
            },
        }
    }
}
