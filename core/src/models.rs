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

use serde::{Deserialize, Serialize};
use std::fmt;

/// The account a session is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: Option<String>,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// A track (or episode) as referenced from a library or a playlist.
/// Local files carry neither an ID nor a URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: Option<String>,
    pub uri: Option<String>,
}

/// One row of a saved-tracks or playlist-items listing. The service returns
/// rows without a track payload for content that has been removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
}

/// A playlist as listed in a user's library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub public: Option<bool>,
    pub collaborative: bool,
    pub owner_id: String,
}

impl Playlist {
    pub fn is_owned_by(&self, account_id: &str) -> bool {
        self.owner_id == account_id
    }
}

/// Payload for creating a copy of a playlist on another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlaylist {
    pub name: String,
    pub public: Option<bool>,
    pub collaborative: bool,
    pub description: Option<String>,
}

impl NewPlaylist {
    pub fn copy_of(playlist: &Playlist, description: Option<String>) -> Self {
        Self {
            name: playlist.name.clone(),
            public: playlist.public,
            collaborative: playlist.collaborative,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason")]
pub enum BatchStatus {
    Success,
    Failed(String),
}

/// Result of a single chunk write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_index: usize,
    pub items_count: usize,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }
}

/// Per-chunk results of one batched write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub batches: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: BatchOutcome) {
        self.batches.push(outcome);
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| !b.is_success()).count()
    }

    /// Number of items that went out in batches the service accepted.
    pub fn items_written(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_success())
            .map(|b| b.items_count)
            .sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikedSongsReport {
    pub found: usize,
    pub batches: BatchReport,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowedArtistsReport {
    pub found: usize,
    pub batches: BatchReport,
}

/// What happened to one source playlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlaylistAction {
    Created {
        playlist_id: String,
        tracks: usize,
        batches: BatchReport,
    },
    SkippedExisting,
    CreateFailed {
        reason: String,
    },
    Followed,
    /// Usually the destination already follows the playlist.
    FollowFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOutcome {
    pub name: String,
    pub action: PlaylistAction,
}

impl fmt::Display for PlaylistOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            PlaylistAction::Created {
                tracks, batches, ..
            } => {
                write!(f, "[CREATED] '{}' ({} tracks", self.name, tracks)?;
                match batches.failed_batches() {
                    0 => write!(f, ")"),
                    n => write!(f, ", {} failed batches)", n),
                }
            }
            PlaylistAction::SkippedExisting => write!(
                f,
                "[SKIPPED] '{}' already exists on the destination account",
                self.name
            ),
            PlaylistAction::CreateFailed { reason } => {
                write!(f, "[ERROR] '{}' could not be created: {}", self.name, reason)
            }
            PlaylistAction::Followed => write!(f, "[FOLLOWED] '{}'", self.name),
            PlaylistAction::FollowFailed { reason } => write!(
                f,
                "[INFO] '{}' could not be followed (maybe already followed?): {}",
                self.name, reason
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistsReport {
    pub destination_existing: usize,
    pub outcomes: Vec<PlaylistOutcome>,
}

impl PlaylistsReport {
    pub fn count(&self, pred: impl Fn(&PlaylistAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

/// Everything a `run` did, in the order it was done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub source: Account,
    pub destination: Account,
    pub liked_songs: Option<LikedSongsReport>,
    pub followed_artists: Option<FollowedArtistsReport>,
    pub playlists: Option<PlaylistsReport>,
}
