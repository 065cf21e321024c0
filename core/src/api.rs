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

//! The remote-API boundary of a transfer.
//!
//! [`LibraryApi`] is everything a transfer needs from one account session.
//! [`SpotifyLibrary`] implements it on top of an authenticated
//! `AuthCodeSpotify`, normalising the service's offset and cursor pages into
//! [`Page`]s and its typed IDs into plain strings.

use crate::models::{Account, ArtistRef, NewPlaylist, Playlist, TrackEntry, TrackRef};
use crate::paginate::{Page, PageMarker, PageRequest};
use async_trait::async_trait;
use log::debug;
use rspotify::{
    model::{
        ArtistId, CursorBasedPage, EpisodeId, FullPlaylist, PlayableId, PlayableItem, PlaylistId,
        SimplifiedPlaylist, TrackId, UserId,
    },
    prelude::*,
    AuthCodeSpotify,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Invalid Spotify ID: {0}")]
    InvalidId(String),
    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),
    #[error("Malformed API response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads and writes against one account's library.
///
/// Listing methods take a [`PageRequest`]; fetching the next page is the same
/// call with the marker returned by the previous page. Write methods take at
/// most one batch worth of items, splitting is the caller's job.
#[async_trait]
pub trait LibraryApi: Send + Sync {
    async fn current_account(&self) -> Result<Account, ApiError>;

    async fn saved_tracks(&self, request: PageRequest) -> Result<Page<TrackEntry>, ApiError>;

    /// Cursor-paged.
    async fn followed_artists(&self, request: PageRequest) -> Result<Page<ArtistRef>, ApiError>;

    async fn playlists(&self, request: PageRequest) -> Result<Page<Playlist>, ApiError>;

    async fn playlist_entries(
        &self,
        playlist_id: &str,
        request: PageRequest,
    ) -> Result<Page<TrackEntry>, ApiError>;

    async fn playlist_description(&self, playlist_id: &str) -> Result<Option<String>, ApiError>;

    async fn save_tracks(&self, track_ids: &[String]) -> Result<(), ApiError>;

    async fn follow_artists(&self, artist_ids: &[String]) -> Result<(), ApiError>;

    async fn create_playlist(
        &self,
        owner_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<Playlist, ApiError>;

    async fn add_playlist_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError>;

    async fn follow_playlist(&self, playlist_id: &str) -> Result<(), ApiError>;
}

pub struct SpotifyLibrary {
    spotify: Arc<AuthCodeSpotify>,
}

impl SpotifyLibrary {
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        Self {
            spotify: Arc::new(spotify),
        }
    }
}

fn offset_page<T, U>(page: rspotify::model::Page<T>, map: impl FnMut(T) -> U) -> Page<U> {
    // The service's `next` URL always advances by the requested limit.
    let next = page
        .next
        .as_ref()
        .map(|_| PageMarker::Offset(page.offset + page.limit));
    Page {
        items: page.items.into_iter().map(map).collect(),
        next,
    }
}

fn cursor_page<T, U>(
    page: CursorBasedPage<T>,
    map: impl FnMut(T) -> U,
) -> Result<Page<U>, ApiError> {
    let next = match page.next {
        None => None,
        Some(url) => {
            let after = page
                .cursors
                .and_then(|c| c.after)
                .ok_or_else(|| {
                    ApiError::UnexpectedResponse(format!("next page {url} without cursor"))
                })?;
            Some(PageMarker::Cursor(after))
        }
    };
    Ok(Page {
        items: page.items.into_iter().map(map).collect(),
        next,
    })
}

fn playlist_from_simplified(pl: SimplifiedPlaylist) -> Playlist {
    Playlist {
        id: pl.id.id().to_string(),
        name: pl.name,
        public: pl.public,
        collaborative: pl.collaborative,
        owner_id: pl.owner.id.id().to_string(),
    }
}

fn playlist_from_full(pl: FullPlaylist) -> Playlist {
    Playlist {
        id: pl.id.id().to_string(),
        name: pl.name,
        public: pl.public,
        collaborative: pl.collaborative,
        owner_id: pl.owner.id.id().to_string(),
    }
}

/// A `me/tracks` row. rspotify's `SavedTrack` requires a track object, but
/// the service sends `"track": null` for removed content.
#[derive(Deserialize)]
struct SavedTrackRow {
    track: Option<SavedTrackBody>,
}

#[derive(Deserialize)]
struct SavedTrackBody {
    id: Option<String>,
    uri: Option<String>,
}

fn saved_tracks_page(body: &str) -> Result<Page<TrackEntry>, ApiError> {
    let page: rspotify::model::Page<SavedTrackRow> = serde_json::from_str(body)?;
    Ok(offset_page(page, |row| TrackEntry {
        track: row.track.map(|t| TrackRef { id: t.id, uri: t.uri }),
    }))
}

fn track_ref(id: Option<TrackId<'_>>) -> TrackRef {
    TrackRef {
        id: id.as_ref().map(|id| id.id().to_string()),
        uri: id.as_ref().map(|id| id.uri()),
    }
}

fn playlist_id(id: &str) -> Result<PlaylistId<'_>, ApiError> {
    PlaylistId::from_id(id).map_err(|_| ApiError::InvalidId(id.to_string()))
}

/// Playlists hold both tracks and podcast episodes.
fn playable_id(uri: &str) -> Result<PlayableId<'static>, ApiError> {
    if let Ok(id) = TrackId::from_uri(uri) {
        return Ok(PlayableId::Track(id.into_static()));
    }
    EpisodeId::from_uri(uri)
        .map(|id| PlayableId::Episode(id.into_static()))
        .map_err(|_| ApiError::InvalidId(uri.to_string()))
}

#[async_trait]
impl LibraryApi for SpotifyLibrary {
    async fn current_account(&self) -> Result<Account, ApiError> {
        let user = self.spotify.me().await?;
        Ok(Account {
            id: user.id.id().to_string(),
            display_name: user.display_name,
        })
    }

    async fn saved_tracks(&self, request: PageRequest) -> Result<Page<TrackEntry>, ApiError> {
        let limit = request.limit.to_string();
        let offset = request.offset().to_string();
        let params = HashMap::from([("limit", limit.as_str()), ("offset", offset.as_str())]);
        let body = self.spotify.api_get("me/tracks", &params).await?;
        saved_tracks_page(&body)
    }

    async fn followed_artists(&self, request: PageRequest) -> Result<Page<ArtistRef>, ApiError> {
        let page = self
            .spotify
            .current_user_followed_artists(request.cursor(), Some(request.limit))
            .await?;
        cursor_page(page, |artist| ArtistRef {
            id: artist.id.id().to_string(),
        })
    }

    async fn playlists(&self, request: PageRequest) -> Result<Page<Playlist>, ApiError> {
        let page = self
            .spotify
            .current_user_playlists_manual(Some(request.limit), Some(request.offset()))
            .await?;
        Ok(offset_page(page, playlist_from_simplified))
    }

    async fn playlist_entries(
        &self,
        playlist_id_str: &str,
        request: PageRequest,
    ) -> Result<Page<TrackEntry>, ApiError> {
        let page = self
            .spotify
            .playlist_items_manual(
                playlist_id(playlist_id_str)?,
                None,
                None,
                Some(request.limit),
                Some(request.offset()),
            )
            .await?;
        Ok(offset_page(page, |item| TrackEntry {
            track: match item.track {
                Some(PlayableItem::Track(track)) => Some(track_ref(track.id)),
                Some(PlayableItem::Episode(episode)) => Some(TrackRef {
                    id: Some(episode.id.id().to_string()),
                    uri: Some(episode.id.uri()),
                }),
                _ => None,
            },
        }))
    }

    async fn playlist_description(
        &self,
        playlist_id_str: &str,
    ) -> Result<Option<String>, ApiError> {
        let playlist = self
            .spotify
            .playlist(playlist_id(playlist_id_str)?, None, None)
            .await?;
        Ok(playlist.description.filter(|d| !d.is_empty()))
    }

    async fn save_tracks(&self, track_ids: &[String]) -> Result<(), ApiError> {
        let ids = track_ids
            .iter()
            .map(|id| {
                TrackId::from_id(id.clone()).map_err(|_| ApiError::InvalidId(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Saving {} tracks", ids.len());
        self.spotify.current_user_saved_tracks_add(ids).await?;
        Ok(())
    }

    async fn follow_artists(&self, artist_ids: &[String]) -> Result<(), ApiError> {
        let ids = artist_ids
            .iter()
            .map(|id| {
                ArtistId::from_id(id.clone()).map_err(|_| ApiError::InvalidId(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Following {} artists", ids.len());
        self.spotify.user_follow_artists(ids).await?;
        Ok(())
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<Playlist, ApiError> {
        let user_id =
            UserId::from_id(owner_id).map_err(|_| ApiError::InvalidId(owner_id.to_string()))?;
        let created = self
            .spotify
            .user_playlist_create(
                user_id,
                &playlist.name,
                playlist.public,
                Some(playlist.collaborative),
                playlist.description.as_deref(),
            )
            .await?;
        Ok(playlist_from_full(created))
    }

    async fn add_playlist_items(
        &self,
        playlist_id_str: &str,
        uris: &[String],
    ) -> Result<(), ApiError> {
        let items = uris
            .iter()
            .map(|uri| playable_id(uri))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Adding {} items to playlist {}", items.len(), playlist_id_str);
        self.spotify
            .playlist_add_items(playlist_id(playlist_id_str)?, items, None)
            .await?;
        Ok(())
    }

    async fn follow_playlist(&self, playlist_id_str: &str) -> Result<(), ApiError> {
        self.spotify
            .playlist_follow(playlist_id(playlist_id_str)?, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playable_id_accepts_tracks_and_episodes() {
        assert!(matches!(
            playable_id("spotify:track:4iV5W9uYEdYUVa79Axb7Rh"),
            Ok(PlayableId::Track(_))
        ));
        assert!(matches!(
            playable_id("spotify:episode:512ojhOuo1ktJprKbVcKyQ"),
            Ok(PlayableId::Episode(_))
        ));
        assert!(matches!(
            playable_id("spotify:local:Artist:Album:Song:215"),
            Err(ApiError::InvalidId(_))
        ));
    }

    #[test]
    fn test_track_ref_keeps_bare_id_and_uri() {
        let id = TrackId::from_id("4iV5W9uYEdYUVa79Axb7Rh").unwrap();
        let track = track_ref(Some(id));

        assert_eq!(track.id.as_deref(), Some("4iV5W9uYEdYUVa79Axb7Rh"));
        assert_eq!(
            track.uri.as_deref(),
            Some("spotify:track:4iV5W9uYEdYUVa79Axb7Rh")
        );
        assert_eq!(track_ref(None), TrackRef { id: None, uri: None });
    }

    #[test]
    fn test_saved_tracks_page_keeps_null_track_rows() {
        let body = r#"{
            "href": "https://api.spotify.com/v1/me/tracks?offset=0&limit=3",
            "items": [
                {"added_at": "2024-01-01T00:00:00Z",
                 "track": {"id": "aaa", "uri": "spotify:track:aaa", "name": "A"}},
                {"added_at": "2024-01-02T00:00:00Z", "track": null},
                {"added_at": "2024-01-03T00:00:00Z",
                 "track": {"id": "ccc", "uri": "spotify:track:ccc", "name": "C"}}
            ],
            "limit": 3,
            "next": "https://api.spotify.com/v1/me/tracks?offset=3&limit=3",
            "offset": 0,
            "previous": null,
            "total": 7
        }"#;

        let page = saved_tracks_page(body).unwrap();

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].track.as_ref().unwrap().id.as_deref(), Some("aaa"));
        assert_eq!(page.items[1].track, None);
        assert_eq!(
            page.items[2].track.as_ref().unwrap().uri.as_deref(),
            Some("spotify:track:ccc")
        );
        assert_eq!(page.next, Some(PageMarker::Offset(3)));
    }

    #[test]
    fn test_saved_tracks_last_page_has_no_marker() {
        let body = r#"{"href": "", "items": [{"track": null}], "limit": 50,
            "next": null, "offset": 50, "previous": null, "total": 51}"#;

        let page = saved_tracks_page(body).unwrap();
        assert_eq!(page, Page::last(vec![TrackEntry { track: None }]));
    }

    #[test]
    fn test_invalid_playlist_id_is_reported() {
        assert!(matches!(
            playlist_id("not a playlist id!"),
            Err(ApiError::InvalidId(_))
        ));
    }
}
