//! In-memory `LibraryApi` used by the transfer tests.

use crate::api::{ApiError, LibraryApi};
use crate::models::{Account, ArtistRef, NewPlaylist, Playlist, TrackEntry, TrackRef};
use crate::paginate::{Page, PageMarker, PageRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SavedTracks,
    Playlists,
    PlaylistEntries,
    SaveTracks,
    FollowArtists,
    CreatePlaylist,
    AddItems,
    FollowPlaylist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SaveTracks(Vec<String>),
    FollowArtists(Vec<String>),
    CreatePlaylist(NewPlaylist),
    AddItems(String, Vec<String>),
    FollowPlaylist(String),
}

#[derive(Default)]
struct State {
    saved: Vec<TrackEntry>,
    artists: Vec<ArtistRef>,
    playlists: Vec<Playlist>,
    entries: HashMap<String, Vec<TrackEntry>>,
    descriptions: HashMap<String, String>,
    followed_playlists: HashSet<String>,
    failing: HashSet<(Op, String)>,
    calls: Vec<Call>,
    next_id: usize,
}

pub struct MockLibrary {
    account: Account,
    state: Mutex<State>,
}

pub fn track(id: &str) -> TrackEntry {
    TrackEntry {
        track: Some(TrackRef {
            id: Some(id.to_string()),
            uri: Some(format!("spotify:track:{id}")),
        }),
    }
}

pub fn removed_track() -> TrackEntry {
    TrackEntry { track: None }
}

pub fn local_file() -> TrackEntry {
    TrackEntry {
        track: Some(TrackRef { id: None, uri: None }),
    }
}

pub fn playlist(id: &str, name: &str, owner_id: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        public: Some(false),
        collaborative: false,
        owner_id: owner_id.to_string(),
    }
}

fn offset_page<T: Clone>(items: &[T], request: &PageRequest) -> Page<T> {
    let start = (request.offset() as usize).min(items.len());
    let end = (start + request.limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next: (end < items.len()).then_some(PageMarker::Offset(end as u32)),
    }
}

impl MockLibrary {
    pub fn new(account_id: &str) -> Self {
        Self {
            account: Account {
                id: account_id.to_string(),
                display_name: Some(account_id.to_uppercase()),
            },
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_saved(self, entries: Vec<TrackEntry>) -> Self {
        self.state().saved = entries;
        self
    }

    pub fn with_artists(self, ids: &[&str]) -> Self {
        self.state().artists = ids
            .iter()
            .map(|id| ArtistRef { id: id.to_string() })
            .collect();
        self
    }

    pub fn with_playlist(self, playlist: Playlist, entries: Vec<TrackEntry>) -> Self {
        {
            let mut state = self.state();
            state.entries.insert(playlist.id.clone(), entries);
            state.playlists.push(playlist);
        }
        self
    }

    pub fn with_description(self, playlist_id: &str, description: &str) -> Self {
        self.state()
            .descriptions
            .insert(playlist_id.to_string(), description.to_string());
        self
    }

    /// Makes `op` fail when called for `key` (a playlist id or name), or for
    /// every call when `key` is `"*"`.
    pub fn failing(self, op: Op, key: &str) -> Self {
        self.state().failing.insert((op, key.to_string()));
        self
    }

    fn check(&self, op: Op, key: &str) -> Result<(), ApiError> {
        let state = self.state();
        if state.failing.contains(&(op, key.to_string()))
            || state.failing.contains(&(op, "*".to_string()))
        {
            return Err(ApiError::UnexpectedResponse(format!("{op:?} failed for {key}")));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.state()
            .saved
            .iter()
            .filter_map(|e| e.track.as_ref()?.id.clone())
            .collect()
    }

    pub fn artist_ids(&self) -> Vec<String> {
        self.state().artists.iter().map(|a| a.id.clone()).collect()
    }

    pub fn playlist_names(&self) -> Vec<String> {
        self.state().playlists.iter().map(|p| p.name.clone()).collect()
    }

    pub fn followed_playlists(&self) -> HashSet<String> {
        self.state().followed_playlists.clone()
    }

    pub fn entries_of(&self, name: &str) -> Vec<TrackEntry> {
        let state = self.state();
        state
            .playlists
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| state.entries.get(&p.id).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LibraryApi for MockLibrary {
    async fn current_account(&self) -> Result<Account, ApiError> {
        Ok(self.account.clone())
    }

    async fn saved_tracks(&self, request: PageRequest) -> Result<Page<TrackEntry>, ApiError> {
        self.check(Op::SavedTracks, "*")?;
        Ok(offset_page(&self.state().saved, &request))
    }

    async fn followed_artists(&self, request: PageRequest) -> Result<Page<ArtistRef>, ApiError> {
        let state = self.state();
        let start = match request.cursor() {
            Some(after) => state
                .artists
                .iter()
                .position(|a| a.id == after)
                .map_or(state.artists.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + request.limit as usize).min(state.artists.len());
        let items = state.artists[start..end].to_vec();
        let next = (end < state.artists.len())
            .then(|| items.last().map(|a| PageMarker::Cursor(a.id.clone())))
            .flatten();
        Ok(Page { items, next })
    }

    async fn playlists(&self, request: PageRequest) -> Result<Page<Playlist>, ApiError> {
        self.check(Op::Playlists, "*")?;
        Ok(offset_page(&self.state().playlists, &request))
    }

    async fn playlist_entries(
        &self,
        playlist_id: &str,
        request: PageRequest,
    ) -> Result<Page<TrackEntry>, ApiError> {
        self.check(Op::PlaylistEntries, playlist_id)?;
        let state = self.state();
        let entries = state
            .entries
            .get(playlist_id)
            .ok_or_else(|| ApiError::InvalidId(playlist_id.to_string()))?;
        Ok(offset_page(entries, &request))
    }

    async fn playlist_description(&self, playlist_id: &str) -> Result<Option<String>, ApiError> {
        Ok(self.state().descriptions.get(playlist_id).cloned())
    }

    async fn save_tracks(&self, track_ids: &[String]) -> Result<(), ApiError> {
        self.state().calls.push(Call::SaveTracks(track_ids.to_vec()));
        self.check(Op::SaveTracks, "*")?;
        let mut state = self.state();
        for id in track_ids {
            let known = state
                .saved
                .iter()
                .any(|e| e.track.as_ref().and_then(|t| t.id.as_ref()) == Some(id));
            if !known {
                state.saved.push(track(id));
            }
        }
        Ok(())
    }

    async fn follow_artists(&self, artist_ids: &[String]) -> Result<(), ApiError> {
        self.state().calls.push(Call::FollowArtists(artist_ids.to_vec()));
        self.check(Op::FollowArtists, "*")?;
        let mut state = self.state();
        for id in artist_ids {
            if !state.artists.iter().any(|a| &a.id == id) {
                state.artists.push(ArtistRef { id: id.clone() });
            }
        }
        Ok(())
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        new: &NewPlaylist,
    ) -> Result<Playlist, ApiError> {
        self.state().calls.push(Call::CreatePlaylist(new.clone()));
        self.check(Op::CreatePlaylist, &new.name)?;
        let mut state = self.state();
        state.next_id += 1;
        let created = Playlist {
            id: format!("{}-created-{}", self.account.id, state.next_id),
            name: new.name.clone(),
            public: new.public,
            collaborative: new.collaborative,
            owner_id: owner_id.to_string(),
        };
        state.entries.insert(created.id.clone(), Vec::new());
        state.playlists.push(created.clone());
        Ok(created)
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ApiError> {
        self.state()
            .calls
            .push(Call::AddItems(playlist_id.to_string(), uris.to_vec()));
        self.check(Op::AddItems, playlist_id)?;
        let mut state = self.state();
        let entries = state
            .entries
            .get_mut(playlist_id)
            .ok_or_else(|| ApiError::InvalidId(playlist_id.to_string()))?;
        entries.extend(uris.iter().map(|uri| TrackEntry {
            track: Some(TrackRef {
                id: uri.rsplit(':').next().map(str::to_string),
                uri: Some(uri.clone()),
            }),
        }));
        Ok(())
    }

    async fn follow_playlist(&self, playlist_id: &str) -> Result<(), ApiError> {
        self.state()
            .calls
            .push(Call::FollowPlaylist(playlist_id.to_string()));
        self.check(Op::FollowPlaylist, playlist_id)?;
        self.state()
            .followed_playlists
            .insert(playlist_id.to_string());
        Ok(())
    }
}
