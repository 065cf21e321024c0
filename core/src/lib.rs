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

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod models;
pub mod paginate;
pub mod throttle;
pub mod transfer;

#[cfg(test)]
mod testing;

// Re-export key items for convenience
pub use api::{LibraryApi, SpotifyLibrary};
pub use auth::{check_token_caches, connect, login};
pub use config::{AccountRole, TransferConfig};
pub use models::TransferSummary;
pub use transfer::{Accounts, Migrator, TransferError, TransferOptions};
