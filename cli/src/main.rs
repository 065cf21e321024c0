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

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;
use transfer_core::models::{PlaylistAction, TransferSummary};
use transfer_core::{
    check_token_caches, connect, login, AccountRole, LibraryApi, Migrator, SpotifyLibrary,
    TransferConfig, TransferOptions,
};

#[derive(Parser)]
#[command(name = "spotify-transfer")]
#[command(
    version,
    about = "Moves liked songs, followed artists and playlists between two Spotify accounts",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copies the source account's library into the destination account
    Run {
        /// Output the transfer report to a JSON file (e.g., --json=report.json)
        #[arg(long)]
        json: Option<String>,
        /// Do not transfer liked songs
        #[arg(long)]
        skip_liked: bool,
        /// Do not transfer followed artists
        #[arg(long)]
        skip_artists: bool,
        /// Do not transfer playlists
        #[arg(long)]
        skip_playlists: bool,
    },
    /// Logs in one account and caches its token for later runs
    Login {
        /// Which account to log in: 'source' or 'destination'
        #[arg(value_name = "ROLE")]
        role: AccountRole,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // No .env file, rely on the environment
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            json,
            skip_liked,
            skip_artists,
            skip_playlists,
        } => {
            let options = TransferOptions {
                liked_songs: !skip_liked,
                followed_artists: !skip_artists,
                playlists: !skip_playlists,
            };
            handle_run(json.as_deref(), options).await;
        }
        Commands::Login { role } => {
            handle_login(*role).await;
        }
    }
}

fn load_config() -> TransferConfig {
    match TransferConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            process::exit(1);
        }
    }
}

async fn handle_login(role: AccountRole) {
    let config = load_config();

    println!("--- Spotify Token Generation ---");
    println!(
        "A browser window will now open. Please log in with your {} account.",
        role.to_string().to_uppercase()
    );

    let spotify = match login(&config, role).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!();
            eprintln!("An error occurred during authentication: {}", e);
            process::exit(1);
        }
    };

    match SpotifyLibrary::new(spotify).current_account().await {
        Ok(account) => {
            println!();
            println!("Successfully authenticated as: {}", account);
            println!(
                "Token cached in '{}' for the {} account.",
                config.cache_path(role).display(),
                role
            );
        }
        Err(e) => {
            eprintln!();
            eprintln!("Logged in, but could not read the account profile: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_run(json_path: Option<&str>, options: TransferOptions) {
    let config = load_config();
    debug!("Running with {:?}", options);

    if let Err(e) = check_token_caches(&config) {
        eprintln!("[ERROR] {}", e);
        process::exit(1);
    }

    println!("Authenticating accounts...");
    let source = match connect(&config, AccountRole::Source).await {
        Ok(s) => s,
        Err(e) => auth_failure(e),
    };
    let destination = match connect(&config, AccountRole::Destination).await {
        Ok(s) => s,
        Err(e) => auth_failure(e),
    };

    let migrator = Migrator::new(
        Arc::new(SpotifyLibrary::new(source)),
        Arc::new(SpotifyLibrary::new(destination)),
        config.throttle,
    );

    let accounts = match migrator.resolve_accounts().await {
        Ok(accounts) => accounts,
        Err(e) => auth_failure(e),
    };
    println!("Successfully authenticated!");
    println!("  Source account:      {}", accounts.source);
    println!("  Destination account: {}", accounts.destination);
    println!(
        "  Request delay:       {} ms",
        config.throttle.delay().as_millis()
    );

    match migrator.run(accounts, &options).await {
        Ok(summary) => {
            print_summary(&summary);

            if let Some(path) = json_path {
                match write_report(path, &summary) {
                    Ok(()) => {
                        println!();
                        println!("[SAVED] Report saved to: {}", path);
                    }
                    Err(e) => {
                        eprintln!();
                        eprintln!("[ERROR] {:#}", e);
                    }
                }
            }

            println!();
            println!("##################################");
            println!("###      TRANSFER FINISHED     ###");
            println!("##################################");
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Transfer aborted: {}", e);
            process::exit(1);
        }
    }
}

fn auth_failure(e: impl std::fmt::Display) -> ! {
    eprintln!("Error during authentication: {}", e);
    eprintln!("Your cache files might be invalid. Try deleting them and running 'login' again.");
    process::exit(1);
}

fn write_report(path: &str, summary: &TransferSummary) -> anyhow::Result<()> {
    let json_content = serde_json::to_string_pretty(summary)?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    file.write_all(json_content.as_bytes())
        .with_context(|| format!("Failed to write report to '{}'", path))?;
    Ok(())
}

fn print_summary(summary: &TransferSummary) {
    println!();
    println!("---------------------------------------------------");
    println!("TRANSFER REPORT");
    println!("---------------------------------------------------");
    println!("Source:        {}", summary.source);
    println!("Destination:   {}", summary.destination);
    println!("---------------------------------------------------");

    match &summary.liked_songs {
        Some(r) => println!(
            "Liked Songs:      {} found, {} saved, {} failed batches",
            r.found,
            r.batches.items_written(),
            r.batches.failed_batches()
        ),
        None => println!("Liked Songs:      skipped"),
    }

    match &summary.followed_artists {
        Some(r) => println!(
            "Followed Artists: {} found, {} followed, {} failed batches",
            r.found,
            r.batches.items_written(),
            r.batches.failed_batches()
        ),
        None => println!("Followed Artists: skipped"),
    }

    match &summary.playlists {
        Some(r) => {
            let created = r.count(|a| matches!(a, PlaylistAction::Created { .. }));
            let skipped = r.count(|a| matches!(a, PlaylistAction::SkippedExisting));
            let followed = r.count(|a| matches!(a, PlaylistAction::Followed));
            let failed = r.count(|a| {
                matches!(
                    a,
                    PlaylistAction::CreateFailed { .. } | PlaylistAction::FollowFailed { .. }
                )
            });
            println!(
                "Playlists:        {} created, {} skipped, {} followed, {} not transferred",
                created, skipped, followed, failed
            );
            println!("---------------------------------------------------");

            if !r.outcomes.is_empty() {
                println!();
                for (i, outcome) in r.outcomes.iter().enumerate() {
                    println!("{}. {}", i + 1, outcome);
                }
            }
        }
        None => {
            println!("Playlists:        skipped");
            println!("---------------------------------------------------");
        }
    }
}
