use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod content_group;
mod error;
mod extractor;
mod fetcher;
mod folder;
mod models;
mod player;
mod ui;
mod utils;

use config::Config;
use extractor::{SITE_BASE, extract, resolve_folder, resolve_reference};
use fetcher::HttpFetcher;
use models::{Extraction, FolderPlaylist, MultiVideoPlaylist};
use player::play_with_mpv;
use ui::select_from_list;

#[derive(Parser)]
#[command(name = "studon-dl", version, about = "Extract H5P videos from StudOn content groups and folders")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Content group or folder URL
    url: Option<String>,

    /// Cookie header of a logged-in session (overrides the stored one)
    #[arg(short, long, env = "STUDON_COOKIE")]
    cookie: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Resolve every content group linked from a folder
    #[arg(short, long)]
    resolve: bool,

    /// Pick one content group of a folder interactively
    #[arg(short, long)]
    select: bool,

    /// Play a video of the result with mpv
    #[arg(short, long)]
    play: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the session cookie in the config file
    SetCookie { cookie: String },

    /// Remove the stored session cookie
    ClearCookie,

    /// Show the config file location and contents
    ShowConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "studon_dl=debug,warn" } else { "studon_dl=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Some(Commands::SetCookie { cookie }) => {
            let mut config = Config::load()?;
            config.cookie = Some(cookie.trim().to_string());
            config.save()?;
            println!("Session cookie saved to {}", config::config_path()?.display());
            return Ok(());
        }
        Some(Commands::ClearCookie) => {
            let mut config = Config::load()?;
            config.cookie = None;
            config.save()?;
            println!("Session cookie removed");
            return Ok(());
        }
        Some(Commands::ShowConfig) => {
            let config = Config::load()?;
            println!("Config file: {}", config::config_path()?.display());
            println!("Cookie: {}", if config.cookie.is_some() { "set" } else { "not set" });
            println!("User agent: {}", config.user_agent);
            println!("Timeout: {}s", config.timeout_secs);
            return Ok(());
        }
        None => {}
    }

    let config = Config::load()?.with_cookie(cli.cookie.clone());

    let url = match &cli.url {
        Some(url) => url.clone(),
        None => ui::prompt_input("StudOn URL")?,
    };

    let fetcher = HttpFetcher::new(&config, SITE_BASE)?;
    let extraction = extract(&fetcher, url.trim())
        .await
        .with_context(|| format!("Failed to extract {}", url))?;

    match extraction {
        Extraction::MultiVideo(playlist) => show_group(&cli, &config, &playlist)?,
        Extraction::Folder(folder) => {
            if cli.select {
                if folder.entries.is_empty() {
                    return Err(anyhow!("Folder \"{}\" contains no H5P content", folder.title));
                }
                let labels: Vec<String> = folder.entries.iter()
                    .map(|entry| format!("H5P {} ({})", entry.id, entry.url))
                    .collect();
                let index = select_from_list(&labels, "Select content:")?;
                let playlist = resolve_reference(&fetcher, &folder.entries[index]).await?;
                show_group(&cli, &config, &playlist)?;
            } else if cli.resolve {
                let progress = ui::folder_progress(folder.entries.len());
                let groups = resolve_folder(&fetcher, &folder, |entry| {
                    progress.set_message(format!("H5P {}", entry.id));
                    progress.inc(1);
                })
                .await;
                progress.finish_and_clear();
                let groups = groups?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&groups)?);
                } else {
                    println!("{}", folder.title);
                    groups.iter().for_each(ui::print_playlist);
                }
            } else {
                show_folder(&cli, &folder)?;
            }
        }
    }

    Ok(())
}

fn show_group(cli: &Cli, config: &Config, playlist: &MultiVideoPlaylist) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&Extraction::MultiVideo(playlist.clone()))?);
    } else {
        ui::print_playlist(playlist);
    }

    if cli.play {
        let index = match playlist.entries.len() {
            0 => return Err(anyhow!("Content group {} has no videos", playlist.id)),
            1 => 0,
            _ => {
                let labels: Vec<String> = playlist.entries.iter().map(ui::video_label).collect();
                select_from_list(&labels, "Select video:")?
            }
        };
        play_with_mpv(&playlist.entries[index], config.cookie.as_deref())?;
    }
    Ok(())
}

fn show_folder(cli: &Cli, folder: &FolderPlaylist) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&Extraction::Folder(folder.clone()))?);
    } else {
        println!("{}", folder.title);
        for entry in &folder.entries {
            println!("  H5P {:<10} {}", entry.id, entry.url);
        }
    }
    Ok(())
}
