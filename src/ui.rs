use anyhow::{Result, Context};
use dialoguer::{Select, Input};
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{MultiVideoPlaylist, Video};

// Lets the user pick one entry of a list
pub fn select_from_list(items: &[String], prompt: &str) -> Result<usize> {
    let selection = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .context("Failed to read selection")?;

    Ok(selection)
}

pub fn prompt_input(prompt: &str) -> Result<String> {
    let input = Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .context("Failed to read input")?;

    Ok(input)
}

// Progress over the entries of a folder
pub fn folder_progress(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub fn video_label(video: &Video) -> String {
    format!("{:>2}. {} ({} formats)", video.chapter_number, video.title, video.formats.len())
}

pub fn print_playlist(playlist: &MultiVideoPlaylist) {
    println!("{} [{}]", playlist.title, playlist.id);
    for video in &playlist.entries {
        println!("  {}", video_label(video));
        for format in &video.formats {
            println!("      {:<12} {}", format.format_id, format.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Format;

    #[test]
    fn video_label_shows_position_and_format_count() {
        let video = Video {
            id: "42".to_string(),
            title: "Einführung".to_string(),
            chapter: "Einführung".to_string(),
            chapter_number: 3,
            formats: vec![Format {
                url: "https://example.org/a.mp4".to_string(),
                format_id: "video/mp4".to_string(),
            }],
        };
        assert_eq!(video_label(&video), " 3. Einführung (1 formats)");
    }
}
