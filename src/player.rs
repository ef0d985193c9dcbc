use anyhow::{anyhow, Result, Context};
use std::path::Path;
use std::process::Command;
use tracing::info;

use crate::models::{Format, Video};

// Arguments handing one format of a video to mpv
fn mpv_args(video: &Video, format: &Format, cookie: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "--force-window=yes".to_string(),
        "--ytdl=no".to_string(),
        format!("--force-media-title={}", video.title),
    ];

    // Media files are only served to the logged-in session
    if let Some(cookie) = cookie {
        args.push(format!("--http-header-fields=Cookie: {}", cookie));
    }

    args.push(format.url.clone());
    args
}

pub fn play_with_mpv(video: &Video, cookie: Option<&str>) -> Result<()> {
    let format = video
        .formats
        .first()
        .ok_or_else(|| anyhow!("Video {} has no playable format", video.id))?;

    let mpv_path = find_mpv()?;
    info!(video = %video.id, url = %format.url, "starting mpv");

    let status = Command::new(&mpv_path)
        .args(mpv_args(video, format, cookie))
        .status()
        .context("Failed to start mpv")?;

    if !status.success() {
        return Err(anyhow!("mpv exited with {}", status));
    }
    Ok(())
}

fn find_mpv() -> Result<String> {
    if let Ok(output) = Command::new("which").arg("mpv").output() {
        if output.status.success() {
            let path = String::from_utf8(output.stdout)
                .context("mpv path is not valid UTF-8")?;
            return Ok(path.trim().to_string());
        }
    }

    for path in &["/usr/bin/mpv", "/usr/local/bin/mpv", "/bin/mpv"] {
        if Path::new(path).exists() {
            return Ok(path.to_string());
        }
    }
    Err(anyhow!("mpv not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> Video {
        Video {
            id: "42".to_string(),
            title: "Woche 1".to_string(),
            chapter: "Woche 1".to_string(),
            chapter_number: 1,
            formats: vec![Format {
                url: "https://www.studon.fau.de/studon/data/StudOn/h5p/content/42/a.mp4".to_string(),
                format_id: "video/mp4".to_string(),
            }],
        }
    }

    #[test]
    fn mpv_receives_the_session_cookie_and_url_last() {
        let video = video();
        let args = mpv_args(&video, &video.formats[0], Some("PHPSESSID=abc"));
        assert!(args.contains(&"--http-header-fields=Cookie: PHPSESSID=abc".to_string()));
        assert!(args.contains(&"--force-media-title=Woche 1".to_string()));
        assert_eq!(args.last(), Some(&video.formats[0].url));
    }

    #[test]
    fn no_cookie_header_without_a_session() {
        let video = video();
        let args = mpv_args(&video, &video.formats[0], None);
        assert!(!args.iter().any(|a| a.starts_with("--http-header-fields")));
    }

    #[test]
    fn video_without_formats_cannot_be_played() {
        let mut video = video();
        video.formats.clear();
        assert!(play_with_mpv(&video, None).is_err());
    }
}
