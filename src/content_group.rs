//! H5P content groups.
//!
//! A content group is a set of one or more videos stored under the same URL.
//! Which of them is rendered is server-side session state, moved with the
//! "previous"/"next" switch-page links.

use std::collections::VecDeque;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ExtractionError, Result};
use crate::extractor::SITE_BASE;
use crate::fetcher::PageFetcher;
use crate::models::{ContentGroupId, Format, MultiVideoPlaylist, Video};
use crate::utils::page_heading;

static BLOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script type="text/javascript" src="data:application/javascript;base64,([^"]+)"#)
        .expect("valid regex")
});
static INTEGRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^H5PIntegration\.contents\["cid-(\d+)"\]=(.*);"#).expect("valid regex")
});

const MEDIA_BASE: &str = "data/StudOn/h5p/content/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Relative link that moves the session's current page one step.
pub fn switch_page_link(contents_id: ContentGroupId, direction: Direction) -> String {
    let cmd = match direction {
        Direction::Previous => "previous",
        Direction::Next => "next",
    };
    format!(
        "ilias.php?ref_id={}&cmd={}Content&cmdClass=ilobjh5pgui&cmdNode=qu:pb&baseClass=ilObjPluginDispatchGUI",
        contents_id, cmd
    )
}

#[derive(Deserialize)]
struct ContentInfo {
    title: String,
    #[serde(rename = "jsonContent")]
    json_content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct H5pContent {
    interactive_video: InteractiveVideo,
}

#[derive(Deserialize)]
struct InteractiveVideo {
    video: VideoSource,
}

#[derive(Deserialize)]
struct VideoSource {
    files: Vec<VideoFile>,
}

#[derive(Deserialize)]
struct VideoFile {
    path: String,
    mime: String,
}

/// A video whose position in the group is not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDraft {
    pub id: String,
    pub title: String,
    pub formats: Vec<Format>,
}

impl VideoDraft {
    fn into_video(self, chapter_number: usize) -> Video {
        Video {
            chapter: self.title.clone(),
            id: self.id,
            title: self.title,
            chapter_number,
            formats: self.formats,
        }
    }
}

/// Everything read from one rendered page of a content group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    pub video: VideoDraft,
    pub title: String,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Extracts the video shown on `page` and whether the group continues in
/// either direction.
pub fn extract_page(page: &str, contents_id: ContentGroupId) -> Result<PageExtract> {
    // The first script blob is unrelated boilerplate.
    let first = BLOB
        .find(page)
        .ok_or(ExtractionError::MissingBlob { occurrence: 1 })?;
    let blob = BLOB
        .captures_at(page, first.end())
        .and_then(|cap| cap.get(1))
        .ok_or(ExtractionError::MissingBlob { occurrence: 2 })?;

    let encoded: String = blob
        .as_str()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let script = String::from_utf8(STANDARD.decode(encoded)?)?;

    let integration = INTEGRATION
        .captures(&script)
        .ok_or(ExtractionError::MissingJson)?;
    let content_id: u64 = integration[1]
        .parse()
        .map_err(|_| ExtractionError::InvalidContentId(integration[1].to_string()))?;
    let info: ContentInfo = serde_json::from_str(&integration[2])?;
    let content: H5pContent = serde_json::from_str(&info.json_content)?;

    let formats = content
        .interactive_video
        .video
        .files
        .into_iter()
        .map(|file| Format {
            url: format!("{}{}{}/{}", SITE_BASE, MEDIA_BASE, content_id, file.path),
            format_id: file.mime,
        })
        .collect();

    Ok(PageExtract {
        video: VideoDraft {
            id: content_id.to_string(),
            title: info.title,
            formats,
        },
        title: page_heading(page)?,
        has_previous: page.contains(&switch_page_link(contents_id, Direction::Previous)),
        has_next: page.contains(&switch_page_link(contents_id, Direction::Next)),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    WalkingBackward,
    WalkingForward,
    Done,
}

struct WalkState {
    phase: Phase,
    collected: VecDeque<VideoDraft>,
    title: String,
}

impl WalkState {
    fn start(first: PageExtract) -> Self {
        Self {
            phase: Phase::Initial,
            collected: VecDeque::from([first.video]),
            title: first.title,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "content group walk");
        self.phase = phase;
    }

    fn prepend(&mut self, page: PageExtract) {
        self.collected.push_front(page.video);
        self.title = page.title;
    }

    fn append(&mut self, page: PageExtract) {
        self.collected.push_back(page.video);
        self.title = page.title;
    }

    fn finish(self, id: ContentGroupId) -> MultiVideoPlaylist {
        MultiVideoPlaylist {
            id,
            title: self.title,
            entries: self
                .collected
                .into_iter()
                .enumerate()
                .map(|(i, draft)| draft.into_video(i + 1))
                .collect(),
        }
    }
}

/// Collects every video of a content group by stepping the server-side
/// pagination backward to the first page and then forward to the last.
pub struct ContentGroupWalker<'a> {
    fetcher: &'a dyn PageFetcher,
    url: &'a str,
    contents_id: ContentGroupId,
    context_id: String,
}

impl<'a> ContentGroupWalker<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, url: &'a str, contents_id: ContentGroupId) -> Self {
        Self {
            fetcher,
            url,
            contents_id,
            context_id: contents_id.to_string(),
        }
    }

    /// Moves the session one page; the response carries no content.
    pub async fn advance(&self, direction: Direction) -> Result<()> {
        debug!(contents_id = self.contents_id, ?direction, "switching page");
        let link = format!("{}{}", SITE_BASE, switch_page_link(self.contents_id, direction));
        self.fetcher
            .fetch(&link, &self.context_id, Some(StatusCode::FOUND))
            .await?;
        Ok(())
    }

    /// Fetches and extracts the page the session currently points at.
    pub async fn read_current(&self) -> Result<PageExtract> {
        let page = self.fetcher.fetch(self.url, &self.context_id, None).await?;
        extract_page(&page, self.contents_id)
    }

    pub async fn walk(self) -> Result<MultiVideoPlaylist> {
        info!(contents_id = self.contents_id, "extracting content group");

        let first = self.read_current().await?;
        let (first_prev, first_next) = (first.has_previous, first.has_next);
        let mut state = WalkState::start(first);

        if first_prev {
            state.enter(Phase::WalkingBackward);
            let mut steps = 0usize;
            loop {
                self.advance(Direction::Previous).await?;
                steps += 1;
                let page = self.read_current().await?;
                let more = page.has_previous;
                state.prepend(page);
                if !more {
                    break;
                }
            }

            // The forward walk has to resume from the starting page.
            if first_next {
                debug!(steps, "returning to the starting page");
                for _ in 0..steps {
                    self.advance(Direction::Next).await?;
                }
            }
        }

        if first_next {
            state.enter(Phase::WalkingForward);
            loop {
                self.advance(Direction::Next).await?;
                let page = self.read_current().await?;
                let more = page.has_next;
                state.append(page);
                if !more {
                    break;
                }
            }
        }

        state.enter(Phase::Done);
        let playlist = state.finish(self.contents_id);
        info!(
            contents_id = self.contents_id,
            videos = playlist.entries.len(),
            "content group extracted"
        );
        Ok(playlist)
    }
}
