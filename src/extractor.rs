// src/extractor.rs

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::content_group::ContentGroupWalker;
use crate::error::{ExtractionError, Result};
use crate::fetcher::PageFetcher;
use crate::folder::{self, FOLDER_PATH};
use crate::models::{ContentGroupId, Extraction, FolderId, FolderPlaylist, MultiVideoPlaylist, UrlReference};

pub const SITE_BASE: &str = "https://www.studon.fau.de/studon/";

static CONTENT_GROUP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.studon\.fau\.de/studon/ilias\.php\?ref_id=(?P<id>\d+)&cmd=showContents&cmdClass=ilobjh5pgui&cmdNode=qu:pb&baseClass=ilObjPluginDispatchGUI")
        .expect("valid regex")
});
// Form emitted by folder pages; StudOn redirects it to the one above
static CONTENT_GROUP_FORWARD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.studon\.fau\.de/studon/ilias\.php\?baseClass=ilObjPluginDispatchGUI&cmd=forward&ref_id=(?P<id>\d+)&forwardCmd=showContents")
        .expect("valid regex")
});
static FOLDER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}{}", regex::escape(SITE_BASE), FOLDER_PATH)).expect("valid regex")
});

/// Which entry point accepts a URL, with the `ref_id` taken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ContentGroup(ContentGroupId),
    Folder(FolderId),
}

fn ref_id(pattern: &Regex, url: &str) -> Option<u64> {
    pattern
        .captures(url)
        .and_then(|cap| cap.name("id"))
        .and_then(|id| id.as_str().parse().ok())
}

pub fn classify(url: &str) -> Option<Target> {
    if let Some(id) = ref_id(&CONTENT_GROUP_URL, url).or_else(|| ref_id(&CONTENT_GROUP_FORWARD_URL, url)) {
        return Some(Target::ContentGroup(id));
    }
    ref_id(&FOLDER_URL, url).map(Target::Folder)
}

/// Viewer page of a content group, the URL every page read goes to.
pub fn content_group_url(contents_id: ContentGroupId) -> String {
    format!(
        "{}ilias.php?ref_id={}&cmd=showContents&cmdClass=ilobjh5pgui&cmdNode=qu:pb&baseClass=ilObjPluginDispatchGUI",
        SITE_BASE, contents_id
    )
}

// Page reads go to the viewer page; a forward link is rebuilt from its ref_id
fn viewer_url(url: &str, contents_id: ContentGroupId) -> String {
    if CONTENT_GROUP_URL.is_match(url) {
        url.to_string()
    } else {
        content_group_url(contents_id)
    }
}

/// Every video of the content group at `url`, in page order.
pub async fn extract_content_group(
    fetcher: &dyn PageFetcher,
    url: &str,
    contents_id: ContentGroupId,
) -> Result<MultiVideoPlaylist> {
    ContentGroupWalker::new(fetcher, url, contents_id).walk().await
}

/// References to the content groups linked from the folder at `url`.
pub async fn expand_folder(
    fetcher: &dyn PageFetcher,
    url: &str,
    folder_id: FolderId,
) -> Result<FolderPlaylist> {
    folder::expand_folder(fetcher, url, folder_id).await
}

pub async fn extract(fetcher: &dyn PageFetcher, url: &str) -> Result<Extraction> {
    match classify(url) {
        Some(Target::ContentGroup(id)) => {
            let viewer = viewer_url(url, id);
            extract_content_group(fetcher, &viewer, id).await.map(Extraction::MultiVideo)
        }
        Some(Target::Folder(id)) => expand_folder(fetcher, url, id).await.map(Extraction::Folder),
        None => Err(ExtractionError::UnsupportedUrl(url.to_string())),
    }
}

pub async fn resolve_reference(
    fetcher: &dyn PageFetcher,
    reference: &UrlReference,
) -> Result<MultiVideoPlaylist> {
    match classify(&reference.url) {
        Some(Target::ContentGroup(id)) => {
            extract_content_group(fetcher, &viewer_url(&reference.url, id), id).await
        }
        _ => Err(ExtractionError::UnsupportedUrl(reference.url.clone())),
    }
}

/// Resolves every entry of a folder playlist, one after another.
/// `on_entry` is called before each entry is walked.
pub async fn resolve_folder(
    fetcher: &dyn PageFetcher,
    folder: &FolderPlaylist,
    mut on_entry: impl FnMut(&UrlReference),
) -> Result<Vec<MultiVideoPlaylist>> {
    info!(title = %folder.title, entries = folder.entries.len(), "resolving folder");

    let mut groups = Vec::with_capacity(folder.entries.len());
    for reference in &folder.entries {
        on_entry(reference);
        groups.push(resolve_reference(fetcher, reference).await?);
    }
    Ok(groups)
}
