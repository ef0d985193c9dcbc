//! Repository folders and the H5P content groups linked from them.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::extractor::SITE_BASE;
use crate::fetcher::PageFetcher;
use crate::models::{FolderId, FolderPlaylist, UrlReference};
use crate::utils::{page_heading, unescape_href};

/// Folder link relative to the site base, as it appears in the address bar.
pub const FOLDER_PATH: &str = r"ilias\.php\?ref_id=(?P<id>\d+)(&type=\w+)?(&expand=(?P<expand>-?\d+))?&cmd=view&cmdClass=ilobjfoldergui&cmdNode=yn:ou&baseClass=ilrepositorygui(#.*)?";

// Same link, escaped the way it is written into the page markup
static FOLDER_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&FOLDER_PATH.replace('&', "&amp;")).expect("valid regex"));
static CONTENT_GROUP_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<a href="(ilias\.php\?baseClass=ilObjPluginDispatchGUI&amp;cmd=forward&amp;ref_id=(\d+)&amp;forwardCmd=showContents)" target='_top'><img alt="Symbol H5P""#,
    )
    .expect("valid regex")
});

/// Links on `page` that expand a collapsed sub-section. Links with a negative
/// `expand` value collapse instead and are skipped.
fn expand_links(page: &str) -> Vec<String> {
    FOLDER_HREF
        .captures_iter(page)
        .filter(|cap| {
            cap.name("expand")
                .is_some_and(|expand| !expand.as_str().starts_with('-'))
        })
        .filter_map(|cap| cap.get(0))
        .map(|link| unescape_href(link.as_str()))
        .collect()
}

fn content_group_links(page: &str) -> Vec<UrlReference> {
    CONTENT_GROUP_HREF
        .captures_iter(page)
        .map(|cap| UrlReference {
            id: cap[2].to_string(),
            url: format!("{}{}", SITE_BASE, unescape_href(&cap[1])),
        })
        .collect()
}

/// Expands every collapsed section of a folder and lists the content groups
/// it links to, in document order.
///
/// Expansion is a single pass over the links of the first rendering; each
/// expansion replaces the page text with the newly rendered one.
pub async fn expand_folder(
    fetcher: &dyn PageFetcher,
    url: &str,
    folder_id: FolderId,
) -> Result<FolderPlaylist> {
    info!(folder_id, "expanding folder");
    let context_id = folder_id.to_string();

    let initial = fetcher.fetch(url, &context_id, None).await?;
    let mut expanded = None;
    for link in expand_links(&initial) {
        debug!(%link, "expanding section");
        let target = format!("{}{}", SITE_BASE, link);
        expanded = Some(fetcher.fetch(&target, &context_id, None).await?);
    }
    let page = expanded.unwrap_or(initial);

    let entries = content_group_links(&page);
    let title = page_heading(&page)?;
    info!(folder_id, entries = entries.len(), "folder expanded");

    Ok(FolderPlaylist { title, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, FetchError};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const FOLDER_URL: &str = "https://www.studon.fau.de/studon/ilias.php?ref_id=500&cmd=view&cmdClass=ilobjfoldergui&cmdNode=yn:ou&baseClass=ilrepositorygui";

    fn folder_href(expand: i64) -> String {
        format!(
            "ilias.php?ref_id=500&amp;expand={}&amp;cmd=view&amp;cmdClass=ilobjfoldergui&amp;cmdNode=yn:ou&amp;baseClass=ilrepositorygui",
            expand
        )
    }

    fn folder_url(expand: i64) -> String {
        format!("{}{}", SITE_BASE, folder_href(expand).replace("&amp;", "&"))
    }

    fn h5p_link(ref_id: u64) -> String {
        format!(
            "<a href=\"ilias.php?baseClass=ilObjPluginDispatchGUI&amp;cmd=forward&amp;ref_id={}&amp;forwardCmd=showContents\" target='_top'><img alt=\"Symbol H5P\" src=\"h5p.svg\"></a>",
            ref_id
        )
    }

    fn section(expand: i64) -> String {
        format!("<a href=\"{}\">Abschnitt</a>", folder_href(expand))
    }

    struct FakeFolder {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeFolder {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFolder {
        async fn fetch(
            &self,
            url: &str,
            context_id: &str,
            expected_status: Option<StatusCode>,
        ) -> std::result::Result<String, FetchError> {
            assert_eq!(context_id, "500");
            assert_eq!(expected_status, None);
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or(FetchError::InvalidUrl(url.to_string()))
        }
    }

    #[tokio::test]
    async fn collapsed_sections_are_expanded_and_collapse_links_skipped() {
        let initial = format!(
            "<h1>Vorlesung</h1>\n{}\n{}\n{}",
            section(-1),
            section(3),
            h5p_link(1)
        );
        let expanded = format!(
            "<h1>Vorlesung</h1>\n{}\n{}\n{}\n{}",
            section(-1),
            h5p_link(1),
            h5p_link(2),
            h5p_link(3)
        );
        let studon = FakeFolder::new(vec![
            (FOLDER_URL.to_string(), initial),
            (folder_url(3), expanded),
        ]);

        let playlist = expand_folder(&studon, FOLDER_URL, 500).await.unwrap();

        assert_eq!(studon.fetched(), [FOLDER_URL.to_string(), folder_url(3)]);
        assert!(!studon.fetched().contains(&folder_url(-1)));
        assert_eq!(playlist.title, "Vorlesung");
        let ids: Vec<&str> = playlist.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(
            playlist.entries[1].url,
            "https://www.studon.fau.de/studon/ilias.php?baseClass=ilObjPluginDispatchGUI&cmd=forward&ref_id=2&forwardCmd=showContents"
        );
    }

    #[tokio::test]
    async fn expansion_is_a_single_pass_over_the_first_rendering() {
        let initial = format!("<h1>Ordner</h1>\n{}", section(0));
        // Reveals another expandable section, which is left alone.
        let expanded = format!("<h1>Ordner</h1>\n{}\n{}", section(7), h5p_link(9));
        let studon = FakeFolder::new(vec![
            (FOLDER_URL.to_string(), initial),
            (folder_url(0), expanded),
        ]);

        let playlist = expand_folder(&studon, FOLDER_URL, 500).await.unwrap();

        assert_eq!(studon.fetched(), [FOLDER_URL.to_string(), folder_url(0)]);
        assert_eq!(playlist.entries.len(), 1);
        assert_eq!(playlist.entries[0].id, "9");
    }

    #[tokio::test]
    async fn plain_folder_is_fetched_once() {
        let initial = format!("<h1>Übungen</h1>\n{}\n{}", h5p_link(11), h5p_link(12));
        let studon = FakeFolder::new(vec![(FOLDER_URL.to_string(), initial)]);

        let playlist = expand_folder(&studon, FOLDER_URL, 500).await.unwrap();

        assert_eq!(studon.fetched().len(), 1);
        assert_eq!(playlist.title, "Übungen");
        assert_eq!(playlist.entries.len(), 2);
    }

    #[tokio::test]
    async fn missing_heading_fails_the_expansion() {
        let studon = FakeFolder::new(vec![(FOLDER_URL.to_string(), h5p_link(1))]);
        let result = expand_folder(&studon, FOLDER_URL, 500).await;
        assert!(matches!(result, Err(ExtractionError::MissingHeading)));
    }

    #[tokio::test]
    async fn fetch_failure_during_expansion_propagates() {
        let initial = format!("<h1>Ordner</h1>\n{}", section(2));
        let studon = FakeFolder::new(vec![(FOLDER_URL.to_string(), initial)]);
        let result = expand_folder(&studon, FOLDER_URL, 500).await;
        assert!(matches!(result, Err(ExtractionError::Fetch(FetchError::InvalidUrl(_)))));
    }
}
