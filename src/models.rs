use serde::{Deserialize, Serialize};

/// `ref_id` of an H5P content group.
pub type ContentGroupId = u64;

/// `ref_id` of a repository folder.
pub type FolderId = u64;

/// A single downloadable rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub url: String,
    pub format_id: String, // MIME type as declared by the H5P content
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub chapter: String,
    pub chapter_number: usize,
    pub formats: Vec<Format>,
}

/// All videos of one content group, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiVideoPlaylist {
    pub id: ContentGroupId,
    pub title: String,
    pub entries: Vec<Video>,
}

/// Unresolved link to a content group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlReference {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderPlaylist {
    pub title: String,
    pub entries: Vec<UrlReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "snake_case")]
pub enum Extraction {
    MultiVideo(MultiVideoPlaylist),
    #[serde(rename = "playlist")]
    Folder(FolderPlaylist),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_is_tagged_by_type() {
        let folder = Extraction::Folder(FolderPlaylist {
            title: "Lectures".to_string(),
            entries: vec![UrlReference {
                id: "7".to_string(),
                url: "https://example.org/7".to_string(),
            }],
        });
        let value = serde_json::to_value(&folder).unwrap();
        assert_eq!(value["_type"], "playlist");
        assert_eq!(value["entries"][0]["id"], "7");

        let group = Extraction::MultiVideo(MultiVideoPlaylist {
            id: 3,
            title: "Week 1".to_string(),
            entries: Vec::new(),
        });
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["_type"], "multi_video");
        assert_eq!(value["id"], 3);
    }
}
