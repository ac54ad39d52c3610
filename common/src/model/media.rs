use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FOLDER: &str = "uploads";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub mime_type: String,
    pub file_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
    pub alt_text: Option<String>,
    pub description: Option<String>,
    pub folder: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPage {
    pub media: Vec<Media>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl MediaPage {
    pub fn new(media: Vec<Media>, total: u64, limit: u64, offset: u64) -> Self {
        let limit = limit.max(1);
        Self {
            media,
            total,
            page: offset / limit + 1,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCount {
    pub folder: String,
    pub count: u64,
}

/// Result of an upload: the stored row plus what the compression pass did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub media: Media,
    pub compressed: bool,
    pub original_size: u64,
    pub final_size: u64,
    /// Background analysis scheduled for the new item, when analysis is enabled.
    #[serde(default)]
    pub analysis_job_id: Option<String>,
}

/// Metadata suggested by the image analysis service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSuggestion {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MediaSuggestion {
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.alt.is_none() && self.description.is_none()
    }
}

/// Human title derived from a stored file name: extension dropped, `_`/`-`
/// turned into spaces, leading timestamps removed.
pub fn title_from_filename(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let words = stem.replace(['_', '-'], " ");
    let words: Vec<&str> = words.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(words.len());
    let title = words[start..].join(" ");
    if title.is_empty() {
        filename.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_drop_extension_separators_and_timestamps() {
        assert_eq!(title_from_filename("1718000000000-kente_pattern-blue.jpg"), "kente pattern blue");
        assert_eq!(title_from_filename("family__photo.png"), "family photo");
        assert_eq!(title_from_filename("12345.png"), "12345.png");
        assert_eq!(title_from_filename("no-extension"), "no extension");
    }

    #[test]
    fn page_numbers_follow_offset() {
        let page = MediaPage::new(Vec::new(), 41, 20, 20);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);

        let empty = MediaPage::new(Vec::new(), 0, 20, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
    }
}
