use common::model::media::{FolderCount, Media, DEFAULT_FOLDER};
use common::requests::MediaQuery;
use common::upload::UploadPolicy;
use yew::prelude::*;

use super::details::MediaDetails;

pub const PAGE_SIZE: u32 = 24;

pub struct MediaLibrary {
    pub items: Vec<Media>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub folders: Vec<FolderCount>,
    pub search: String,
    pub folder_filter: Option<String>,
    pub type_filter: Option<String>,
    pub loading: bool,
    pub upload_folder: String,
    pub uploads_in_flight: usize,
    pub import_url: String,
    pub file_input_ref: NodeRef,
    pub details_ref: NodeRef,
    pub details: Option<MediaDetails>,
    pub saving: bool,
    /// Media ids with an analysis job being polled.
    pub analyzing: Vec<i64>,
    /// Server policy; the default until `/api/media/policy` answers.
    pub policy: UploadPolicy,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
            folders: Vec::new(),
            search: String::new(),
            folder_filter: None,
            type_filter: None,
            loading: true,
            upload_folder: DEFAULT_FOLDER.to_string(),
            uploads_in_flight: 0,
            import_url: String::new(),
            file_input_ref: NodeRef::default(),
            details_ref: NodeRef::default(),
            details: None,
            saving: false,
            analyzing: Vec::new(),
            policy: UploadPolicy::default(),
        }
    }

    pub fn query(&self) -> MediaQuery {
        MediaQuery {
            search: Some(self.search.clone()),
            folder: self.folder_filter.clone(),
            mime_type: self.type_filter.clone(),
            limit: Some(PAGE_SIZE),
            offset: Some((self.page.saturating_sub(1) as u32) * PAGE_SIZE),
        }
    }

    /// New uploads go on top of the grid when they match the active filters.
    pub fn prepend(&mut self, media: Media) {
        let folder_ok = self.folder_filter.as_deref().is_none_or(|f| f == media.folder);
        let type_ok = self
            .type_filter
            .as_deref()
            .is_none_or(|t| media.mime_type.starts_with(t));
        if folder_ok && type_ok && self.page == 1 {
            self.items.retain(|m| m.id != media.id);
            self.items.insert(0, media);
        }
        self.total += 1;
    }

    pub fn replace(&mut self, media: Media) {
        if let Some(slot) = self.items.iter_mut().find(|m| m.id == media.id) {
            *slot = media.clone();
        }
        if let Some(details) = self.details.as_mut() {
            if details.media.id == media.id {
                *details = MediaDetails::from_media(media);
            }
        }
    }
}
