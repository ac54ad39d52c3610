//! Editable metadata of the selected media item.

use common::model::media::Media;
use common::requests::MediaUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Title,
    AltText,
    Description,
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetails {
    pub media: Media,
    pub title: String,
    pub alt_text: String,
    pub description: String,
    pub folder: String,
}

impl MediaDetails {
    pub fn from_media(media: Media) -> Self {
        Self {
            title: media.title.clone().unwrap_or_default(),
            alt_text: media.alt_text.clone().unwrap_or_default(),
            description: media.description.clone().unwrap_or_default(),
            folder: media.folder.clone(),
            media,
        }
    }

    pub fn set(&mut self, field: DetailField, value: String) {
        match field {
            DetailField::Title => self.title = value,
            DetailField::AltText => self.alt_text = value,
            DetailField::Description => self.description = value,
            DetailField::Folder => self.folder = value,
        }
    }

    /// Only the fields that differ from the stored item are sent.
    pub fn to_update(&self) -> Option<MediaUpdate> {
        fn changed(edited: &str, stored: Option<&str>) -> Option<String> {
            let edited = edited.trim();
            (edited != stored.unwrap_or_default()).then(|| edited.to_string())
        }
        let folder = self.folder.trim();
        let update = MediaUpdate {
            title: changed(&self.title, self.media.title.as_deref()),
            alt_text: changed(&self.alt_text, self.media.alt_text.as_deref()),
            description: changed(&self.description, self.media.description.as_deref()),
            folder: (!folder.is_empty() && folder != self.media.folder).then(|| folder.to_string()),
        };
        (update != MediaUpdate::default()).then_some(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn media() -> Media {
        serde_json::from_value(json!({
            "id": 7,
            "filename": "1700-drum.jpg",
            "original_name": "drum.jpg",
            "url": "/uploads/media/gallery/1700-drum.jpg",
            "mime_type": "image/jpeg",
            "file_size": 2048,
            "width": 640,
            "height": 480,
            "title": "drum",
            "alt_text": null,
            "description": null,
            "folder": "gallery",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn unchanged_details_produce_no_update() {
        let mut details = MediaDetails::from_media(media());
        assert_eq!(details.to_update(), None);
        details.set(DetailField::Title, " drum ".to_string());
        assert_eq!(details.to_update(), None);
    }

    #[test]
    fn only_edited_fields_are_sent() {
        let mut details = MediaDetails::from_media(media());
        details.set(DetailField::AltText, "A talking drum".to_string());
        details.set(DetailField::Folder, "".to_string());
        let update = details.to_update().unwrap();
        assert_eq!(update.alt_text.as_deref(), Some("A talking drum"));
        assert_eq!(update.title, None);
        assert_eq!(update.folder, None);
    }
}
