use common::jobs::JobStatus;
use common::model::media::{FolderCount, Media, MediaPage, UploadedMedia};
use common::upload::UploadPolicy;

use super::details::DetailField;
use crate::api::ApiError;

pub enum Msg {
    LoadPolicy,
    PolicyLoaded(UploadPolicy),
    Reload,
    Loaded(MediaPage),
    FoldersLoaded(Vec<FolderCount>),
    RequestFailed(ApiError),
    SetSearch(String),
    SetFolderFilter(Option<String>),
    SetTypeFilter(Option<String>),
    SetPage(u64),
    SetUploadFolder(String),
    FilesChosen(Vec<gloo_file::File>),
    Uploaded(UploadedMedia),
    UploadFailed(String),
    UploadsDone,
    SetImportUrl(String),
    ImportUrl,
    Select(i64),
    EditDetail(DetailField, String),
    SaveDetails,
    CloseDetails,
    /// Replaces a card with a fresh copy from the server.
    MediaChanged(Media),
    Delete(i64),
    Deleted(i64),
    Analyze(i64),
    AnalysisStarted(i64, String),
    AnalysisFinished(i64, JobStatus),
}
