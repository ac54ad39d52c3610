use common::jobs::JobStatus;
use common::requests::UploadUrlRequest;
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use super::details::MediaDetails;
use super::messages::Msg;
use super::state::MediaLibrary;
use super::upload::{upload_file, wait_for_job};
use crate::api::{ApiClient, ApiError};
use crate::format::file_size;
use crate::toast::show_toast;
use crate::top_sheet::{close_top_sheet, open_top_sheet};

fn reload_folders(client: ApiClient, link: Scope<MediaLibrary>) {
    spawn_local(async move {
        match client.media_folders().await {
            Ok(folders) => link.send_message(Msg::FoldersLoaded(folders)),
            Err(e) => link.send_message(Msg::RequestFailed(e)),
        }
    });
}

fn poll_analysis(client: ApiClient, link: Scope<MediaLibrary>, media_id: i64, job_id: String) {
    spawn_local(async move {
        match wait_for_job(&client, &job_id).await {
            Ok(status) => link.send_message(Msg::AnalysisFinished(media_id, status)),
            Err(e) => link.send_message(Msg::AnalysisFinished(media_id, JobStatus::Failed(e.to_string()))),
        }
    });
}

pub fn update(component: &mut MediaLibrary, ctx: &Context<MediaLibrary>, msg: Msg) -> bool {
    let client = ctx.props().client.clone();
    let link = ctx.link().clone();
    match msg {
        Msg::LoadPolicy => {
            spawn_local(async move {
                match client.upload_policy().await {
                    Ok(policy) => link.send_message(Msg::PolicyLoaded(policy)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            false
        }
        Msg::PolicyLoaded(policy) => {
            component.policy = policy;
            false
        }
        Msg::Reload => {
            component.loading = true;
            let query = component.query();
            reload_folders(client.clone(), link.clone());
            spawn_local(async move {
                match client.media(&query).await {
                    Ok(page) => link.send_message(Msg::Loaded(page)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::Loaded(page) => {
            component.items = page.media;
            component.total = page.total;
            component.total_pages = page.total_pages;
            component.loading = false;
            true
        }
        Msg::FoldersLoaded(folders) => {
            component.folders = folders;
            true
        }
        Msg::RequestFailed(err) => {
            component.loading = false;
            component.saving = false;
            if err == ApiError::Unauthorized {
                ctx.props().on_unauthorized.emit(());
            }
            show_toast(&err.to_string());
            true
        }
        Msg::SetSearch(search) => {
            component.search = search;
            component.page = 1;
            ctx.link().send_message(Msg::Reload);
            true
        }
        Msg::SetFolderFilter(folder) => {
            component.folder_filter = folder;
            component.page = 1;
            ctx.link().send_message(Msg::Reload);
            true
        }
        Msg::SetTypeFilter(mime_type) => {
            component.type_filter = mime_type;
            component.page = 1;
            ctx.link().send_message(Msg::Reload);
            true
        }
        Msg::SetPage(page) => {
            component.page = page.max(1);
            ctx.link().send_message(Msg::Reload);
            true
        }
        Msg::SetUploadFolder(folder) => {
            component.upload_folder = folder;
            false
        }
        Msg::FilesChosen(files) => {
            if files.is_empty() {
                return false;
            }
            component.uploads_in_flight += files.len();
            let folder = component.upload_folder.trim().to_string();
            let policy = component.policy;
            spawn_local(async move {
                for file in files {
                    let name = file.name();
                    match upload_file(&client, policy, file, &folder).await {
                        Ok(uploaded) => link.send_message(Msg::Uploaded(uploaded)),
                        Err(message) => link.send_message(Msg::UploadFailed(format!("{}: {}", name, message))),
                    }
                }
                link.send_message(Msg::UploadsDone);
            });
            true
        }
        Msg::Uploaded(uploaded) => {
            component.uploads_in_flight = component.uploads_in_flight.saturating_sub(1);
            let note = if uploaded.compressed {
                format!(
                    "Uploaded (compressed {} to {})",
                    file_size(uploaded.original_size),
                    file_size(uploaded.final_size)
                )
            } else {
                "Uploaded".to_string()
            };
            show_toast(&note);
            let id = uploaded.media.id;
            if let Some(job_id) = uploaded.analysis_job_id {
                component.analyzing.push(id);
                poll_analysis(client, link, id, job_id);
            }
            component.prepend(uploaded.media);
            true
        }
        Msg::UploadFailed(message) => {
            component.uploads_in_flight = component.uploads_in_flight.saturating_sub(1);
            show_toast(&message);
            true
        }
        Msg::UploadsDone => {
            component.uploads_in_flight = 0;
            reload_folders(client, link);
            true
        }
        Msg::SetImportUrl(url) => {
            component.import_url = url;
            false
        }
        Msg::ImportUrl => {
            let request = UploadUrlRequest {
                url: component.import_url.trim().to_string(),
                folder: Some(component.upload_folder.trim().to_string()).filter(|f| !f.is_empty()),
            };
            if let Err(e) = request.validate() {
                show_toast(&e.to_string());
                return false;
            }
            component.uploads_in_flight += 1;
            component.import_url.clear();
            spawn_local(async move {
                match client.import_media(&request).await {
                    Ok(uploaded) => link.send_message(Msg::Uploaded(uploaded)),
                    Err(e) => link.send_message(Msg::UploadFailed(e.to_string())),
                }
                link.send_message(Msg::UploadsDone);
            });
            true
        }
        Msg::Select(id) => {
            let Some(media) = component.items.iter().find(|m| m.id == id) else {
                return false;
            };
            component.details = Some(MediaDetails::from_media(media.clone()));
            open_top_sheet(&component.details_ref);
            true
        }
        Msg::EditDetail(field, value) => {
            if let Some(details) = component.details.as_mut() {
                details.set(field, value);
            }
            false
        }
        Msg::SaveDetails => {
            let Some(details) = component.details.as_ref() else {
                return false;
            };
            let Some(update) = details.to_update() else {
                show_toast("Nothing to save");
                return false;
            };
            component.saving = true;
            let id = details.media.id;
            spawn_local(async move {
                match client.update_media(id, &update).await {
                    Ok(media) => {
                        show_toast("Details saved");
                        link.send_message(Msg::MediaChanged(media));
                        reload_folders(client, link);
                    }
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::CloseDetails => {
            component.details = None;
            close_top_sheet(&component.details_ref);
            true
        }
        Msg::MediaChanged(media) => {
            component.saving = false;
            component.replace(media);
            true
        }
        Msg::Delete(id) => {
            let confirmed = web_sys::window()
                .and_then(|w| w.confirm_with_message("Delete this file permanently?").ok())
                .unwrap_or(false);
            if !confirmed {
                return false;
            }
            spawn_local(async move {
                match client.delete_media(id).await {
                    Ok(()) => link.send_message(Msg::Deleted(id)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            false
        }
        Msg::Deleted(id) => {
            component.items.retain(|m| m.id != id);
            component.total = component.total.saturating_sub(1);
            if component.details.as_ref().is_some_and(|d| d.media.id == id) {
                component.details = None;
                close_top_sheet(&component.details_ref);
            }
            show_toast("File deleted");
            reload_folders(client, link);
            true
        }
        Msg::Analyze(id) => {
            if component.analyzing.contains(&id) {
                return false;
            }
            component.analyzing.push(id);
            spawn_local(async move {
                match client.analyze_media(id).await {
                    Ok(job_id) => link.send_message(Msg::AnalysisStarted(id, job_id)),
                    Err(e) => link.send_message(Msg::AnalysisFinished(id, JobStatus::Failed(e.to_string()))),
                }
            });
            true
        }
        Msg::AnalysisStarted(id, job_id) => {
            poll_analysis(client, link, id, job_id);
            false
        }
        Msg::AnalysisFinished(id, status) => {
            component.analyzing.retain(|m| *m != id);
            match status {
                JobStatus::Completed(message) => {
                    show_toast(&message);
                    spawn_local(async move {
                        match client.get_media(id).await {
                            Ok(media) => link.send_message(Msg::MediaChanged(media)),
                            Err(e) => link.send_message(Msg::RequestFailed(e)),
                        }
                    });
                }
                JobStatus::Failed(message) => show_toast(&format!("Analysis failed: {}", message)),
                JobStatus::Pending | JobStatus::InProgress(_) => {}
            }
            true
        }
    }
}
