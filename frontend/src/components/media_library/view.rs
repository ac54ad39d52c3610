use common::model::media::Media;
use common::upload::ALLOWED_MIME_TYPES;
use web_sys::{DragEvent, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::prelude::*;

use super::details::DetailField;
use super::messages::Msg;
use super::state::MediaLibrary;
use crate::components::widgets::icon_button;
use crate::format::file_size;
use crate::top_sheet::TopSheet;

const TYPE_FILTERS: [(&str, &str); 4] = [
    ("", "All types"),
    ("image/jpeg", "JPEG"),
    ("image/png", "PNG"),
    ("image/webp", "WebP"),
];

fn files_from(list: Option<web_sys::FileList>) -> Vec<gloo_file::File> {
    list.map(|list| gloo_file::FileList::from(list).iter().cloned().collect())
        .unwrap_or_default()
}

pub fn view(component: &MediaLibrary, ctx: &Context<MediaLibrary>) -> Html {
    let link = ctx.link();
    let ondragover = Callback::from(|e: DragEvent| e.prevent_default());
    let ondrop = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::FilesChosen(files_from(e.data_transfer().and_then(|dt| dt.files())))
    });
    html! {
        <div class="media-library" {ondragover} {ondrop}>
            { build_upload_bar(component, link) }
            { build_filters(component, link) }
            { build_grid(component, link) }
            { build_pager(component, link) }
            <TopSheet node_ref={component.details_ref.clone()}>
                { build_details(component, link) }
            </TopSheet>
        </div>
    }
}

fn build_upload_bar(component: &MediaLibrary, link: &Scope<MediaLibrary>) -> Html {
    let file_input_ref = component.file_input_ref.clone();
    let open_picker = Callback::from(move |_: MouseEvent| {
        if let Some(input) = file_input_ref.cast::<HtmlInputElement>() {
            input.click();
        }
    });
    let onchange = link.callback(|e: Event| {
        let input = e.target_unchecked_into::<HtmlInputElement>();
        let files = files_from(input.files());
        input.set_value("");
        Msg::FilesChosen(files)
    });
    let busy = component.uploads_in_flight > 0;
    html! {
        <div class="icon-toolbar upload-bar">
            <input
                type="file"
                multiple=true
                accept={ALLOWED_MIME_TYPES.join(",")}
                style="display:none"
                ref={component.file_input_ref.clone()}
                {onchange}
            />
            { icon_button("upload", if busy { "Uploading..." } else { "Upload" }, open_picker, busy) }
            <input
                type="text"
                class="folder-input"
                placeholder="Folder"
                value={component.upload_folder.clone()}
                oninput={link.callback(|e: InputEvent| {
                    Msg::SetUploadFolder(e.target_unchecked_into::<HtmlInputElement>().value())
                })}
            />
            <input
                type="url"
                class="url-input"
                placeholder="https://example.com/photo.jpg"
                value={component.import_url.clone()}
                oninput={link.callback(|e: InputEvent| {
                    Msg::SetImportUrl(e.target_unchecked_into::<HtmlInputElement>().value())
                })}
            />
            { icon_button("link", "Import", link.callback(|_| Msg::ImportUrl), busy) }
        </div>
    }
}

fn build_filters(component: &MediaLibrary, link: &Scope<MediaLibrary>) -> Html {
    html! {
        <div class="media-filters">
            <input
                type="search"
                placeholder="Search title, file name, alt text"
                value={component.search.clone()}
                oninput={link.callback(|e: InputEvent| {
                    Msg::SetSearch(e.target_unchecked_into::<HtmlInputElement>().value())
                })}
            />
            <select onchange={link.callback(|e: Event| {
                let value = e.target_unchecked_into::<HtmlSelectElement>().value();
                Msg::SetFolderFilter(Some(value).filter(|v| !v.is_empty()))
            })}>
                <option value="" selected={component.folder_filter.is_none()}>{"All folders"}</option>
                { for component.folders.iter().map(|f| html! {
                    <option
                        value={f.folder.clone()}
                        selected={component.folder_filter.as_deref() == Some(f.folder.as_str())}
                    >
                        { format!("{} ({})", f.folder, f.count) }
                    </option>
                }) }
            </select>
            <select onchange={link.callback(|e: Event| {
                let value = e.target_unchecked_into::<HtmlSelectElement>().value();
                Msg::SetTypeFilter(Some(value).filter(|v| !v.is_empty()))
            })}>
                { for TYPE_FILTERS.iter().map(|(value, label)| html! {
                    <option
                        value={*value}
                        selected={component.type_filter.as_deref().unwrap_or_default() == *value}
                    >
                        { *label }
                    </option>
                }) }
            </select>
            <span class="muted">{ format!("{} files", component.total) }</span>
        </div>
    }
}

fn build_grid(component: &MediaLibrary, link: &Scope<MediaLibrary>) -> Html {
    if component.loading && component.items.is_empty() {
        return html! { <div class="loading">{"Loading media..."}</div> };
    }
    if component.items.is_empty() {
        return html! { <div class="empty">{"No files yet. Drop images here to upload."}</div> };
    }
    html! {
        <div class="media-grid">
            { for component.items.iter().map(|m| build_card(component, m, link)) }
        </div>
    }
}

fn build_card(component: &MediaLibrary, media: &Media, link: &Scope<MediaLibrary>) -> Html {
    let id = media.id;
    let analyzing = component.analyzing.contains(&id);
    let title = media.title.clone().unwrap_or_else(|| media.filename.clone());
    html! {
        <div class="media-card" key={id.to_string()}>
            <img
                src={media.url.clone()}
                alt={media.alt_text.clone().unwrap_or_default()}
                onclick={link.callback(move |_| Msg::Select(id))}
            />
            <div class="media-caption">
                <span class="media-title">{ title }</span>
                <span class="muted">{ file_size(media.file_size) }</span>
            </div>
            <div class="media-actions">
                { icon_button("auto_awesome", if analyzing { "Analyzing..." } else { "Analyze" },
                    link.callback(move |_| Msg::Analyze(id)), analyzing) }
                { icon_button("delete", "Delete", link.callback(move |_| Msg::Delete(id)), false) }
            </div>
        </div>
    }
}

fn build_pager(component: &MediaLibrary, link: &Scope<MediaLibrary>) -> Html {
    if component.total_pages <= 1 {
        return html! {};
    }
    let page = component.page;
    html! {
        <div class="pager">
            { icon_button("chevron_left", "Previous", link.callback(move |_| Msg::SetPage(page.saturating_sub(1))), page <= 1) }
            <span>{ format!("Page {} of {}", page, component.total_pages) }</span>
            { icon_button("chevron_right", "Next", link.callback(move |_| Msg::SetPage(page + 1)),
                page >= component.total_pages) }
        </div>
    }
}

fn detail_input(label: &str, value: &str, field: DetailField, link: &Scope<MediaLibrary>) -> Html {
    html! {
        <label class="field">
            <span>{ label.to_string() }</span>
            <input
                type="text"
                value={value.to_string()}
                oninput={link.callback(move |e: InputEvent| {
                    Msg::EditDetail(field, e.target_unchecked_into::<HtmlInputElement>().value())
                })}
            />
        </label>
    }
}

fn build_details(component: &MediaLibrary, link: &Scope<MediaLibrary>) -> Html {
    let Some(details) = component.details.as_ref() else {
        return html! {};
    };
    let media = &details.media;
    let dimensions = match (media.width, media.height) {
        (Some(w), Some(h)) => format!("{} x {}", w, h),
        _ => "unknown size".to_string(),
    };
    html! {
        <div class="media-details">
            <img class="preview" src={media.url.clone()} alt={details.alt_text.clone()} />
            <div class="muted">
                { format!("{} | {} | {} | {}", media.original_name, media.mime_type, dimensions, file_size(media.file_size)) }
            </div>
            <div class="muted">{ format!("Uploaded {}", media.created_at.format("%Y-%m-%d %H:%M")) }</div>
            { detail_input("Title", &details.title, DetailField::Title, link) }
            { detail_input("Alt text", &details.alt_text, DetailField::AltText, link) }
            { detail_input("Folder", &details.folder, DetailField::Folder, link) }
            <label class="field">
                <span>{"Description"}</span>
                <textarea
                    rows="3"
                    value={details.description.clone()}
                    oninput={link.callback(|e: InputEvent| {
                        Msg::EditDetail(
                            DetailField::Description,
                            e.target_unchecked_into::<HtmlTextAreaElement>().value(),
                        )
                    })}
                />
            </label>
            <input class="url-copy" type="text" readonly=true value={media.url.clone()} />
            <div class="sheet-actions">
                { icon_button("close", "Close", link.callback(|_| Msg::CloseDetails), false) }
                { icon_button("save", if component.saving { "Saving..." } else { "Save" },
                    link.callback(|_| Msg::SaveDetails), component.saving) }
            </div>
        </div>
    }
}
