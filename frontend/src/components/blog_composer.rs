//! Markdown post composer with an editor tab and a rendered preview.
//!
//! Images picked from disk go through the same compress-then-upload path as
//! the media library and are inserted at the cursor as markdown.

use common::model::blog::{BlogCategory, BlogPost};
use common::model::media::UploadedMedia;
use common::model::product::slugify;
use common::requests::BlogPostInput;
use common::upload::{UploadPolicy, ALLOWED_MIME_TYPES};
use pulldown_cmark::{html, Options, Parser};
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{ApiClient, ApiError};
use crate::components::media_library::upload_file;
use crate::components::widgets::icon_button;
use crate::dirty::{compute_md5, set_dirty};
use crate::toast::show_toast;

const IMAGE_FOLDER: &str = "blog";

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Comma separated, trimmed, without empties or repeats.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    pub slug: String,
    /// Set once the slug is typed by hand; until then it follows the title.
    pub slug_edited: bool,
    pub excerpt: String,
    pub content: String,
    pub featured_image: String,
    pub category_id: Option<i64>,
    pub tags: String,
    pub is_published: bool,
    pub is_featured: bool,
}

impl Draft {
    pub fn set_title(&mut self, title: String) {
        if !self.slug_edited {
            self.slug = slugify(&title);
        }
        self.title = title;
    }

    pub fn fingerprint(&self) -> String {
        compute_md5(&format!("{}\u{1f}{}\u{1f}{}", self.title, self.excerpt, self.content))
    }

    pub fn to_input(&self) -> BlogPostInput {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        BlogPostInput {
            title: self.title.trim().to_string(),
            slug: slugify(&self.slug),
            excerpt: optional(&self.excerpt),
            content: self.content.clone(),
            featured_image: optional(&self.featured_image),
            category_id: self.category_id,
            is_published: self.is_published,
            is_featured: self.is_featured,
            tags: parse_tags(&self.tags),
            meta_title: None,
            meta_description: optional(&self.excerpt),
        }
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct BlogComposerProps {
    pub client: ApiClient,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Editor,
    Preview,
}

pub enum Msg {
    CategoriesLoaded(Vec<BlogCategory>),
    PolicyLoaded(UploadPolicy),
    SetTab(Tab),
    SetTitle(String),
    SetSlug(String),
    SetExcerpt(String),
    SetContent(String),
    SetFeaturedImage(String),
    SetCategory(Option<i64>),
    SetTags(String),
    TogglePublished(bool),
    ToggleFeatured(bool),
    PickImage,
    ImageChosen(gloo_file::File),
    ImageUploaded(UploadedMedia),
    ImageFailed(String),
    Save,
    Saved(BlogPost),
    Failed(ApiError),
}

pub struct BlogComposer {
    draft: Draft,
    saved_md5: String,
    categories: Vec<BlogCategory>,
    tab: Tab,
    saving: bool,
    uploading: bool,
    policy: UploadPolicy,
    textarea_ref: NodeRef,
    file_input_ref: NodeRef,
}

impl BlogComposer {
    fn mark_dirty(&self) {
        set_dirty(self.draft.fingerprint() != self.saved_md5);
    }

    /// Inserts `snippet` at the textarea's cursor, or appends it.
    fn insert_at_cursor(&mut self, snippet: &str) {
        let cursor = self
            .textarea_ref
            .cast::<HtmlTextAreaElement>()
            .and_then(|t| t.selection_start().ok().flatten())
            .map(|utf16| utf16_to_byte_index(&self.draft.content, utf16 as usize))
            .unwrap_or(self.draft.content.len());
        self.draft.content.insert_str(cursor, snippet);
    }
}

/// Textarea selections count UTF-16 units; strings index by bytes.
fn utf16_to_byte_index(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= utf16 {
            return byte;
        }
        units += ch.len_utf16();
    }
    text.len()
}

impl Component for BlogComposer {
    type Message = Msg;
    type Properties = BlogComposerProps;

    fn create(ctx: &Context<Self>) -> Self {
        let client = ctx.props().client.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            match client.blog_categories().await {
                Ok(categories) => link.send_message(Msg::CategoriesLoaded(categories)),
                Err(e) => link.send_message(Msg::Failed(e)),
            }
            match client.upload_policy().await {
                Ok(policy) => link.send_message(Msg::PolicyLoaded(policy)),
                Err(e) => link.send_message(Msg::Failed(e)),
            }
        });
        let draft = Draft::default();
        Self {
            saved_md5: draft.fingerprint(),
            draft,
            categories: Vec::new(),
            tab: Tab::Editor,
            saving: false,
            uploading: false,
            policy: UploadPolicy::default(),
            textarea_ref: NodeRef::default(),
            file_input_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::CategoriesLoaded(categories) => {
                self.categories = categories;
                true
            }
            Msg::PolicyLoaded(policy) => {
                self.policy = policy;
                false
            }
            Msg::SetTab(tab) => {
                self.tab = tab;
                true
            }
            Msg::SetTitle(title) => {
                self.draft.set_title(title);
                self.mark_dirty();
                true
            }
            Msg::SetSlug(slug) => {
                self.draft.slug_edited = !slug.trim().is_empty();
                self.draft.slug = slug;
                true
            }
            Msg::SetExcerpt(excerpt) => {
                self.draft.excerpt = excerpt;
                self.mark_dirty();
                false
            }
            Msg::SetContent(content) => {
                self.draft.content = content;
                self.mark_dirty();
                false
            }
            Msg::SetFeaturedImage(url) => {
                self.draft.featured_image = url;
                true
            }
            Msg::SetCategory(category_id) => {
                self.draft.category_id = category_id;
                false
            }
            Msg::SetTags(tags) => {
                self.draft.tags = tags;
                false
            }
            Msg::TogglePublished(published) => {
                self.draft.is_published = published;
                true
            }
            Msg::ToggleFeatured(featured) => {
                self.draft.is_featured = featured;
                false
            }
            Msg::PickImage => {
                if let Some(input) = self.file_input_ref.cast::<HtmlInputElement>() {
                    input.click();
                }
                false
            }
            Msg::ImageChosen(file) => {
                self.uploading = true;
                let client = ctx.props().client.clone();
                let link = ctx.link().clone();
                let policy = self.policy;
                spawn_local(async move {
                    match upload_file(&client, policy, file, IMAGE_FOLDER).await {
                        Ok(uploaded) => link.send_message(Msg::ImageUploaded(uploaded)),
                        Err(message) => link.send_message(Msg::ImageFailed(message)),
                    }
                });
                true
            }
            Msg::ImageUploaded(uploaded) => {
                self.uploading = false;
                let media = uploaded.media;
                let alt = media.alt_text.or(media.title).unwrap_or_default();
                self.insert_at_cursor(&format!("\n![{}]({})\n", alt, media.url));
                if self.draft.featured_image.is_empty() {
                    self.draft.featured_image = media.url;
                }
                self.mark_dirty();
                true
            }
            Msg::ImageFailed(message) => {
                self.uploading = false;
                show_toast(&message);
                true
            }
            Msg::Save => {
                let input = self.draft.to_input();
                if let Err(e) = input.validate() {
                    show_toast(&e.to_string());
                    return false;
                }
                self.saving = true;
                let client = ctx.props().client.clone();
                let link = ctx.link().clone();
                spawn_local(async move {
                    match client.create_post(&input).await {
                        Ok(post) => link.send_message(Msg::Saved(post)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                true
            }
            Msg::Saved(post) => {
                self.saving = false;
                show_toast(&if post.is_published {
                    format!("Published \"{}\"", post.title)
                } else {
                    format!("Saved draft \"{}\"", post.title)
                });
                self.draft = Draft::default();
                self.saved_md5 = self.draft.fingerprint();
                set_dirty(false);
                true
            }
            Msg::Failed(err) => {
                self.saving = false;
                show_toast(&err.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        html! {
            <div class="blog-composer">
                { self.build_meta(link) }
                { self.build_tab_bar(link) }
                {
                    match self.tab {
                        Tab::Editor => self.build_editor(link),
                        Tab::Preview => build_preview(&self.draft),
                    }
                }
                <div class="sheet-actions">
                    { icon_button("save", if self.saving { "Saving..." } else if self.draft.is_published { "Publish" } else { "Save draft" },
                        link.callback(|_| Msg::Save), self.saving || self.uploading) }
                </div>
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        set_dirty(false);
    }
}

impl BlogComposer {
    fn build_meta(&self, link: &Scope<Self>) -> Html {
        let draft = &self.draft;
        html! {
            <div class="post-meta">
                <input class="title-input" type="text" placeholder="Post title" value={draft.title.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetTitle(e.target_unchecked_into::<HtmlInputElement>().value()))} />
                <input type="text" placeholder="slug" value={draft.slug.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetSlug(e.target_unchecked_into::<HtmlInputElement>().value()))} />
                <input type="text" placeholder="Short excerpt" value={draft.excerpt.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetExcerpt(e.target_unchecked_into::<HtmlInputElement>().value()))} />
                <input type="url" placeholder="Featured image URL" value={draft.featured_image.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetFeaturedImage(e.target_unchecked_into::<HtmlInputElement>().value()))} />
                <select onchange={link.callback(|e: Event| {
                    Msg::SetCategory(e.target_unchecked_into::<HtmlSelectElement>().value().parse().ok())
                })}>
                    <option value="" selected={draft.category_id.is_none()}>{"No category"}</option>
                    { for self.categories.iter().map(|c| html! {
                        <option value={c.id.to_string()} selected={draft.category_id == Some(c.id)}>{ c.name.clone() }</option>
                    }) }
                </select>
                <input type="text" placeholder="tags, comma separated" value={draft.tags.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetTags(e.target_unchecked_into::<HtmlInputElement>().value()))} />
                <label class="checkbox">
                    <input type="checkbox" checked={draft.is_published}
                        onchange={link.callback(|e: Event| Msg::TogglePublished(e.target_unchecked_into::<HtmlInputElement>().checked()))} />
                    {"Publish now"}
                </label>
                <label class="checkbox">
                    <input type="checkbox" checked={draft.is_featured}
                        onchange={link.callback(|e: Event| Msg::ToggleFeatured(e.target_unchecked_into::<HtmlInputElement>().checked()))} />
                    {"Featured"}
                </label>
            </div>
        }
    }

    fn build_tab_bar(&self, link: &Scope<Self>) -> Html {
        let tab = |label: &str, target: Tab| {
            let class = if self.tab == target { "tab active" } else { "tab" };
            html! {
                <button {class} onclick={link.callback(move |_| Msg::SetTab(target))}>{ label.to_string() }</button>
            }
        };
        html! {
            <div class="tab-bar">
                { tab("Editor", Tab::Editor) }
                { tab("Preview", Tab::Preview) }
            </div>
        }
    }

    fn build_editor(&self, link: &Scope<Self>) -> Html {
        let onchange = link.batch_callback(|e: Event| {
            let input = e.target_unchecked_into::<HtmlInputElement>();
            let file = input
                .files()
                .and_then(|list| list.get(0))
                .map(|f| Msg::ImageChosen(gloo_file::File::from(f)));
            input.set_value("");
            file
        });
        html! {
            <div class="editor">
                <div class="icon-toolbar">
                    <input type="file" accept={ALLOWED_MIME_TYPES.join(",")} style="display:none"
                        ref={self.file_input_ref.clone()} {onchange} />
                    { icon_button("image", if self.uploading { "Uploading..." } else { "Image" },
                        link.callback(|_| Msg::PickImage), self.uploading) }
                </div>
                <textarea
                    ref={self.textarea_ref.clone()}
                    rows="20"
                    value={self.draft.content.clone()}
                    placeholder="Write in markdown..."
                    oninput={link.callback(|e: InputEvent| {
                        Msg::SetContent(e.target_unchecked_into::<HtmlTextAreaElement>().value())
                    })}
                />
            </div>
        }
    }
}

fn build_preview(draft: &Draft) -> Html {
    let body = Html::from_html_unchecked(AttrValue::from(render_markdown(&draft.content)));
    html! {
        <article class="preview">
            if !draft.featured_image.is_empty() {
                <img class="featured" src={draft.featured_image.clone()} alt="" />
            }
            <h1>{ draft.title.clone() }</h1>
            { body }
        </article>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_follows_title_until_edited() {
        let mut draft = Draft::default();
        draft.set_title("Learning Twi at Home".to_string());
        assert_eq!(draft.slug, "learning-twi-at-home");
        draft.slug = "twi".to_string();
        draft.slug_edited = true;
        draft.set_title("Learning Twi Together".to_string());
        assert_eq!(draft.slug, "twi");
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        assert_eq!(parse_tags(" twi, Kids ,,kids, culture"), vec!["twi", "Kids", "culture"]);
    }

    #[test]
    fn input_drops_blank_optionals() {
        let mut draft = Draft::default();
        draft.set_title("Drum Circle".to_string());
        draft.content = "Hello".to_string();
        draft.excerpt = "  ".to_string();
        let input = draft.to_input();
        assert_eq!(input.slug, "drum-circle");
        assert_eq!(input.excerpt, None);
        assert_eq!(input.featured_image, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn markdown_renders_tables_and_emphasis() {
        let html = render_markdown("**Akwaaba**\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<strong>Akwaaba</strong>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn cursor_positions_count_utf16_units() {
        assert_eq!(utf16_to_byte_index("héllo", 2), 3);
        assert_eq!(utf16_to_byte_index("abc", 10), 3);
    }
}
