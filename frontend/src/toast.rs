//! Short-lived notifications shown at the bottom of the page.

use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

const TOAST_MS: u32 = 3000;

/// Appends a toast to `<body>` and removes it after three seconds. The
/// message is set as text, never as markup.
pub fn show_toast(message: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) else {
        return;
    };
    toast.set_text_content(Some(message));
    let html_toast: HtmlElement = toast.unchecked_into();
    let style = html_toast.style();
    for (property, value) in [
        ("position", "fixed"),
        ("bottom", "20px"),
        ("left", "50%"),
        ("transform", "translateX(-50%)"),
        ("background", "rgba(0, 0, 0, 0.8)"),
        ("color", "#fff"),
        ("padding", "10px 20px"),
        ("border-radius", "4px"),
        ("z-index", "10000"),
        ("font-family", "Arial, sans-serif"),
    ] {
        style.set_property(property, value).ok();
    }

    if body.append_child(&html_toast).is_ok() {
        wasm_bindgen_futures::spawn_local(async move {
            gloo_timers::future::TimeoutFuture::new(TOAST_MS).await;
            if let Some(parent) = html_toast.parent_node() {
                parent.remove_child(&html_toast).ok();
            }
        });
    }
}
