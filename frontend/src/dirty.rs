//! Unsaved-changes guard.
//!
//! Editors publish their dirty state on `window.app_dirty`; a single
//! `beforeunload` listener asks for confirmation while it is set.

use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::BeforeUnloadEvent;

const FLAG: &str = "app_dirty";

/// Hex MD5 of `input`, used to compare an editor's content with what was
/// last loaded or saved.
pub fn compute_md5(input: &str) -> String {
    format!("{:x}", md5::compute(input))
}

pub fn set_dirty(dirty: bool) {
    if let Some(window) = web_sys::window() {
        let _ = Reflect::set(&window, &JsValue::from_str(FLAG), &JsValue::from_bool(dirty));
    }
}

pub fn is_dirty() -> bool {
    web_sys::window()
        .and_then(|w| Reflect::get(&w, &JsValue::from_str(FLAG)).ok())
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

pub fn install_unload_guard() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let listener = Closure::<dyn Fn(BeforeUnloadEvent)>::new(|event: BeforeUnloadEvent| {
        if is_dirty() {
            event.prevent_default();
            event.set_return_value("You have unsaved changes");
        }
    });
    if window
        .add_event_listener_with_callback("beforeunload", listener.as_ref().unchecked_ref())
        .is_ok()
    {
        // The listener lives as long as the page.
        listener.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::compute_md5;

    #[test]
    fn md5_is_lowercase_hex() {
        assert_eq!(compute_md5(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_ne!(compute_md5("a"), compute_md5("b"));
    }
}
