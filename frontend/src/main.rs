use crate::app::App;

mod api;
mod app;
mod components;
mod dirty;
mod format;
mod session;
mod toast;
mod top_sheet;

fn main() {
    yew::Renderer::<App>::new().render();
}
