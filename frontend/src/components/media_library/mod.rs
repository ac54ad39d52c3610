//! Media library: a filterable grid of stored images, uploads compressed in
//! the browser before they are sent, URL imports, metadata editing and AI
//! analysis polled through the jobs endpoint.

use yew::prelude::*;

mod details;
mod messages;
mod props;
mod state;
mod update;
mod upload;
mod view;

pub use messages::Msg;
pub use props::MediaLibraryProps;
pub use state::MediaLibrary;
pub(crate) use upload::upload_file;

impl Component for MediaLibrary {
    type Message = Msg;
    type Properties = MediaLibraryProps;

    fn create(_ctx: &Context<Self>) -> Self {
        MediaLibrary::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            ctx.link().send_message(Msg::LoadPolicy);
            ctx.link().send_message(Msg::Reload);
        }
    }
}
