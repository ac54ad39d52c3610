//! Admin product dashboard.
//!
//! Summary cards (total, low stock, out of stock, inventory value), a
//! searchable product table with stock badges and one-click stock nudges,
//! and a quick-edit top sheet writing a typed `ProductUpdate`.

use yew::prelude::*;

mod messages;
mod props;
mod quick_edit;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use props::AdminDashboardProps;
pub use state::AdminDashboard;

impl Component for AdminDashboard {
    type Message = Msg;
    type Properties = AdminDashboardProps;

    fn create(_ctx: &Context<Self>) -> Self {
        AdminDashboard::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            ctx.link().send_message(Msg::Refresh);
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        crate::dirty::set_dirty(false);
    }
}
