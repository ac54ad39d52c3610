use uuid::Uuid;
use yew::{html, Component, Context, Html, NodeRef, Properties};

/// Overlay panel that slides in when the `show` class is added. Used for the
/// quick edit form and the media details panel.
pub struct TopSheet {
    pub id: String,
}

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub children: Html,
    pub node_ref: NodeRef,
}

impl Component for TopSheet {
    type Message = ();
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            id: format!("sheet-{}", Uuid::new_v4()),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="top-sheet" id={self.id.clone()} ref={ctx.props().node_ref.clone()}>
                { ctx.props().children.clone() }
            </div>
        }
    }
}

fn toggle(top_sheet_ref: &NodeRef, show: bool) {
    if let Some(sheet) = top_sheet_ref.cast::<web_sys::HtmlElement>() {
        let classes = sheet.class_list();
        let result = if show { classes.add_1("show") } else { classes.remove_1("show") };
        if result.is_err() {
            gloo_console::warn!("Could not toggle top sheet", sheet.id());
        }
    }
}

pub fn open_top_sheet(top_sheet_ref: &NodeRef) {
    toggle(top_sheet_ref, true);
}

pub fn close_top_sheet(top_sheet_ref: &NodeRef) {
    toggle(top_sheet_ref, false);
}
