use yew::platform::spawn_local;
use yew::prelude::*;

use super::messages::Msg;
use super::quick_edit::QuickEditForm;
use super::state::AdminDashboard;
use crate::api::ApiError;
use crate::dirty::{compute_md5, set_dirty};
use crate::toast::show_toast;
use crate::top_sheet::{close_top_sheet, open_top_sheet};

pub fn update(component: &mut AdminDashboard, ctx: &Context<AdminDashboard>, msg: Msg) -> bool {
    match msg {
        Msg::Refresh => {
            component.loading = true;
            let client = ctx.props().client.clone();
            let link = ctx.link().clone();
            spawn_local(async move {
                match client.collections().await {
                    Ok(collections) => link.send_message(Msg::CollectionsLoaded(collections)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
                match client.all_products().await {
                    Ok(products) => link.send_message(Msg::ProductsLoaded(products)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::ProductsLoaded(products) => {
            component.products = products;
            component.loading = false;
            true
        }
        Msg::CollectionsLoaded(collections) => {
            component.collections = collections;
            true
        }
        Msg::RequestFailed(err) => {
            component.loading = false;
            component.saving = false;
            component.pending_stock.clear();
            if err == ApiError::Unauthorized {
                ctx.props().on_unauthorized.emit(());
            }
            show_toast(&err.to_string());
            true
        }
        Msg::SetSearch(search) => {
            component.search = search;
            true
        }
        Msg::NudgeStock(id, delta) => {
            if component.pending_stock.contains(&id) {
                return false;
            }
            component.pending_stock.push(id);
            let client = ctx.props().client.clone();
            let link = ctx.link().clone();
            spawn_local(async move {
                match client.adjust_stock(id, delta).await {
                    Ok(product) => link.send_message(Msg::ProductChanged(product)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::ProductChanged(product) => {
            component.pending_stock.retain(|id| *id != product.id);
            if component.saving {
                component.saving = false;
                component.editing = None;
                component.edit_md5 = None;
                set_dirty(false);
                close_top_sheet(&component.edit_sheet_ref);
                show_toast(&format!("Saved \"{}\"", product.name));
            }
            component.replace_product(product);
            true
        }
        Msg::OpenQuickEdit(id) => {
            let Some(product) = component.products.iter().find(|p| p.id == id) else {
                return false;
            };
            let form = QuickEditForm::from_product(product);
            component.edit_md5 = Some(compute_md5(&form.fingerprint()));
            component.editing = Some(form);
            open_top_sheet(&component.edit_sheet_ref);
            true
        }
        Msg::EditField(field, value) => {
            if let Some(form) = component.editing.as_mut() {
                form.set(field, &value);
            }
            set_dirty(component.is_edit_dirty());
            true
        }
        Msg::ToggleFeatured(featured) => {
            if let Some(form) = component.editing.as_mut() {
                form.featured = featured;
            }
            set_dirty(component.is_edit_dirty());
            true
        }
        Msg::SaveQuickEdit => {
            let Some(form) = component.editing.as_ref() else {
                return false;
            };
            if !component.is_edit_dirty() {
                show_toast("Nothing to save");
                return false;
            }
            let update = match form.to_update() {
                Ok(update) => update,
                Err(message) => {
                    show_toast(&message);
                    return false;
                }
            };
            component.saving = true;
            let id = form.product_id;
            let client = ctx.props().client.clone();
            let link = ctx.link().clone();
            spawn_local(async move {
                match client.update_product(id, &update).await {
                    Ok(product) => link.send_message(Msg::ProductChanged(product)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::CloseQuickEdit => {
            if component.is_edit_dirty()
                && !web_sys::window()
                    .and_then(|w| w.confirm_with_message("Discard your changes?").ok())
                    .unwrap_or(true)
            {
                return false;
            }
            component.editing = None;
            component.edit_md5 = None;
            set_dirty(false);
            close_top_sheet(&component.edit_sheet_ref);
            true
        }
    }
}
