use common::model::product::{Product, ProductStatus};
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::prelude::*;

use super::messages::Msg;
use super::quick_edit::{QuickEditField, QuickEditForm};
use super::state::AdminDashboard;
use crate::components::widgets::icon_button;
use crate::format::money;
use crate::top_sheet::TopSheet;
use num_format::{Locale, ToFormattedString};

pub fn view(component: &AdminDashboard, ctx: &Context<AdminDashboard>) -> Html {
    let link = ctx.link();
    html! {
        <div class="admin-dashboard">
            { build_toolbar(component, link) }
            { build_stat_cards(component) }
            {
                if component.loading && component.products.is_empty() {
                    html! { <div class="loading">{"Loading products..."}</div> }
                } else {
                    build_product_table(component, link)
                }
            }
            <TopSheet node_ref={component.edit_sheet_ref.clone()}>
                { build_quick_edit(component, link) }
            </TopSheet>
        </div>
    }
}

fn build_toolbar(component: &AdminDashboard, link: &Scope<AdminDashboard>) -> Html {
    let oninput = link.callback(|e: InputEvent| {
        Msg::SetSearch(e.target_unchecked_into::<HtmlInputElement>().value())
    });
    html! {
        <div class="icon-toolbar">
            <input
                class="search"
                type="search"
                placeholder="Search by name or SKU"
                value={component.search.clone()}
                {oninput}
            />
            { icon_button("refresh", "Refresh", link.callback(|_| Msg::Refresh), component.loading) }
        </div>
    }
}

fn stat_card(label: &str, value: String, class: &str) -> Html {
    html! {
        <div class={classes!("stat-card", class.to_string())}>
            <span class="stat-value">{ value }</span>
            <span class="stat-label">{ label.to_string() }</span>
        </div>
    }
}

fn build_stat_cards(component: &AdminDashboard) -> Html {
    let stats = component.stats();
    html! {
        <div class="stat-cards">
            { stat_card("Products", stats.total_products.to_formatted_string(&Locale::en), "") }
            { stat_card("Low stock", stats.low_stock.to_formatted_string(&Locale::en), "stock-low") }
            { stat_card("Out of stock", stats.out_of_stock.to_formatted_string(&Locale::en), "stock-out") }
            { stat_card("Inventory value", money(stats.total_value), "") }
        </div>
    }
}

fn build_product_table(component: &AdminDashboard, link: &Scope<AdminDashboard>) -> Html {
    let rows = component.visible_products();
    if rows.is_empty() {
        return html! { <div class="empty">{"No products match."}</div> };
    }
    html! {
        <table class="product-table">
            <thead>
                <tr>
                    <th></th>
                    <th>{"Product"}</th>
                    <th>{"Category"}</th>
                    <th>{"Price"}</th>
                    <th>{"Stock"}</th>
                    <th>{"Status"}</th>
                    <th></th>
                </tr>
            </thead>
            <tbody>
                { for rows.into_iter().map(|p| build_product_row(component, p, link)) }
            </tbody>
        </table>
    }
}

fn build_product_row(component: &AdminDashboard, product: &Product, link: &Scope<AdminDashboard>) -> Html {
    let id = product.id;
    let stock = product.stock_status();
    let busy = component.pending_stock.contains(&id);
    let price = match product.sale_price {
        Some(sale) => html! {
            <>
                <s class="muted">{ money(product.price) }</s>
                {" "}
                <span>{ money(sale) }</span>
            </>
        },
        None => html! { { money(product.price) } },
    };
    html! {
        <tr key={id.to_string()}>
            <td>
                {
                    match product.primary_image() {
                        Some(src) => html! { <img class="thumb" src={src.to_string()} alt="" /> },
                        None => html! { <i class="material-icons muted">{"image"}</i> },
                    }
                }
            </td>
            <td>
                <div>{ product.name.clone() }</div>
                <div class="muted">{ product.sku.clone().unwrap_or_default() }</div>
            </td>
            <td>{ product.collection.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| "-".to_string()) }</td>
            <td>{ price }</td>
            <td class="stock-cell">
                <button
                    class="icon-btn"
                    disabled={busy || product.stock_quantity == 0}
                    onclick={link.callback(move |_| Msg::NudgeStock(id, -1))}
                >
                    <i class="material-icons">{"remove"}</i>
                </button>
                <span class={classes!("badge", stock.badge_class())}>{ stock.to_string() }</span>
                <button
                    class="icon-btn"
                    disabled={busy}
                    onclick={link.callback(move |_| Msg::NudgeStock(id, 1))}
                >
                    <i class="material-icons">{"add"}</i>
                </button>
            </td>
            <td>{ product.status.to_string() }</td>
            <td>
                { icon_button("edit", "Edit", link.callback(move |_| Msg::OpenQuickEdit(id)), false) }
            </td>
        </tr>
    }
}

fn text_input(label: &str, value: &str, field: QuickEditField, link: &Scope<AdminDashboard>) -> Html {
    let oninput = link.callback(move |e: InputEvent| {
        Msg::EditField(field, e.target_unchecked_into::<HtmlInputElement>().value())
    });
    html! {
        <label class="field">
            <span>{ label.to_string() }</span>
            <input type="text" value={value.to_string()} {oninput} />
        </label>
    }
}

fn build_quick_edit(component: &AdminDashboard, link: &Scope<AdminDashboard>) -> Html {
    let Some(form) = component.editing.as_ref() else {
        return html! {};
    };
    html! {
        <div class="quick-edit">
            <h3>{ format!("Edit {}", form.name) }</h3>
            { text_input("Name", &form.name, QuickEditField::Name, link) }
            { text_input("SKU", &form.sku, QuickEditField::Sku, link) }
            <div class="field-row">
                { text_input("Price", &form.price, QuickEditField::Price, link) }
                { text_input("Sale price", &form.sale_price, QuickEditField::SalePrice, link) }
            </div>
            <div class="field-row">
                { text_input("Stock", &form.stock_quantity, QuickEditField::StockQuantity, link) }
                { text_input("Low stock at", &form.low_stock_threshold, QuickEditField::LowStockThreshold, link) }
            </div>
            { build_status_select(form, link) }
            { build_collection_select(component, form, link) }
            <label class="field checkbox">
                <input
                    type="checkbox"
                    checked={form.featured}
                    onchange={link.callback(|e: Event| {
                        Msg::ToggleFeatured(e.target_unchecked_into::<HtmlInputElement>().checked())
                    })}
                />
                <span>{"Featured"}</span>
            </label>
            <label class="field">
                <span>{"Description"}</span>
                <textarea
                    rows="4"
                    value={form.description.clone()}
                    oninput={link.callback(|e: InputEvent| {
                        Msg::EditField(
                            QuickEditField::Description,
                            e.target_unchecked_into::<HtmlTextAreaElement>().value(),
                        )
                    })}
                />
            </label>
            <div class="sheet-actions">
                { icon_button("close", "Cancel", link.callback(|_| Msg::CloseQuickEdit), false) }
                { icon_button("save", if component.saving { "Saving..." } else { "Save" },
                    link.callback(|_| Msg::SaveQuickEdit), component.saving) }
            </div>
        </div>
    }
}

fn build_status_select(form: &QuickEditForm, link: &Scope<AdminDashboard>) -> Html {
    let onchange = link.callback(|e: Event| {
        Msg::EditField(QuickEditField::Status, e.target_unchecked_into::<HtmlSelectElement>().value())
    });
    html! {
        <label class="field">
            <span>{"Status"}</span>
            <select {onchange}>
                { for ProductStatus::ALL.into_iter().map(|status| html! {
                    <option value={status.as_str()} selected={form.status == status}>{ status.to_string() }</option>
                }) }
            </select>
        </label>
    }
}

fn build_collection_select(component: &AdminDashboard, form: &QuickEditForm, link: &Scope<AdminDashboard>) -> Html {
    let onchange = link.callback(|e: Event| {
        Msg::EditField(QuickEditField::Collection, e.target_unchecked_into::<HtmlSelectElement>().value())
    });
    html! {
        <label class="field">
            <span>{"Category"}</span>
            <select {onchange}>
                <option value="" selected={form.collection_id.is_none()}>{"Uncategorised"}</option>
                { for component.collections.iter().map(|c| html! {
                    <option value={c.id.to_string()} selected={form.collection_id == Some(c.id)}>{ c.name.clone() }</option>
                }) }
            </select>
        </label>
    }
}
