//! Storefront: active products with stock badges, and the cart with promo
//! codes and the free-shipping meter.

use common::cart::{Cart, CartLine};
use common::model::product::{Product, ProductStatus};
use web_sys::HtmlInputElement;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{ApiClient, ApiError};
use crate::components::widgets::icon_button;
use crate::format::money;
use crate::toast::show_toast;

#[derive(Properties, PartialEq, Clone)]
pub struct ShopProps {
    pub client: ApiClient,
    pub cart: Cart,
    pub on_cart_change: Callback<Cart>,
    pub on_checkout: Callback<()>,
}

pub enum Msg {
    Loaded(Vec<Product>),
    LoadFailed(ApiError),
    Add(i64),
    SetQuantity(usize, u32),
    Remove(usize),
    SetPromo(String),
    ApplyPromo,
    RemovePromo,
}

pub struct Shop {
    products: Vec<Product>,
    loading: bool,
    promo_input: String,
}

impl Shop {
    fn edit_cart(&self, ctx: &Context<Self>, change: impl FnOnce(&mut Cart)) {
        let mut cart = ctx.props().cart.clone();
        change(&mut cart);
        ctx.props().on_cart_change.emit(cart);
    }

    fn line_key(cart: &Cart, index: usize) -> Option<(i64, Option<String>, Option<String>)> {
        cart.lines
            .get(index)
            .map(|l| (l.product_id, l.size.clone(), l.color.clone()))
    }
}

impl Component for Shop {
    type Message = Msg;
    type Properties = ShopProps;

    fn create(ctx: &Context<Self>) -> Self {
        let client = ctx.props().client.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            match client.products().await {
                Ok(products) => link.send_message(Msg::Loaded(products)),
                Err(e) => link.send_message(Msg::LoadFailed(e)),
            }
        });
        Self {
            products: Vec::new(),
            loading: true,
            promo_input: String::new(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(products) => {
                self.products = products
                    .into_iter()
                    .filter(|p| p.status == ProductStatus::Active)
                    .collect();
                self.loading = false;
                true
            }
            Msg::LoadFailed(err) => {
                self.loading = false;
                show_toast(&err.to_string());
                true
            }
            Msg::Add(id) => {
                let Some(product) = self.products.iter().find(|p| p.id == id) else {
                    return false;
                };
                if !product.in_stock() {
                    show_toast(&format!("{} is out of stock", product.name));
                    return false;
                }
                let line = CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.effective_price(),
                    quantity: 1,
                    size: product.sizes.first().cloned(),
                    color: product.colors.first().cloned(),
                    image: product.primary_image().map(str::to_string),
                };
                show_toast(&format!("Added {} to the cart", product.name));
                self.edit_cart(ctx, |cart| cart.add(line));
                false
            }
            Msg::SetQuantity(index, quantity) => {
                if let Some((id, size, color)) = Self::line_key(&ctx.props().cart, index) {
                    self.edit_cart(ctx, |cart| {
                        cart.set_quantity(id, size.as_deref(), color.as_deref(), quantity)
                    });
                }
                false
            }
            Msg::Remove(index) => {
                if let Some((id, size, color)) = Self::line_key(&ctx.props().cart, index) {
                    self.edit_cart(ctx, |cart| cart.remove(id, size.as_deref(), color.as_deref()));
                }
                false
            }
            Msg::SetPromo(code) => {
                self.promo_input = code;
                false
            }
            Msg::ApplyPromo => {
                let mut cart = ctx.props().cart.clone();
                match cart.apply_promo(&self.promo_input) {
                    Ok(promo) => {
                        show_toast(&format!("Promo {} applied", promo.code()));
                        self.promo_input.clear();
                        ctx.props().on_cart_change.emit(cart);
                    }
                    Err(e) => show_toast(&e.to_string()),
                }
                true
            }
            Msg::RemovePromo => {
                self.edit_cart(ctx, Cart::remove_promo);
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="shop">
                { self.build_products(ctx) }
                { self.build_cart(ctx) }
            </div>
        }
    }
}

impl Shop {
    fn build_products(&self, ctx: &Context<Self>) -> Html {
        if self.loading {
            return html! { <div class="loading">{"Loading products..."}</div> };
        }
        let link = ctx.link();
        html! {
            <div class="product-grid">
                { for self.products.iter().map(|p| {
                    let id = p.id;
                    let stock = p.stock_status();
                    html! {
                        <div class="product-card" key={id.to_string()}>
                            {
                                match p.primary_image() {
                                    Some(src) => html! { <img src={src.to_string()} alt={p.name.clone()} /> },
                                    None => html! {},
                                }
                            }
                            <h4>{ p.name.clone() }</h4>
                            <div>{ money(p.effective_price()) }</div>
                            <span class={classes!("badge", stock.badge_class())}>{ stock.to_string() }</span>
                            { icon_button("add_shopping_cart", "Add", link.callback(move |_| Msg::Add(id)), !p.in_stock()) }
                        </div>
                    }
                }) }
            </div>
        }
    }

    fn build_cart(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let cart = &ctx.props().cart;
        if cart.is_empty() {
            return html! { <aside class="cart"><h3>{"Your cart is empty"}</h3></aside> };
        }
        let totals = cart.totals();
        html! {
            <aside class="cart">
                <h3>{ format!("Cart ({} items)", cart.item_count()) }</h3>
                { for cart.lines.iter().enumerate().map(|(index, line)| {
                    let quantity = line.quantity;
                    html! {
                        <div class="cart-line">
                            <span>{ line.name.clone() }</span>
                            <span class="muted">
                                { [line.size.as_deref(), line.color.as_deref()].into_iter().flatten().collect::<Vec<_>>().join(" / ") }
                            </span>
                            <button class="icon-btn" onclick={link.callback(move |_| Msg::SetQuantity(index, quantity.saturating_sub(1)))}>
                                <i class="material-icons">{"remove"}</i>
                            </button>
                            <span>{ quantity }</span>
                            <button class="icon-btn" onclick={link.callback(move |_| Msg::SetQuantity(index, quantity + 1))}>
                                <i class="material-icons">{"add"}</i>
                            </button>
                            <span>{ money(line.line_total()) }</span>
                            <button class="icon-btn" onclick={link.callback(move |_| Msg::Remove(index))}>
                                <i class="material-icons">{"delete"}</i>
                            </button>
                        </div>
                    }
                }) }
                {
                    match cart.promo {
                        Some(promo) => html! {
                            <div class="promo">
                                <span>{ format!("Promo {}", promo.code()) }</span>
                                <button class="link" onclick={link.callback(|_| Msg::RemovePromo)}>{"Remove"}</button>
                            </div>
                        },
                        None => html! {
                            <div class="promo">
                                <input
                                    type="text"
                                    placeholder="Promo code"
                                    value={self.promo_input.clone()}
                                    oninput={link.callback(|e: InputEvent| {
                                        Msg::SetPromo(e.target_unchecked_into::<HtmlInputElement>().value())
                                    })}
                                />
                                <button onclick={link.callback(|_| Msg::ApplyPromo)}>{"Apply"}</button>
                            </div>
                        },
                    }
                }
                <dl class="totals">
                    <dt>{"Subtotal"}</dt><dd>{ money(totals.subtotal) }</dd>
                    if totals.discount > 0.0 {
                        <dt>{"Discount"}</dt><dd>{ format!("-{}", money(totals.discount)) }</dd>
                    }
                    <dt>{"Shipping"}</dt>
                    <dd>{ if totals.shipping == 0.0 { "Free".to_string() } else { money(totals.shipping) } }</dd>
                    <dt>{"Tax"}</dt><dd>{ money(totals.tax) }</dd>
                    <dt>{"Total"}</dt><dd>{ money(totals.total) }</dd>
                </dl>
                if totals.free_shipping_remaining > 0.0 {
                    <div class="shipping-meter">
                        <progress max="1" value={totals.free_shipping_progress.to_string()} />
                        <span>{ format!("Add {} for free shipping", money(totals.free_shipping_remaining)) }</span>
                    </div>
                }
                { icon_button("payments", "Checkout", ctx.props().on_checkout.reform(|_| ()), false) }
            </aside>
        }
    }
}
