//! Application shell: navigation, the persisted session and page routing.

use common::cart::Cart;
use common::model::order::Order;
use common::model::user::{AuthSession, Role, User};
use yew::platform::spawn_local;
use yew::{html, Callback, Component, Context, Html};

use crate::api::{ApiClient, ApiError};
use crate::components::admin_dashboard::AdminDashboard;
use crate::components::blog_composer::BlogComposer;
use crate::components::checkout::Checkout;
use crate::components::login::Login;
use crate::components::media_library::MediaLibrary;
use crate::components::register::Register;
use crate::components::shop::Shop;
use crate::dirty::{install_unload_guard, is_dirty, set_dirty};
use crate::session::Session;
use crate::toast::show_toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Shop,
    Checkout,
    Register,
    Login,
    Products,
    Media,
    Blog,
}

impl Page {
    fn label(&self) -> &'static str {
        match self {
            Page::Shop => "Shop",
            Page::Checkout => "Checkout",
            Page::Register => "Join",
            Page::Login => "Sign in",
            Page::Products => "Products",
            Page::Media => "Media",
            Page::Blog => "Blog",
        }
    }

    fn admin_only(&self) -> bool {
        matches!(self, Page::Products | Page::Media | Page::Blog)
    }
}

pub enum Msg {
    Navigate(Page),
    SignedIn(AuthSession),
    UserRefreshed(User),
    SignOut,
    Unauthorized,
    CartChanged(Cart),
    OrderPlaced(Order),
}

pub struct App {
    session: Session,
    page: Page,
}

impl App {
    fn client(&self) -> ApiClient {
        ApiClient::new(&self.session)
    }
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        install_unload_guard();
        let session = Session::load();
        if session.token().is_some() {
            let client = ApiClient::new(&session);
            let link = ctx.link().clone();
            spawn_local(async move {
                match client.me().await {
                    Ok(user) => link.send_message(Msg::UserRefreshed(user)),
                    Err(ApiError::Unauthorized) => link.send_message(Msg::Unauthorized),
                    Err(e) => gloo_console::warn!(format!("Could not refresh the account: {}", e)),
                }
            });
        }
        Self {
            session,
            page: Page::Shop,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Navigate(page) => {
                if page == self.page {
                    return false;
                }
                if is_dirty()
                    && !web_sys::window()
                        .and_then(|w| w.confirm_with_message("You have unsaved changes. Leave anyway?").ok())
                        .unwrap_or(true)
                {
                    return false;
                }
                set_dirty(false);
                self.page = page;
                true
            }
            Msg::SignedIn(auth) => {
                show_toast(&format!("Welcome, {}", auth.user.first_name));
                let admin = auth.user.role == Role::Admin;
                self.session.sign_in(auth);
                self.session.save();
                self.page = if admin { Page::Products } else { Page::Shop };
                true
            }
            Msg::UserRefreshed(user) => {
                self.session.set_user(user);
                self.session.save();
                true
            }
            Msg::SignOut => {
                set_dirty(false);
                self.session.sign_out();
                self.session.save();
                self.page = Page::Shop;
                true
            }
            Msg::Unauthorized => {
                set_dirty(false);
                self.session.sign_out();
                self.session.save();
                self.page = Page::Login;
                true
            }
            Msg::CartChanged(cart) => {
                *self.session.cart_mut() = cart;
                self.session.save();
                true
            }
            Msg::OrderPlaced(order) => {
                show_toast(&format!(
                    "Order {} placed. A confirmation is on its way to {}",
                    order.order_number, order.customer_email
                ));
                self.session.cart_mut().clear();
                self.session.save();
                self.page = Page::Shop;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="app">
                { self.build_nav(ctx) }
                <main>{ self.build_page(ctx) }</main>
            </div>
        }
    }
}

impl App {
    fn build_nav(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let mut pages = vec![Page::Shop];
        if self.session.is_admin() {
            pages.extend([Page::Products, Page::Media, Page::Blog]);
        }
        let cart_count = self.session.cart().item_count();
        html! {
            <nav class="top-nav">
                <span class="brand">{"iSPEAK"}</span>
                { for pages.into_iter().map(|page| {
                    let class = if page == self.page { "nav-link active" } else { "nav-link" };
                    html! {
                        <button {class} onclick={link.callback(move |_| Msg::Navigate(page))}>{ page.label() }</button>
                    }
                }) }
                <span class="spacer" />
                <button class="nav-link" onclick={link.callback(|_| Msg::Navigate(Page::Shop))}>
                    <i class="material-icons">{"shopping_cart"}</i>
                    if cart_count > 0 {
                        <span class="cart-count">{ cart_count }</span>
                    }
                </button>
                {
                    match self.session.user() {
                        Some(user) => html! {
                            <>
                                <span class="user-name">{ user.full_name() }</span>
                                <button class="nav-link" onclick={link.callback(|_| Msg::SignOut)}>{"Sign out"}</button>
                            </>
                        },
                        None => html! {
                            <>
                                <button class="nav-link" onclick={link.callback(|_| Msg::Navigate(Page::Login))}>{ Page::Login.label() }</button>
                                <button class="nav-link" onclick={link.callback(|_| Msg::Navigate(Page::Register))}>{ Page::Register.label() }</button>
                            </>
                        },
                    }
                }
            </nav>
        }
    }

    fn build_page(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let client = self.client();
        let on_signed_in = link.callback(Msg::SignedIn);
        if self.page.admin_only() && !self.session.is_admin() {
            return html! { <Login {client} {on_signed_in} /> };
        }
        let on_unauthorized: Callback<()> = link.callback(|_| Msg::Unauthorized);
        match self.page {
            Page::Shop => html! {
                <Shop
                    {client}
                    cart={self.session.cart().clone()}
                    on_cart_change={link.callback(Msg::CartChanged)}
                    on_checkout={link.callback(|_| Msg::Navigate(Page::Checkout))}
                />
            },
            Page::Checkout => html! {
                <Checkout
                    {client}
                    cart={self.session.cart().clone()}
                    on_placed={link.callback(Msg::OrderPlaced)}
                    on_cancel={link.callback(|_| Msg::Navigate(Page::Shop))}
                />
            },
            Page::Register => html! { <Register {client} {on_signed_in} /> },
            Page::Login => html! { <Login {client} {on_signed_in} /> },
            Page::Products => html! { <AdminDashboard {client} {on_unauthorized} /> },
            Page::Media => html! { <MediaLibrary {client} {on_unauthorized} /> },
            Page::Blog => html! { <BlogComposer {client} /> },
        }
    }
}
