//! Three-step checkout driven by `CheckoutWizard`. Card number and expiry
//! are reformatted as they are typed; the order is placed from the cart.

use common::cart::Cart;
use common::forms::card::last_four;
use common::forms::checkout::{CheckoutField, CheckoutStep, CheckoutWizard};
use common::model::order::Order;
use common::requests::PaymentMethod;
use web_sys::HtmlInputElement;
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{ApiClient, ApiError};
use crate::components::widgets::{icon_button, step_indicator};
use crate::format::money;

#[derive(Properties, PartialEq, Clone)]
pub struct CheckoutProps {
    pub client: ApiClient,
    pub cart: Cart,
    pub on_placed: Callback<Order>,
    pub on_cancel: Callback<()>,
}

pub enum Msg {
    Edit(CheckoutField, String),
    SetPaymentMethod(PaymentMethod),
    ToggleTerms(bool),
    ToggleSaveCard(bool),
    Next,
    Back,
    Submit,
    Placed(Order),
    Failed(ApiError),
}

pub struct Checkout {
    wizard: CheckoutWizard,
    submitting: bool,
}

impl Component for Checkout {
    type Message = Msg;
    type Properties = CheckoutProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            wizard: CheckoutWizard::new(),
            submitting: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Edit(field, value) => {
                self.wizard.form.set(field, &value);
                true
            }
            Msg::SetPaymentMethod(method) => {
                self.wizard.payment_method = method;
                true
            }
            Msg::ToggleTerms(agree) => {
                self.wizard.form.agree_to_terms = agree;
                true
            }
            Msg::ToggleSaveCard(save) => {
                self.wizard.form.save_card = save;
                false
            }
            Msg::Next => {
                let _ = self.wizard.next();
                true
            }
            Msg::Back => {
                self.wizard.back();
                true
            }
            Msg::Submit => {
                if self.submitting {
                    return false;
                }
                let Ok(request) = self.wizard.submit(&ctx.props().cart) else {
                    return true;
                };
                self.submitting = true;
                let client = ctx.props().client.clone();
                let link = ctx.link().clone();
                spawn_local(async move {
                    match client.place_order(&request).await {
                        Ok(order) => link.send_message(Msg::Placed(order)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                true
            }
            Msg::Placed(order) => {
                self.submitting = false;
                ctx.props().on_placed.emit(order);
                false
            }
            Msg::Failed(err) => {
                self.submitting = false;
                self.wizard.error = Some(err.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let labels = [
            CheckoutStep::Information.title(),
            CheckoutStep::Review.title(),
            CheckoutStep::Payment.title(),
        ];
        html! {
            <div class="checkout">
                { step_indicator(&labels, usize::from(self.wizard.step.number() - 1)) }
                if let Some(error) = &self.wizard.error {
                    <div class="form-error">{ error.clone() }</div>
                }
                {
                    match self.wizard.step {
                        CheckoutStep::Information => self.build_information(link),
                        CheckoutStep::Review => self.build_review(ctx),
                        CheckoutStep::Payment => self.build_payment(link),
                    }
                }
                <div class="wizard-actions">
                    if self.wizard.step == CheckoutStep::Information {
                        { icon_button("arrow_back", "Back to cart", ctx.props().on_cancel.reform(|_| ()), false) }
                    } else {
                        { icon_button("arrow_back", "Back", link.callback(|_| Msg::Back), self.submitting) }
                    }
                    if self.wizard.step == CheckoutStep::Payment {
                        { icon_button("lock", if self.submitting { "Placing order..." } else { "Place order" },
                            link.callback(|_| Msg::Submit), self.submitting) }
                    } else {
                        { icon_button("arrow_forward", "Continue", link.callback(|_| Msg::Next), false) }
                    }
                </div>
            </div>
        }
    }
}

impl Checkout {
    fn input(&self, link: &Scope<Self>, label: &str, field: CheckoutField, input_type: &str) -> Html {
        html! {
            <label class="field">
                <span>{ label.to_string() }</span>
                <input
                    type={input_type.to_string()}
                    value={self.wizard.form.get(field).to_string()}
                    oninput={link.callback(move |e: InputEvent| {
                        Msg::Edit(field, e.target_unchecked_into::<HtmlInputElement>().value())
                    })}
                />
            </label>
        }
    }

    fn build_information(&self, link: &Scope<Self>) -> Html {
        html! {
            <div class="wizard-step">
                <div class="field-row">
                    { self.input(link, "First name", CheckoutField::FirstName, "text") }
                    { self.input(link, "Last name", CheckoutField::LastName, "text") }
                </div>
                { self.input(link, "Email", CheckoutField::Email, "email") }
                { self.input(link, "Phone", CheckoutField::Phone, "tel") }
                { self.input(link, "Address", CheckoutField::Address, "text") }
                { self.input(link, "Apartment (optional)", CheckoutField::Apartment, "text") }
                <div class="field-row">
                    { self.input(link, "City", CheckoutField::City, "text") }
                    { self.input(link, "State", CheckoutField::State, "text") }
                    { self.input(link, "ZIP", CheckoutField::ZipCode, "text") }
                </div>
                { self.input(link, "Country", CheckoutField::Country, "text") }
            </div>
        }
    }

    fn build_review(&self, ctx: &Context<Self>) -> Html {
        let cart = &ctx.props().cart;
        let totals = cart.totals();
        let form = &self.wizard.form;
        html! {
            <div class="wizard-step">
                <h4>{"Ship to"}</h4>
                <p>
                    { format!("{} {}", form.first_name, form.last_name) }<br />
                    { form.address.clone() }<br />
                    { format!("{}, {} {}", form.city, form.state, form.zip_code) }
                </p>
                <h4>{"Items"}</h4>
                <ul>
                    { for cart.lines.iter().map(|line| html! {
                        <li>{ format!("{} x{} - {}", line.name, line.quantity, money(line.line_total())) }</li>
                    }) }
                </ul>
                <p class="total">{ format!("Total {}", money(totals.total)) }</p>
            </div>
        }
    }

    fn build_payment(&self, link: &Scope<Self>) -> Html {
        let method = self.wizard.payment_method;
        let form = &self.wizard.form;
        html! {
            <div class="wizard-step">
                <div class="payment-methods">
                    <label>
                        <input type="radio" name="payment" checked={method == PaymentMethod::Card}
                            onchange={link.callback(|_| Msg::SetPaymentMethod(PaymentMethod::Card))} />
                        {"Card"}
                    </label>
                    <label>
                        <input type="radio" name="payment" checked={method == PaymentMethod::Paypal}
                            onchange={link.callback(|_| Msg::SetPaymentMethod(PaymentMethod::Paypal))} />
                        {"PayPal"}
                    </label>
                </div>
                if method == PaymentMethod::Card {
                    { self.input(link, "Card number", CheckoutField::CardNumber, "text") }
                    { self.input(link, "Name on card", CheckoutField::CardName, "text") }
                    <div class="field-row">
                        { self.input(link, "Expiry (MM/YY)", CheckoutField::ExpiryDate, "text") }
                        { self.input(link, "CVV", CheckoutField::Cvv, "password") }
                    </div>
                    if !form.card_number.is_empty() {
                        <div class="muted">{ format!("Card ending in {}", last_four(&form.card_number)) }</div>
                    }
                    <label class="field checkbox">
                        <input type="checkbox" checked={form.save_card}
                            onchange={link.callback(|e: Event| {
                                Msg::ToggleSaveCard(e.target_unchecked_into::<HtmlInputElement>().checked())
                            })} />
                        <span>{"Save card for next time"}</span>
                    </label>
                }
                <label class="field checkbox">
                    <input type="checkbox" checked={form.agree_to_terms}
                        onchange={link.callback(|e: Event| {
                            Msg::ToggleTerms(e.target_unchecked_into::<HtmlInputElement>().checked())
                        })} />
                    <span>{"I agree to the terms and conditions"}</span>
                </label>
            </div>
        }
    }
}
