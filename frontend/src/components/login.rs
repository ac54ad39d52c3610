use common::model::user::AuthSession;
use common::requests::LoginRequest;
use web_sys::HtmlInputElement;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{ApiClient, ApiError};

#[derive(Properties, PartialEq, Clone)]
pub struct LoginProps {
    pub client: ApiClient,
    pub on_signed_in: Callback<AuthSession>,
}

pub enum Msg {
    SetEmail(String),
    SetPassword(String),
    Submit,
    SignedIn(AuthSession),
    Failed(ApiError),
}

pub struct Login {
    email: String,
    password: String,
    error: Option<String>,
    submitting: bool,
}

impl Component for Login {
    type Message = Msg;
    type Properties = LoginProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            error: None,
            submitting: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetEmail(email) => {
                self.email = email;
                false
            }
            Msg::SetPassword(password) => {
                self.password = password;
                false
            }
            Msg::Submit => {
                let request = LoginRequest {
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                };
                if let Err(e) = request.validate() {
                    self.error = Some(e.to_string());
                    return true;
                }
                self.submitting = true;
                self.error = None;
                let client = ctx.props().client.clone();
                let link = ctx.link().clone();
                spawn_local(async move {
                    match client.login(&request).await {
                        Ok(session) => link.send_message(Msg::SignedIn(session)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                true
            }
            Msg::SignedIn(session) => {
                self.submitting = false;
                self.password.clear();
                ctx.props().on_signed_in.emit(session);
                true
            }
            Msg::Failed(err) => {
                self.submitting = false;
                self.error = Some(match err {
                    ApiError::Unauthorized => "Invalid email or password".to_string(),
                    other => other.to_string(),
                });
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Submit
        });
        html! {
            <form class="login" {onsubmit}>
                if let Some(error) = &self.error {
                    <div class="form-error">{ error.clone() }</div>
                }
                <label class="field">
                    <span>{"Email"}</span>
                    <input type="email" oninput={link.callback(|e: InputEvent| {
                        Msg::SetEmail(e.target_unchecked_into::<HtmlInputElement>().value())
                    })} />
                </label>
                <label class="field">
                    <span>{"Password"}</span>
                    <input type="password" oninput={link.callback(|e: InputEvent| {
                        Msg::SetPassword(e.target_unchecked_into::<HtmlInputElement>().value())
                    })} />
                </label>
                <button type="submit" disabled={self.submitting}>
                    { if self.submitting { "Signing in..." } else { "Sign in" } }
                </button>
            </form>
        }
    }
}
