//! Sign-up wizard. Step two asks parents about their child and educators
//! about what they teach.

use common::forms::registration::{AccountType, RegistrationForm, RegistrationStep, RegistrationWizard};
use common::model::user::AuthSession;
use web_sys::{HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{ApiClient, ApiError};
use crate::components::widgets::{icon_button, step_indicator};

const LANGUAGES: [&str; 4] = ["Twi", "Swahili", "Yoruba", "Zulu"];
const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const TIMEZONES: [&str; 5] = [
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "Europe/London",
    "Africa/Accra",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegField {
    ParentFirstName,
    ParentLastName,
    Email,
    Phone,
    Password,
    ConfirmPassword,
    ChildFirstName,
    ChildLastName,
    ChildAge,
    LanguageInterest,
    CurrentLevel,
    Timezone,
    PreferredSchedule,
    Goals,
    HowHeard,
}

fn slot(form: &mut RegistrationForm, field: RegField) -> &mut String {
    match field {
        RegField::ParentFirstName => &mut form.parent_first_name,
        RegField::ParentLastName => &mut form.parent_last_name,
        RegField::Email => &mut form.email,
        RegField::Phone => &mut form.phone,
        RegField::Password => &mut form.password,
        RegField::ConfirmPassword => &mut form.confirm_password,
        RegField::ChildFirstName => &mut form.child_first_name,
        RegField::ChildLastName => &mut form.child_last_name,
        RegField::ChildAge => &mut form.child_age,
        RegField::LanguageInterest => &mut form.language_interest,
        RegField::CurrentLevel => &mut form.current_level,
        RegField::Timezone => &mut form.timezone,
        RegField::PreferredSchedule => &mut form.preferred_schedule,
        RegField::Goals => &mut form.goals,
        RegField::HowHeard => &mut form.how_heard,
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct RegisterProps {
    pub client: ApiClient,
    pub on_signed_in: Callback<AuthSession>,
}

pub enum Msg {
    SetAccountType(AccountType),
    Edit(RegField, String),
    ToggleTerms(bool),
    ToggleNewsletter(bool),
    Next,
    Back,
    Submit,
    Registered(AuthSession),
    Failed(ApiError),
}

pub struct Register {
    wizard: RegistrationWizard,
    submitting: bool,
}

impl Component for Register {
    type Message = Msg;
    type Properties = RegisterProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            wizard: RegistrationWizard::new(AccountType::Parent),
            submitting: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetAccountType(account_type) => {
                self.wizard.set_account_type(account_type);
                true
            }
            Msg::Edit(field, value) => {
                *slot(&mut self.wizard.form, field) = value;
                true
            }
            Msg::ToggleTerms(agree) => {
                self.wizard.form.agree_to_terms = agree;
                true
            }
            Msg::ToggleNewsletter(subscribe) => {
                self.wizard.form.subscribe_newsletter = subscribe;
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
                let Ok(request) = self.wizard.submit() else {
                    return true;
                };
                self.submitting = true;
                let client = ctx.props().client.clone();
                let link = ctx.link().clone();
                spawn_local(async move {
                    match client.register(&request).await {
                        Ok(session) => link.send_message(Msg::Registered(session)),
                        Err(e) => link.send_message(Msg::Failed(e)),
                    }
                });
                true
            }
            Msg::Registered(session) => {
                self.submitting = false;
                ctx.props().on_signed_in.emit(session);
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
        let step = self.wizard.step;
        html! {
            <div class="register">
                { step_indicator(&["Account", "Details", "Preferences"], usize::from(step.number() - 1)) }
                if let Some(error) = &self.wizard.error {
                    <div class="form-error">{ error.clone() }</div>
                }
                {
                    match step {
                        RegistrationStep::Account => self.build_account(link),
                        RegistrationStep::Details => self.build_details(link),
                        RegistrationStep::Preferences => self.build_preferences(link),
                    }
                }
                <div class="wizard-actions">
                    if step != RegistrationStep::Account {
                        { icon_button("arrow_back", "Back", link.callback(|_| Msg::Back), self.submitting) }
                    }
                    if step == RegistrationStep::Preferences {
                        { icon_button("how_to_reg", if self.submitting { "Creating account..." } else { "Create account" },
                            link.callback(|_| Msg::Submit), self.submitting) }
                    } else {
                        { icon_button("arrow_forward", "Continue", link.callback(|_| Msg::Next), false) }
                    }
                </div>
            </div>
        }
    }
}

impl Register {
    fn value(&self, field: RegField) -> String {
        let f = &self.wizard.form;
        match field {
            RegField::ParentFirstName => &f.parent_first_name,
            RegField::ParentLastName => &f.parent_last_name,
            RegField::Email => &f.email,
            RegField::Phone => &f.phone,
            RegField::Password => &f.password,
            RegField::ConfirmPassword => &f.confirm_password,
            RegField::ChildFirstName => &f.child_first_name,
            RegField::ChildLastName => &f.child_last_name,
            RegField::ChildAge => &f.child_age,
            RegField::LanguageInterest => &f.language_interest,
            RegField::CurrentLevel => &f.current_level,
            RegField::Timezone => &f.timezone,
            RegField::PreferredSchedule => &f.preferred_schedule,
            RegField::Goals => &f.goals,
            RegField::HowHeard => &f.how_heard,
        }
        .clone()
    }

    fn input(&self, link: &Scope<Self>, label: &str, field: RegField, input_type: &str) -> Html {
        html! {
            <label class="field">
                <span>{ label.to_string() }</span>
                <input
                    type={input_type.to_string()}
                    value={self.value(field)}
                    oninput={link.callback(move |e: InputEvent| {
                        Msg::Edit(field, e.target_unchecked_into::<HtmlInputElement>().value())
                    })}
                />
            </label>
        }
    }

    fn select(&self, link: &Scope<Self>, label: &str, field: RegField, options: &[&str]) -> Html {
        let current = self.value(field);
        html! {
            <label class="field">
                <span>{ label.to_string() }</span>
                <select onchange={link.callback(move |e: Event| {
                    Msg::Edit(field, e.target_unchecked_into::<HtmlSelectElement>().value())
                })}>
                    <option value="" selected={current.is_empty()}>{"Select..."}</option>
                    { for options.iter().map(|option| html! {
                        <option value={option.to_string()} selected={current == *option}>{ option.to_string() }</option>
                    }) }
                </select>
            </label>
        }
    }

    fn build_account(&self, link: &Scope<Self>) -> Html {
        let account_type = self.wizard.account_type;
        html! {
            <div class="wizard-step">
                <div class="account-types">
                    <label>
                        <input type="radio" name="account-type" checked={account_type == AccountType::Parent}
                            onchange={link.callback(|_| Msg::SetAccountType(AccountType::Parent))} />
                        {"I'm a parent"}
                    </label>
                    <label>
                        <input type="radio" name="account-type" checked={account_type == AccountType::Educator}
                            onchange={link.callback(|_| Msg::SetAccountType(AccountType::Educator))} />
                        {"I'm an educator"}
                    </label>
                </div>
                <div class="field-row">
                    { self.input(link, "First name", RegField::ParentFirstName, "text") }
                    { self.input(link, "Last name", RegField::ParentLastName, "text") }
                </div>
                { self.input(link, "Email", RegField::Email, "email") }
                { self.input(link, "Phone", RegField::Phone, "tel") }
                { self.input(link, "Password", RegField::Password, "password") }
                { self.input(link, "Confirm password", RegField::ConfirmPassword, "password") }
            </div>
        }
    }

    fn build_details(&self, link: &Scope<Self>) -> Html {
        match self.wizard.account_type {
            AccountType::Parent => {
                let ages: Vec<String> = (3..=18).map(|age: u8| age.to_string()).collect();
                let ages: Vec<&str> = ages.iter().map(String::as_str).collect();
                html! {
                    <div class="wizard-step">
                        <div class="field-row">
                            { self.input(link, "Child's first name", RegField::ChildFirstName, "text") }
                            { self.input(link, "Child's last name", RegField::ChildLastName, "text") }
                        </div>
                        { self.select(link, "Child's age", RegField::ChildAge, &ages) }
                        { self.select(link, "Language", RegField::LanguageInterest, &LANGUAGES) }
                        { self.select(link, "Current level", RegField::CurrentLevel, &LEVELS) }
                    </div>
                }
            }
            AccountType::Educator => html! {
                <div class="wizard-step">
                    { self.select(link, "Language you teach", RegField::LanguageInterest, &LANGUAGES) }
                    { self.select(link, "Timezone", RegField::Timezone, &TIMEZONES) }
                </div>
            },
        }
    }

    fn build_preferences(&self, link: &Scope<Self>) -> Html {
        let form = &self.wizard.form;
        html! {
            <div class="wizard-step">
                { self.select(link, "Timezone", RegField::Timezone, &TIMEZONES) }
                { self.input(link, "Preferred schedule", RegField::PreferredSchedule, "text") }
                <label class="field">
                    <span>{"Goals"}</span>
                    <textarea
                        rows="3"
                        value={form.goals.clone()}
                        oninput={link.callback(|e: InputEvent| {
                            Msg::Edit(RegField::Goals, e.target_unchecked_into::<HtmlTextAreaElement>().value())
                        })}
                    />
                </label>
                { self.input(link, "How did you hear about us?", RegField::HowHeard, "text") }
                <label class="field checkbox">
                    <input type="checkbox" checked={form.subscribe_newsletter}
                        onchange={link.callback(|e: Event| {
                            Msg::ToggleNewsletter(e.target_unchecked_into::<HtmlInputElement>().checked())
                        })} />
                    <span>{"Send me the newsletter"}</span>
                </label>
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_maps_to_its_own_slot() {
        let mut form = RegistrationForm::default();
        *slot(&mut form, RegField::ChildAge) = "9".to_string();
        *slot(&mut form, RegField::Timezone) = "Africa/Accra".to_string();
        assert_eq!(form.child_age, "9");
        assert_eq!(form.timezone, "Africa/Accra");
        assert!(form.email.is_empty());
    }
}
