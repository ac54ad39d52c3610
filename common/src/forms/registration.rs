//! Three-step sign-up that branches on the account type at step two.
//!
//! Parents describe their child; educators pick the language they teach and
//! their timezone. Both finish with scheduling preferences and the terms.

use serde::{Deserialize, Serialize};

use crate::requests::{AccountDetails, ChildDetails, EducatorDetails, RegisterRequest};
use crate::validation::{check_email, check_new_password, require, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Parent,
    Educator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegistrationStep {
    Account = 1,
    Details = 2,
    Preferences = 3,
}

impl RegistrationStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub parent_first_name: String,
    pub parent_last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_age: String,
    pub language_interest: String,
    pub current_level: String,
    pub timezone: String,
    pub preferred_schedule: String,
    pub goals: String,
    pub how_heard: String,
    pub agree_to_terms: bool,
    pub subscribe_newsletter: bool,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWizard {
    pub step: RegistrationStep,
    pub account_type: AccountType,
    pub form: RegistrationForm,
    pub error: Option<String>,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self {
            step: RegistrationStep::Account,
            account_type: AccountType::Parent,
            form: RegistrationForm::default(),
            error: None,
        }
    }
}

impl RegistrationWizard {
    pub fn new(account_type: AccountType) -> Self {
        Self {
            account_type,
            ..Self::default()
        }
    }

    /// The account type can be switched at any point. Fields that belong to
    /// the other branch are kept in case the user switches back.
    pub fn set_account_type(&mut self, account_type: AccountType) {
        self.account_type = account_type;
    }

    fn validate_step(&self, step: RegistrationStep) -> Result<(), ValidationError> {
        let f = &self.form;
        match step {
            RegistrationStep::Account => {
                require(&[
                    ("parent_first_name", &f.parent_first_name),
                    ("parent_last_name", &f.parent_last_name),
                    ("email", &f.email),
                    ("phone", &f.phone),
                    ("password", &f.password),
                    ("confirm_password", &f.confirm_password),
                ])?;
                check_email(&f.email)?;
                check_new_password(&f.password, &f.confirm_password)
            }
            RegistrationStep::Details => match self.account_type {
                AccountType::Parent => {
                    require(&[
                        ("child_first_name", &f.child_first_name),
                        ("child_last_name", &f.child_last_name),
                        ("child_age", &f.child_age),
                        ("language_interest", &f.language_interest),
                        ("current_level", &f.current_level),
                    ])?;
                    self.child_age().map(|_| ())
                }
                AccountType::Educator => require(&[
                    ("language_interest", &f.language_interest),
                    ("timezone", &f.timezone),
                ]),
            },
            RegistrationStep::Preferences => {
                require(&[("timezone", &f.timezone)])?;
                if f.agree_to_terms {
                    Ok(())
                } else {
                    Err(ValidationError::TermsNotAccepted)
                }
            }
        }
    }

    fn child_age(&self) -> Result<u8, ValidationError> {
        self.form
            .child_age
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|age| (3..=18).contains(age))
            .ok_or_else(|| ValidationError::Invalid("Please select your child's age".to_string()))
    }

    pub fn next(&mut self) -> Result<RegistrationStep, ValidationError> {
        let result = self.validate_step(self.step).and_then(|_| match self.step {
            RegistrationStep::Account => Ok(RegistrationStep::Details),
            RegistrationStep::Details => Ok(RegistrationStep::Preferences),
            RegistrationStep::Preferences => {
                Err(ValidationError::Invalid("Already at the last step".to_string()))
            }
        });
        self.error = result.as_ref().err().map(ToString::to_string);
        let step = result?;
        self.step = step;
        Ok(step)
    }

    pub fn back(&mut self) -> RegistrationStep {
        self.step = match self.step {
            RegistrationStep::Account | RegistrationStep::Details => RegistrationStep::Account,
            RegistrationStep::Preferences => RegistrationStep::Details,
        };
        self.error = None;
        self.step
    }

    /// Re-validates all three steps and builds the tagged sign-up request.
    pub fn submit(&mut self) -> Result<RegisterRequest, ValidationError> {
        let result = self.build_request();
        self.error = result.as_ref().err().map(ToString::to_string);
        result
    }

    fn build_request(&self) -> Result<RegisterRequest, ValidationError> {
        for step in [
            RegistrationStep::Account,
            RegistrationStep::Details,
            RegistrationStep::Preferences,
        ] {
            self.validate_step(step)?;
        }
        if self.step != RegistrationStep::Preferences {
            return Err(ValidationError::Invalid(
                "Please complete every registration step".to_string(),
            ));
        }

        let f = &self.form;
        let account = match self.account_type {
            AccountType::Parent => AccountDetails::Parent(ChildDetails {
                child_first_name: f.child_first_name.trim().to_string(),
                child_last_name: f.child_last_name.trim().to_string(),
                child_age: self.child_age()?,
                language_interest: f.language_interest.clone(),
                current_level: f.current_level.clone(),
                goals: optional(&f.goals),
                preferred_schedule: optional(&f.preferred_schedule),
            }),
            AccountType::Educator => AccountDetails::Educator(EducatorDetails {
                language_interest: f.language_interest.clone(),
            }),
        };
        let request = RegisterRequest {
            email: f.email.trim().to_string(),
            password: f.password.clone(),
            first_name: f.parent_first_name.trim().to_string(),
            last_name: f.parent_last_name.trim().to_string(),
            phone: optional(&f.phone),
            timezone: optional(&f.timezone),
            how_heard: optional(&f.how_heard),
            subscribe_newsletter: f.subscribe_newsletter,
            account,
        };
        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_account() -> RegistrationWizard {
        let mut wizard = RegistrationWizard::default();
        let f = &mut wizard.form;
        f.parent_first_name = "Ngozi".into();
        f.parent_last_name = "Okafor".into();
        f.email = "ngozi@example.com".into();
        f.phone = "555-0101".into();
        f.password = "correct horse".into();
        f.confirm_password = "correct horse".into();
        wizard
    }

    #[test]
    fn step_one_requires_every_account_field() {
        let mut wizard = with_account();
        wizard.form.phone.clear();
        assert!(wizard.next().is_err());
        assert_eq!(wizard.step, RegistrationStep::Account);

        let mut mismatch = with_account();
        mismatch.form.confirm_password = "something else".into();
        assert_eq!(mismatch.next(), Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn parent_branch_needs_child_details() {
        let mut wizard = with_account();
        assert_eq!(wizard.next(), Ok(RegistrationStep::Details));
        assert!(wizard.next().is_err());

        let f = &mut wizard.form;
        f.child_first_name = "Ada".into();
        f.child_last_name = "Okafor".into();
        f.child_age = "7".into();
        f.language_interest = "yoruba".into();
        f.current_level = "beginner".into();
        assert_eq!(wizard.next(), Ok(RegistrationStep::Preferences));
    }

    #[test]
    fn educator_branch_needs_language_and_timezone() {
        let mut wizard = with_account();
        wizard.set_account_type(AccountType::Educator);
        wizard.next().unwrap();
        wizard.form.language_interest = "twi".into();
        assert!(wizard.next().is_err());
        wizard.form.timezone = "UTC+0".into();
        assert_eq!(wizard.next(), Ok(RegistrationStep::Preferences));

        wizard.form.agree_to_terms = true;
        let request = wizard.submit().unwrap();
        assert!(matches!(request.account, AccountDetails::Educator(_)));
        assert_eq!(request.timezone.as_deref(), Some("UTC+0"));
    }

    #[test]
    fn back_keeps_entered_values() {
        let mut wizard = with_account();
        wizard.next().unwrap();
        wizard.form.child_first_name = "Ada".into();
        assert_eq!(wizard.back(), RegistrationStep::Account);
        assert_eq!(wizard.form.email, "ngozi@example.com");
        wizard.next().unwrap();
        assert_eq!(wizard.form.child_first_name, "Ada");
    }

    #[test]
    fn parent_submission_builds_child_details() {
        let mut wizard = with_account();
        wizard.next().unwrap();
        let f = &mut wizard.form;
        f.child_first_name = "Ada".into();
        f.child_last_name = "Okafor".into();
        f.child_age = "9".into();
        f.language_interest = "kiswahili".into();
        f.current_level = "some".into();
        wizard.next().unwrap();

        assert_eq!(wizard.submit(), Err(ValidationError::MissingFields(vec!["timezone"])));
        wizard.form.timezone = "UTC+1".into();
        assert_eq!(wizard.submit(), Err(ValidationError::TermsNotAccepted));
        wizard.form.agree_to_terms = true;

        let request = wizard.submit().unwrap();
        match request.account {
            AccountDetails::Parent(child) => {
                assert_eq!(child.child_age, 9);
                assert_eq!(child.goals, None);
            }
            other => panic!("unexpected account {:?}", other),
        }
    }

    #[test]
    fn child_age_must_be_a_number() {
        let mut wizard = with_account();
        wizard.next().unwrap();
        let f = &mut wizard.form;
        f.child_first_name = "Ada".into();
        f.child_last_name = "Okafor".into();
        f.child_age = "seven".into();
        f.language_interest = "twi".into();
        f.current_level = "none".into();
        assert!(matches!(wizard.next(), Err(ValidationError::Invalid(_))));
    }
}
