//! Three-step checkout: contact and shipping details, order review, payment.

use serde::{Deserialize, Serialize};

use super::card::{check_card_number, check_cvv, format_card_number, format_expiry};
use crate::cart::Cart;
use crate::model::order::Address;
use crate::requests::{CreateOrderRequest, OrderLineRequest, PaymentMethod};
use crate::validation::{check_email, require, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckoutStep {
    Information = 1,
    Review = 2,
    Payment = 3,
}

impl CheckoutStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn title(&self) -> &'static str {
        match self {
            CheckoutStep::Information => "Information",
            CheckoutStep::Review => "Review",
            CheckoutStep::Payment => "Payment",
        }
    }

    fn next(&self) -> Option<Self> {
        match self {
            CheckoutStep::Information => Some(CheckoutStep::Review),
            CheckoutStep::Review => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => None,
        }
    }

    fn previous(&self) -> Option<Self> {
        match self {
            CheckoutStep::Information => None,
            CheckoutStep::Review => Some(CheckoutStep::Information),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
    pub save_card: bool,
    pub agree_to_terms: bool,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            apartment: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "US".to_string(),
            card_number: String::new(),
            card_name: String::new(),
            expiry_date: String::new(),
            cvv: String::new(),
            save_card: true,
            agree_to_terms: false,
        }
    }
}

/// Text inputs of the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    Apartment,
    City,
    State,
    ZipCode,
    Country,
    CardNumber,
    CardName,
    ExpiryDate,
    Cvv,
}

impl CheckoutForm {
    /// Writes a text input. Card number and expiry are reformatted as typed.
    pub fn set(&mut self, field: CheckoutField, value: &str) {
        let slot = match field {
            CheckoutField::FirstName => &mut self.first_name,
            CheckoutField::LastName => &mut self.last_name,
            CheckoutField::Email => &mut self.email,
            CheckoutField::Phone => &mut self.phone,
            CheckoutField::Address => &mut self.address,
            CheckoutField::Apartment => &mut self.apartment,
            CheckoutField::City => &mut self.city,
            CheckoutField::State => &mut self.state,
            CheckoutField::ZipCode => &mut self.zip_code,
            CheckoutField::Country => &mut self.country,
            CheckoutField::CardNumber => {
                self.card_number = format_card_number(value);
                return;
            }
            CheckoutField::CardName => &mut self.card_name,
            CheckoutField::ExpiryDate => {
                self.expiry_date = format_expiry(value);
                return;
            }
            CheckoutField::Cvv => &mut self.cvv,
        };
        *slot = value.to_string();
    }

    pub fn get(&self, field: CheckoutField) -> &str {
        match field {
            CheckoutField::FirstName => &self.first_name,
            CheckoutField::LastName => &self.last_name,
            CheckoutField::Email => &self.email,
            CheckoutField::Phone => &self.phone,
            CheckoutField::Address => &self.address,
            CheckoutField::Apartment => &self.apartment,
            CheckoutField::City => &self.city,
            CheckoutField::State => &self.state,
            CheckoutField::ZipCode => &self.zip_code,
            CheckoutField::Country => &self.country,
            CheckoutField::CardNumber => &self.card_number,
            CheckoutField::CardName => &self.card_name,
            CheckoutField::ExpiryDate => &self.expiry_date,
            CheckoutField::Cvv => &self.cvv,
        }
    }

    pub fn validate_information(&self) -> Result<(), ValidationError> {
        require(&[
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
        ])?;
        check_email(&self.email)
    }

    pub fn validate_payment(&self, method: PaymentMethod) -> Result<(), ValidationError> {
        if method == PaymentMethod::Card {
            if [&self.card_number, &self.card_name, &self.expiry_date, &self.cvv]
                .iter()
                .any(|v| v.trim().is_empty())
            {
                return Err(ValidationError::IncompletePayment);
            }
            check_card_number(&self.card_number)?;
            check_cvv(&self.cvv)?;
        }
        if !self.agree_to_terms {
            return Err(ValidationError::TermsNotAccepted);
        }
        Ok(())
    }

    fn shipping_address(&self) -> Address {
        let apartment = self.apartment.trim();
        Address {
            address: self.address.trim().to_string(),
            apartment: (!apartment.is_empty()).then(|| apartment.to_string()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutWizard {
    pub step: CheckoutStep,
    pub form: CheckoutForm,
    pub payment_method: PaymentMethod,
    /// Banner text from the last refused transition.
    pub error: Option<String>,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    pub fn new() -> Self {
        Self {
            step: CheckoutStep::Information,
            form: CheckoutForm::default(),
            payment_method: PaymentMethod::Card,
            error: None,
        }
    }

    fn validate_step(&self, step: CheckoutStep) -> Result<(), ValidationError> {
        match step {
            CheckoutStep::Information => self.form.validate_information(),
            CheckoutStep::Review => Ok(()),
            CheckoutStep::Payment => self.form.validate_payment(self.payment_method),
        }
    }

    fn record<T>(&mut self, result: Result<T, ValidationError>) -> Result<T, ValidationError> {
        self.error = result.as_ref().err().map(ToString::to_string);
        result
    }

    /// Validates the current step and moves to the next one.
    pub fn next(&mut self) -> Result<CheckoutStep, ValidationError> {
        let result = self.validate_step(self.step).and_then(|_| {
            self.step
                .next()
                .ok_or_else(|| ValidationError::Invalid("Already at the last step".to_string()))
        });
        let step = self.record(result)?;
        self.step = step;
        Ok(step)
    }

    /// Steps back without touching any entered value.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.error = None;
        self.step
    }

    /// Validates every step and builds the order for the cart's contents.
    pub fn submit(&mut self, cart: &Cart) -> Result<CreateOrderRequest, ValidationError> {
        let result = self.build_order(cart);
        self.record(result)
    }

    fn build_order(&self, cart: &Cart) -> Result<CreateOrderRequest, ValidationError> {
        self.validate_step(CheckoutStep::Information)?;
        if self.step != CheckoutStep::Payment {
            return Err(ValidationError::Invalid(
                "Please complete every checkout step".to_string(),
            ));
        }
        self.validate_step(CheckoutStep::Payment)?;

        let form = &self.form;
        let request = CreateOrderRequest {
            customer_email: form.email.trim().to_string(),
            customer_first_name: form.first_name.trim().to_string(),
            customer_last_name: form.last_name.trim().to_string(),
            customer_phone: Some(form.phone.trim().to_string()),
            shipping_address: form.shipping_address(),
            billing_address: None,
            items: cart
                .lines
                .iter()
                .map(|line| OrderLineRequest {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    size: line.size.clone(),
                    color: line.color.clone(),
                })
                .collect(),
            coupon_code: cart.promo.map(|p| p.code().to_string()),
            payment_method: self.payment_method,
        };
        request.validate()?;
        Ok(request)
    }
}
