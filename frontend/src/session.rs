//! The signed-in user, their bearer token and the shopping cart, kept under a
//! single `localStorage` key so a reload restores all three together.

use common::cart::Cart;
use common::model::user::{AuthSession, Role, User};
use serde::{Deserialize, Serialize};

const STORAGE_KEY: &str = "ispeak_session";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    cart: Cart,
}

fn storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl Session {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Restores the stored session. Anything unreadable starts a fresh one.
    pub fn load() -> Self {
        let Some(raw) = storage().and_then(|s| s.get_item(STORAGE_KEY).ok().flatten()) else {
            return Self::default();
        };
        Self::from_json(&raw).unwrap_or_else(|e| {
            gloo_console::warn!(format!("Discarding stored session: {}", e));
            Self::default()
        })
    }

    pub fn save(&self) {
        let Some(storage) = storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(raw) => {
                if storage.set_item(STORAGE_KEY, &raw).is_err() {
                    gloo_console::error!("Could not persist the session");
                }
            }
            Err(e) => gloo_console::error!(format!("Could not serialize the session: {}", e)),
        }
    }

    pub fn sign_in(&mut self, auth: AuthSession) {
        self.token = Some(auth.token);
        self.user = Some(auth.user);
    }

    /// Forgets the account. The cart survives signing out.
    pub fn sign_out(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::cart::CartLine;

    #[test]
    fn missing_fields_default_and_garbage_is_rejected() {
        assert_eq!(Session::from_json("{}").unwrap(), Session::default());
        assert!(Session::from_json("{not json").is_err());
    }

    #[test]
    fn cart_survives_sign_out() {
        let mut session = Session::from_json(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(session.token(), Some("abc"));
        session.cart_mut().add(CartLine {
            product_id: 7,
            name: "Adinkra Tee".into(),
            unit_price: 24.99,
            quantity: 2,
            size: Some("M".into()),
            color: None,
            image: None,
        });
        session.sign_out();
        assert_eq!(session.token(), None);
        assert_eq!(session.cart().item_count(), 2);
    }
}
