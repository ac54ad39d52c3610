pub mod admin_dashboard;
pub mod blog_composer;
pub mod checkout;
pub mod login;
pub mod media_library;
pub mod register;
pub mod shop;
pub mod widgets;
