pub mod admin;
pub mod auth;
pub mod blog;
pub mod collections;
pub mod health;
pub mod jobs;
pub mod media;
pub mod orders;
pub mod portal;
pub mod products;

#[cfg(test)]
pub(crate) mod test_support;
