pub mod blog;
pub mod media;
pub mod order;
pub mod product;
pub mod user;
