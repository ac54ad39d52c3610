//! Types and rules shared by the iSPEAK backend and the browser client.
//!
//! Everything in here is pure: no I/O, no clocks beyond timestamps carried in
//! the models. The backend re-runs the same validation the client runs before
//! a request leaves the browser, so both sides reject the same shapes.

pub mod cart;
pub mod forms;
pub mod inventory;
pub mod jobs;
pub mod loyalty;
pub mod model;
pub mod requests;
pub mod upload;
pub mod validation;
