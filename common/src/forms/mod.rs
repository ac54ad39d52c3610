//! Client-side multi-step form machines.
//!
//! Each wizard owns its field values for the whole flow. Moving forward runs
//! the current step's validation synchronously and refuses to advance on
//! failure. Moving back never clears anything. Only the final step produces a
//! request DTO.

pub mod card;
pub mod checkout;
pub mod registration;
