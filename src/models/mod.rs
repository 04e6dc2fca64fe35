//! Models module for gym-desk
//!
//! Contains all data models and their validation logic.

pub mod attendance;
pub mod cash_closing;
pub mod client;
pub mod mass_message;
pub mod membership;
pub mod money;
pub mod operator;
pub mod payment_method;
pub mod product;
pub mod sale;
pub mod service;
pub mod statistics;

// Re-export commonly used types
pub use cash_closing::{CashClosing, ClosingOutcome, PeriodTotals, ReconciliationError};
pub use payment_method::PaymentMethod;
pub use sale::{Cart, CartError, CartLine};
pub use service::{ServiceType, ServiceTypeError};
