//! Payment method tag shared by sales and membership payments

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a sale or membership was paid. The Spanish tags are both the wire and the
/// storage representation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Efectivo")]
    #[strum(serialize = "Efectivo")]
    #[sqlx(rename = "Efectivo")]
    Cash,

    #[serde(rename = "Tarjeta")]
    #[strum(serialize = "Tarjeta")]
    #[sqlx(rename = "Tarjeta")]
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
        }
    }
}
