//! Shared value types used across the payment crates.

pub mod money;
pub mod types;

pub use money::{Currency, Money, MoneyError};
pub use types::SessionId;
