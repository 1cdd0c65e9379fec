//! Request and response bodies exchanged with the backend.

use checkout::LineItem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutIdBody<'a> {
    pub amount: &'a str,
    #[serde(rename = "type")]
    pub type_selector: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutIdResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default, alias = "checkoutId")]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBody<'a> {
    #[serde(rename = "resourcePath")]
    pub resource_path: &'a str,
    #[serde(rename = "type")]
    pub type_selector: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub result: ResultBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ResultBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BnplCheckoutBody {
    pub amount: String,
    pub products: Vec<BnplProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BnplProduct {
    pub product_id: String,
    pub variation_name: String,
    pub variation_sku: String,
    pub qty: u32,
}

impl From<&LineItem> for BnplProduct {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            variation_name: item.variation_name.clone(),
            variation_sku: item.variation_sku.clone(),
            qty: item.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BnplCheckoutResponse {
    #[serde(default)]
    pub checkout_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletTokenBody<'a> {
    pub checkout_id: &'a str,
    pub brand: &'static str,
    pub token: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WalletTokenResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default, rename = "resourcePath")]
    pub resource_path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeBody {
    pub session_id: String,
    pub provider_reference: Option<String>,
    pub amount: String,
}
