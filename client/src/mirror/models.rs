//! Records served by the marketplace service. Timestamps are kept as the
//! RFC 3339 strings the service emits.

use serde::{Deserialize, Serialize};

/// A published offer. Every field is optional on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanOffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// On-chain address of the offer account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Percentage, e.g. 5.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_mint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_mint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_amount: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_apy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_mint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_mint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub loan_address: String,
    pub lender_address: String,
    pub borrower_address: String,
    pub amount: f64,
    pub apy: f64,
    pub token: String,
    pub collateral_token: String,
    pub collateral_amount: f64,
    pub duration: i64,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
}

/// Body for posting a comment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LenderStat {
    pub address: String,
    pub apy: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_volume: f64,
    pub average_apy: f64,
    pub active_loans_count: i64,
    #[serde(default)]
    pub top_lenders: Vec<LenderStat>,
    #[serde(default)]
    pub popular_collaterals: Vec<String>,
}

/// Body of `POST /offers/{id}/accept`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptOffer {
    pub loan_address: String,
    pub borrower_address: String,
}

/// Error body returned on non-2xx responses
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error: String,
}
