//! Off-chain marketplace mirror.
//!
//! The mirror is a convenience index. It never decides protocol state, and a
//! failed update never affects the on-chain outcome that triggered it.

pub mod events;
pub mod http;
pub mod models;

pub use events::{Envelope, EventDeduper, MirrorEvent};
pub use http::HttpMirror;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use peer_lending::constants::SECONDS_PER_DAY;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_sdk::signature::Signature;

use crate::builder::Intent;
use crate::error::MirrorError;
use crate::tokens::to_ui_amount;

/// A confirmed on-chain change, described for the mirror
#[derive(Clone, Debug, PartialEq)]
pub enum MirrorUpdate {
    OfferCreated {
        signature: Signature,
        offer: Pubkey,
        lender: Pubkey,
        token_mint: Pubkey,
        /// Display units
        amount: f64,
        /// Percentage
        apy: f64,
        duration_days: i64,
    },
    CollateralDeposited {
        signature: Signature,
        obligation: Pubkey,
        borrower: Pubkey,
        collateral_mint: Pubkey,
        amount: f64,
    },
    LoanAccepted {
        signature: Signature,
        offer: Pubkey,
        loan: Pubkey,
        lender: Pubkey,
        borrower: Pubkey,
    },
    LoanRepaid {
        signature: Signature,
        offer: Pubkey,
        loan: Pubkey,
        borrower: Pubkey,
    },
    BorrowerProfileCreated {
        signature: Signature,
        borrower: Pubkey,
    },
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

impl MirrorUpdate {
    /// `None` for intents the mirror does not track
    pub fn from_intent(intent: &Intent, signature: Signature) -> Option<Self> {
        match intent {
            Intent::Initialize => None,
            Intent::InitializeBorrowerProfile { borrower } => Some(Self::BorrowerProfileCreated {
                signature,
                borrower: *borrower,
            }),
            Intent::CreateOffer {
                offer,
                lender,
                token_mint,
                decimals,
                terms,
            } => Some(Self::OfferCreated {
                signature,
                offer: *offer,
                lender: *lender,
                token_mint: *token_mint,
                amount: as_f64(to_ui_amount(terms.amount, *decimals)),
                apy: as_f64(Decimal::from(terms.interest_rate_bps) / Decimal::ONE_HUNDRED),
                duration_days: (terms.duration_seconds / SECONDS_PER_DAY) as i64,
            }),
            Intent::DepositCollateral {
                obligation,
                borrower,
                collateral_mint,
                decimals,
                amount,
            } => Some(Self::CollateralDeposited {
                signature,
                obligation: *obligation,
                borrower: *borrower,
                collateral_mint: *collateral_mint,
                amount: as_f64(to_ui_amount(*amount, *decimals)),
            }),
            Intent::AcceptLoan {
                offer,
                loan,
                lender,
                borrower,
                ..
            } => Some(Self::LoanAccepted {
                signature,
                offer: *offer,
                loan: *loan,
                lender: *lender,
                borrower: *borrower,
            }),
            Intent::RepayLoan {
                offer,
                loan,
                borrower,
                ..
            } => Some(Self::LoanRepaid {
                signature,
                offer: *offer,
                loan: *loan,
                borrower: *borrower,
            }),
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::OfferCreated { signature, .. }
            | Self::CollateralDeposited { signature, .. }
            | Self::LoanAccepted { signature, .. }
            | Self::LoanRepaid { signature, .. }
            | Self::BorrowerProfileCreated { signature, .. } => signature,
        }
    }
}

/// Where confirmed changes are reported
#[async_trait]
pub trait Mirror: Send + Sync {
    async fn record(&self, update: &MirrorUpdate) -> Result<(), MirrorError>;
}
