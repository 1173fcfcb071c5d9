use anchor_lang::prelude::*;

// ============================================================================
// OFFER EVENTS
// ============================================================================

/// Emitted when a lender opens and funds an offer
#[event]
pub struct OfferCreated {
    pub offer: Pubkey,
    pub lender: Pubkey,
    pub token_mint: Pubkey,
    pub vault: Pubkey,
    pub amount: u64,
    pub interest_rate_bps: u16,
    pub duration_seconds: u64,
    pub min_score: u64,
    pub timestamp: i64,
}

// ============================================================================
// OBLIGATION EVENTS
// ============================================================================

/// Emitted when a borrower creates or tops up their obligation
#[event]
pub struct CollateralDeposited {
    pub obligation: Pubkey,
    pub borrower: Pubkey,
    pub collateral_mint: Pubkey,
    pub amount: u64,
    pub new_deposited_amount: u64,
}

/// Emitted when a borrower profile is created
#[event]
pub struct BorrowerProfileInitialized {
    pub borrower_profile: Pubkey,
    pub borrower: Pubkey,
}

// ============================================================================
// LOAN EVENTS
// ============================================================================

/// Emitted when an offer is accepted and the principal leaves the vault
#[event]
pub struct LoanAccepted {
    pub loan: Pubkey,
    pub offer: Pubkey,
    pub lender: Pubkey,
    pub borrower: Pubkey,
    pub principal: u64,
    pub interest_owed: u64,
    pub repay_by_time: i64,
    pub timestamp: i64,
}

/// Emitted when a loan is repaid and collateral released
#[event]
pub struct LoanRepaid {
    pub loan: Pubkey,
    pub offer: Pubkey,
    pub borrower: Pubkey,
    pub lender: Pubkey,
    pub amount_paid: u64,
    pub collateral_returned: u64,
    pub new_score: u64,
    pub timestamp: i64,
}
