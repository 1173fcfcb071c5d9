use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use instructions::*;

declare_id!("ED2jdSWtVbrUqtW37KTR6eTSCKRVggwuDMSLW2aWDpiW");

#[program]
pub mod peer_lending {
    use super::*;

    /// Establish program presence; touches no state
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        instructions::initialize::handler(ctx)
    }

    // ============================================================================
    // LENDER INSTRUCTIONS
    // ============================================================================

    /// Open an offer and escrow its principal
    pub fn create_offer(
        ctx: Context<CreateOffer>,
        amount: u64,
        interest_rate_bps: u16,
        duration_seconds: u64,
        min_score: u64,
    ) -> Result<()> {
        instructions::lender::create_offer::handler(
            ctx,
            amount,
            interest_rate_bps,
            duration_seconds,
            min_score,
        )
    }

    // ============================================================================
    // BORROWER INSTRUCTIONS
    // ============================================================================

    /// Create the borrower's reputation profile
    pub fn initialize_borrower_profile(ctx: Context<InitializeBorrowerProfile>) -> Result<()> {
        instructions::borrower::initialize_borrower_profile::handler(ctx)
    }

    /// Create or top up the borrower's obligation with collateral
    pub fn create_obligation(ctx: Context<CreateObligation>, deposit_amount: u64) -> Result<()> {
        instructions::borrower::create_obligation::handler(ctx, deposit_amount)
    }

    /// Accept an active offer against the borrower's obligation
    pub fn accept_loan(ctx: Context<AcceptLoan>) -> Result<()> {
        instructions::borrower::accept_loan::handler(ctx)
    }

    /// Repay principal and interest, recovering collateral
    pub fn repay_loan(ctx: Context<RepayLoan>, repayment_amount: u64) -> Result<()> {
        instructions::borrower::repay_loan::handler(ctx, repayment_amount)
    }
}
