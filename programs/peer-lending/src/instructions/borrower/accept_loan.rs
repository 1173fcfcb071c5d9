use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::VAULT_SEED;
use crate::error::LendingError;
use crate::events::LoanAccepted;
use crate::state::{BorrowerProfile, Loan, LoanOffer, Obligation};

/// Accounts for accepting a loan offer
#[derive(Accounts)]
pub struct AcceptLoan<'info> {
    /// Borrower taking the offer
    #[account(mut)]
    pub borrower: Signer<'info>,

    /// The offer being accepted
    #[account(
        mut,
        seeds = [LoanOffer::SEED_PREFIX, loan_offer.lender.as_ref(), token_mint.key().as_ref()],
        bump = loan_offer.bump,
        has_one = token_mint @ LendingError::InvalidTokenMint,
        has_one = vault @ LendingError::InvalidVault
    )]
    pub loan_offer: Account<'info, LoanOffer>,

    /// Offer vault (source of the principal)
    #[account(
        mut,
        seeds = [VAULT_SEED, loan_offer.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, TokenAccount>,

    /// Loan for this (offer, borrower) pair
    /// PDA: ["loan", loan_offer, borrower]
    #[account(
        init_if_needed,
        payer = borrower,
        space = 8 + Loan::INIT_SPACE,
        seeds = [Loan::SEED_PREFIX, loan_offer.key().as_ref(), borrower.key().as_ref()],
        bump
    )]
    pub loan: Account<'info, Loan>,

    /// Borrower's obligation holding the collateral
    #[account(
        mut,
        seeds = [Obligation::SEED_PREFIX, borrower.key().as_ref()],
        bump = obligation.bump,
        has_one = borrower @ LendingError::InvalidLoanAccount
    )]
    pub obligation: Account<'info, Obligation>,

    /// Reputation account supplying the borrower's score
    #[account(
        seeds = [BorrowerProfile::SEED_PREFIX, borrower.key().as_ref()],
        bump = borrower_profile.bump
    )]
    pub borrower_profile: Account<'info, BorrowerProfile>,

    /// Borrower's token account (destination)
    #[account(
        mut,
        constraint = borrower_token_account.mint == token_mint.key() @ LendingError::InvalidTokenMint,
        constraint = borrower_token_account.owner == borrower.key() @ LendingError::InvalidTokenOwner
    )]
    pub borrower_token_account: Account<'info, TokenAccount>,

    /// Mint of the lent asset
    pub token_mint: Account<'info, Mint>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program
    pub system_program: Program<'info, System>,
}

/// Accept an offer: close it, open the loan, lock the obligation and pay
/// out the principal from the vault.
///
/// Account creation for the loan happens before validation, but a failing
/// check aborts the whole transaction so nothing persists.
pub fn handler(ctx: Context<AcceptLoan>) -> Result<()> {
    let clock = Clock::get()?;
    let borrower = ctx.accounts.borrower.key();
    let offer_key = ctx.accounts.loan_offer.key();
    let loan_key = ctx.accounts.loan.key();
    let score = ctx.accounts.borrower_profile.score;

    let loan_offer = &mut ctx.accounts.loan_offer;
    let obligation = &mut ctx.accounts.obligation;
    let loan = &mut ctx.accounts.loan;

    let principal = loan.accept(
        offer_key,
        loan_offer,
        obligation,
        borrower,
        score,
        clock.unix_timestamp,
        ctx.bumps.loan,
    )?;

    require!(
        ctx.accounts.vault.amount >= principal,
        LendingError::InvalidVault
    );

    // Transfer principal from vault to borrower using the offer PDA as signer
    let lender = loan_offer.lender;
    let token_mint = loan_offer.token_mint;
    let bump = [loan_offer.bump];
    let seeds: &[&[u8]] = &[
        LoanOffer::SEED_PREFIX,
        lender.as_ref(),
        token_mint.as_ref(),
        &bump,
    ];
    let signer_seeds = &[seeds];

    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.borrower_token_account.to_account_info(),
            authority: loan_offer.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, principal)?;

    emit!(LoanAccepted {
        loan: loan_key,
        offer: offer_key,
        lender,
        borrower,
        principal,
        interest_owed: loan.interest_owed,
        repay_by_time: loan.repay_by_time,
        timestamp: clock.unix_timestamp,
    });

    msg!(
        "Loan accepted: Borrower {} received {} from offer {}",
        borrower,
        principal,
        offer_key
    );

    Ok(())
}
