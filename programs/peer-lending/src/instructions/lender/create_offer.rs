use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::VAULT_SEED;
use crate::error::LendingError;
use crate::events::OfferCreated;
use crate::state::{LoanOffer, OfferTerms};

/// Accounts for opening a loan offer
#[derive(Accounts)]
pub struct CreateOffer<'info> {
    /// Lender funding the offer
    #[account(mut)]
    pub lender: Signer<'info>,

    /// The offer account, one per (lender, mint)
    /// PDA: ["loan_offer", lender, token_mint]
    #[account(
        init_if_needed,
        payer = lender,
        space = 8 + LoanOffer::INIT_SPACE,
        seeds = [LoanOffer::SEED_PREFIX, lender.key().as_ref(), token_mint.key().as_ref()],
        bump
    )]
    pub loan_offer: Account<'info, LoanOffer>,

    /// Vault escrowing the principal, owned by the offer PDA
    /// PDA: ["vault", loan_offer]
    #[account(
        init_if_needed,
        payer = lender,
        token::mint = token_mint,
        token::authority = loan_offer,
        seeds = [VAULT_SEED, loan_offer.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, TokenAccount>,

    /// Lender's token account (source)
    #[account(
        mut,
        constraint = lender_token_account.mint == token_mint.key() @ LendingError::InvalidTokenMint,
        constraint = lender_token_account.owner == lender.key() @ LendingError::InvalidTokenOwner
    )]
    pub lender_token_account: Account<'info, TokenAccount>,

    /// Mint of the asset being lent
    pub token_mint: Account<'info, Mint>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program
    pub system_program: Program<'info, System>,
}

/// Open a loan offer and escrow its principal
///
/// The offer PDA is created on first use; a second call for the same
/// (lender, mint) fails with `OfferAlreadyExists` whether or not the first
/// offer was taken.
///
/// # Arguments
/// * `ctx` - The context containing all accounts
/// * `amount` - Principal to escrow (in native units)
/// * `interest_rate_bps` - Flat interest for the whole term
/// * `duration_seconds` - Loan term
/// * `min_score` - Minimum borrower score (0-1000)
pub fn handler(
    ctx: Context<CreateOffer>,
    amount: u64,
    interest_rate_bps: u16,
    duration_seconds: u64,
    min_score: u64,
) -> Result<()> {
    let terms = OfferTerms {
        amount,
        interest_rate_bps,
        duration_seconds,
        min_score,
    };
    let clock = Clock::get()?;
    let offer_key = ctx.accounts.loan_offer.key();
    let vault_key = ctx.accounts.vault.key();
    let lender_key = ctx.accounts.lender.key();
    let mint_key = ctx.accounts.token_mint.key();

    let loan_offer = &mut ctx.accounts.loan_offer;
    loan_offer.open(
        lender_key,
        mint_key,
        vault_key,
        &terms,
        clock.unix_timestamp,
        ctx.bumps.loan_offer,
    )?;

    // Transfer principal from lender to vault
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.lender_token_account.to_account_info(),
            to: ctx.accounts.vault.to_account_info(),
            authority: ctx.accounts.lender.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    emit!(OfferCreated {
        offer: offer_key,
        lender: lender_key,
        token_mint: mint_key,
        vault: vault_key,
        amount,
        interest_rate_bps,
        duration_seconds,
        min_score,
        timestamp: clock.unix_timestamp,
    });

    msg!(
        "Loan offer created with amount: {} and interest rate: {} bps",
        amount,
        interest_rate_bps
    );

    Ok(())
}
