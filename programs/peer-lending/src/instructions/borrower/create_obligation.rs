use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::COLLATERAL_VAULT_SEED;
use crate::error::LendingError;
use crate::events::CollateralDeposited;
use crate::state::Obligation;

/// Accounts for creating or topping up a borrower's obligation
#[derive(Accounts)]
pub struct CreateObligation<'info> {
    /// Borrower posting collateral
    #[account(mut)]
    pub borrower: Signer<'info>,

    /// The borrower's single obligation
    /// PDA: ["obligation", borrower]
    #[account(
        init_if_needed,
        payer = borrower,
        space = 8 + Obligation::INIT_SPACE,
        seeds = [Obligation::SEED_PREFIX, borrower.key().as_ref()],
        bump
    )]
    pub obligation: Account<'info, Obligation>,

    /// Collateral vault, owned by the obligation PDA
    /// PDA: ["collateral_vault", borrower, collateral_mint]
    #[account(
        init_if_needed,
        payer = borrower,
        token::mint = collateral_mint,
        token::authority = obligation,
        seeds = [COLLATERAL_VAULT_SEED, borrower.key().as_ref(), collateral_mint.key().as_ref()],
        bump
    )]
    pub collateral_vault: Account<'info, TokenAccount>,

    /// Borrower's collateral token account (source)
    #[account(
        mut,
        constraint = borrower_collateral_account.mint == collateral_mint.key() @ LendingError::InvalidTokenMint,
        constraint = borrower_collateral_account.owner == borrower.key() @ LendingError::InvalidTokenOwner
    )]
    pub borrower_collateral_account: Account<'info, TokenAccount>,

    /// Mint of the collateral asset
    pub collateral_mint: Account<'info, Mint>,

    /// Token program
    pub token_program: Program<'info, Token>,

    /// System program
    pub system_program: Program<'info, System>,
}

/// Deposit collateral, creating the obligation on first use
///
/// # Arguments
/// * `ctx` - The context containing all accounts
/// * `deposit_amount` - Collateral to escrow (in native units)
pub fn handler(ctx: Context<CreateObligation>, deposit_amount: u64) -> Result<()> {
    let borrower = ctx.accounts.borrower.key();
    let collateral_mint = ctx.accounts.collateral_mint.key();
    let collateral_vault = ctx.accounts.collateral_vault.key();

    let obligation = &mut ctx.accounts.obligation;
    let new_deposited_amount = obligation.deposit(
        borrower,
        collateral_mint,
        collateral_vault,
        deposit_amount,
        ctx.bumps.obligation,
    )?;
    let obligation_key = obligation.key();

    // Transfer collateral from borrower to vault
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.borrower_collateral_account.to_account_info(),
            to: ctx.accounts.collateral_vault.to_account_info(),
            authority: ctx.accounts.borrower.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, deposit_amount)?;

    emit!(CollateralDeposited {
        obligation: obligation_key,
        borrower,
        collateral_mint,
        amount: deposit_amount,
        new_deposited_amount,
    });

    msg!("Borrower {} deposited {} collateral", borrower, deposit_amount);

    Ok(())
}
