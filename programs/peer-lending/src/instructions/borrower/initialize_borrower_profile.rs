use anchor_lang::prelude::*;

use crate::events::BorrowerProfileInitialized;
use crate::state::BorrowerProfile;

/// Accounts for creating a borrower's reputation profile
#[derive(Accounts)]
pub struct InitializeBorrowerProfile<'info> {
    /// Borrower who owns this profile
    #[account(mut)]
    pub borrower: Signer<'info>,

    /// PDA: ["borrower_profile", borrower]
    #[account(
        init,
        payer = borrower,
        space = 8 + BorrowerProfile::INIT_SPACE,
        seeds = [BorrowerProfile::SEED_PREFIX, borrower.key().as_ref()],
        bump
    )]
    pub borrower_profile: Account<'info, BorrowerProfile>,

    /// System program
    pub system_program: Program<'info, System>,
}

/// Create an empty profile (score 0) for the signing borrower
pub fn handler(ctx: Context<InitializeBorrowerProfile>) -> Result<()> {
    let clock = Clock::get()?;
    let borrower = ctx.accounts.borrower.key();
    let profile = &mut ctx.accounts.borrower_profile;

    profile.init(borrower, clock.unix_timestamp, ctx.bumps.borrower_profile);

    emit!(BorrowerProfileInitialized {
        borrower_profile: profile.key(),
        borrower,
    });

    msg!("Borrower profile initialized for: {}", borrower);

    Ok(())
}
