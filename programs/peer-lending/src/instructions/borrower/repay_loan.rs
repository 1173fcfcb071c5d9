use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::COLLATERAL_VAULT_SEED;
use crate::error::LendingError;
use crate::events::LoanRepaid;
use crate::state::{BorrowerProfile, Loan, LoanOffer, Obligation};

/// Accounts for repaying a loan
#[derive(Accounts)]
pub struct RepayLoan<'info> {
    /// Borrower repaying the loan
    #[account(mut)]
    pub borrower: Signer<'info>,

    /// Offer the loan was accepted from
    #[account(
        seeds = [LoanOffer::SEED_PREFIX, loan_offer.lender.as_ref(), loan_offer.token_mint.as_ref()],
        bump = loan_offer.bump
    )]
    pub loan_offer: Account<'info, LoanOffer>,

    /// The loan being repaid
    #[account(
        mut,
        seeds = [Loan::SEED_PREFIX, loan_offer.key().as_ref(), borrower.key().as_ref()],
        bump = loan.bump,
        has_one = borrower @ LendingError::InvalidLoanAccount,
        constraint = loan.offer == loan_offer.key() @ LendingError::InvalidLoanAccount
    )]
    pub loan: Account<'info, Loan>,

    /// Borrower's obligation
    #[account(
        mut,
        seeds = [Obligation::SEED_PREFIX, borrower.key().as_ref()],
        bump = obligation.bump,
        has_one = borrower @ LendingError::InvalidLoanAccount
    )]
    pub obligation: Account<'info, Obligation>,

    /// Borrower's reputation, credited on repayment
    #[account(
        mut,
        seeds = [BorrowerProfile::SEED_PREFIX, borrower.key().as_ref()],
        bump = borrower_profile.bump
    )]
    pub borrower_profile: Account<'info, BorrowerProfile>,

    /// Borrower's loan-token account (source of repayment)
    #[account(
        mut,
        constraint = borrower_token_account.mint == loan_offer.token_mint @ LendingError::InvalidTokenMint,
        constraint = borrower_token_account.owner == borrower.key() @ LendingError::InvalidTokenOwner
    )]
    pub borrower_token_account: Account<'info, TokenAccount>,

    /// Lender's loan-token account (destination of repayment)
    #[account(
        mut,
        constraint = lender_token_account.mint == loan_offer.token_mint @ LendingError::InvalidTokenMint,
        constraint = lender_token_account.owner == loan_offer.lender @ LendingError::InvalidTokenOwner
    )]
    pub lender_token_account: Account<'info, TokenAccount>,

    /// Collateral vault (source of returned collateral)
    #[account(
        mut,
        seeds = [COLLATERAL_VAULT_SEED, borrower.key().as_ref(), obligation.collateral_token_mint.as_ref()],
        bump,
        constraint = collateral_vault.key() == obligation.collateral_account @ LendingError::InvalidVault
    )]
    pub collateral_vault: Account<'info, TokenAccount>,

    /// Borrower's collateral token account (destination of returned collateral)
    #[account(
        mut,
        constraint = borrower_collateral_account.mint == obligation.collateral_token_mint @ LendingError::InvalidTokenMint,
        constraint = borrower_collateral_account.owner == borrower.key() @ LendingError::InvalidTokenOwner
    )]
    pub borrower_collateral_account: Account<'info, TokenAccount>,

    /// Token program
    pub token_program: Program<'info, Token>,
}

/// Repay principal plus full-term interest and recover the collateral
///
/// # Arguments
/// * `ctx` - The context containing all accounts
/// * `repayment_amount` - Most the borrower authorizes; exactly the amount
///   due is transferred
pub fn handler(ctx: Context<RepayLoan>, repayment_amount: u64) -> Result<()> {
    let clock = Clock::get()?;
    let borrower = ctx.accounts.borrower.key();
    let loan_key = ctx.accounts.loan.key();

    let loan = &mut ctx.accounts.loan;
    let obligation = &mut ctx.accounts.obligation;
    let repayment = loan.repay(obligation, repayment_amount, clock.unix_timestamp)?;

    // Transfer principal + interest from borrower to lender
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.borrower_token_account.to_account_info(),
            to: ctx.accounts.lender_token_account.to_account_info(),
            authority: ctx.accounts.borrower.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, repayment.amount_due)?;

    // Return collateral using the obligation PDA as signer
    if repayment.collateral_returned > 0 {
        let bump = [obligation.bump];
        let seeds: &[&[u8]] = &[Obligation::SEED_PREFIX, borrower.as_ref(), &bump];
        let signer_seeds = &[seeds];

        let transfer_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.collateral_vault.to_account_info(),
                to: ctx.accounts.borrower_collateral_account.to_account_info(),
                authority: obligation.to_account_info(),
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, repayment.collateral_returned)?;
        msg!("Returned {} collateral to borrower", repayment.collateral_returned);
    }

    let new_score = ctx
        .accounts
        .borrower_profile
        .reward_repayment(clock.unix_timestamp);

    emit!(LoanRepaid {
        loan: loan_key,
        offer: loan.offer,
        borrower,
        lender: loan.lender,
        amount_paid: repayment.amount_due,
        collateral_returned: repayment.collateral_returned,
        new_score,
        timestamp: clock.unix_timestamp,
    });

    msg!(
        "Loan repaid: Borrower {} repaid {} (principal: {}, interest: {})",
        borrower,
        repayment.amount_due,
        loan.principal,
        loan.interest_owed
    );

    Ok(())
}
