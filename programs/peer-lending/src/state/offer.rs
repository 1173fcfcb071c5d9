use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, LOAN_OFFER_SEED, MAX_SCORE};
use crate::error::LendingError;

/// A lender's standing offer to lend a fixed amount at fixed terms
/// PDA Seeds: ["loan_offer", lender, token_mint]
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct LoanOffer {
    /// Lender who funded the offer
    pub lender: Pubkey,

    /// Mint of the asset being lent
    pub token_mint: Pubkey,

    /// Principal escrowed in the vault (native units)
    /// One offer funds exactly one loan, so this is never decremented
    pub amount: u64,

    /// Flat interest over the whole term, in BPS
    pub interest_rate_bps: u16,

    /// Loan term in seconds
    pub duration_seconds: u64,

    /// Minimum borrower score required to accept
    pub min_score: u64,

    /// Vault holding the escrowed principal
    pub vault: Pubkey,

    /// True from creation until a loan is accepted against it
    pub is_active: bool,

    /// Unix timestamp of creation
    pub created_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

/// Terms a lender submits with CreateOffer
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfferTerms {
    pub amount: u64,
    pub interest_rate_bps: u16,
    pub duration_seconds: u64,
    pub min_score: u64,
}

impl OfferTerms {
    pub fn validate(&self) -> Result<()> {
        require!(self.amount > 0, LendingError::InvalidAmount);
        require!(self.interest_rate_bps > 0, LendingError::InvalidInterestRate);
        require!(self.duration_seconds > 0, LendingError::InvalidDuration);
        require!(self.min_score <= MAX_SCORE, LendingError::InvalidScore);
        Ok(())
    }
}

impl LoanOffer {
    pub const SEED_PREFIX: &'static [u8] = LOAN_OFFER_SEED;

    /// A zeroed account has never been opened
    pub fn is_initialized(&self) -> bool {
        self.lender != Pubkey::default()
    }

    /// Open the offer. Fails if this (lender, mint) offer was ever opened
    /// before, so an accepted offer can never be reactivated.
    pub fn open(
        &mut self,
        lender: Pubkey,
        token_mint: Pubkey,
        vault: Pubkey,
        terms: &OfferTerms,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        require!(!self.is_initialized(), LendingError::OfferAlreadyExists);
        terms.validate()?;
        // An acceptance at the last valid second must still have a
        // representable repayment deadline, or the escrow could never leave
        let duration =
            i64::try_from(terms.duration_seconds).map_err(|_| LendingError::InvalidDuration)?;
        now.checked_add(duration)
            .and_then(|expiry| expiry.checked_add(duration))
            .ok_or(LendingError::InvalidDuration)?;

        *self = LoanOffer {
            lender,
            token_mint,
            amount: terms.amount,
            interest_rate_bps: terms.interest_rate_bps,
            duration_seconds: terms.duration_seconds,
            min_score: terms.min_score,
            vault,
            is_active: true,
            created_at: now,
            bump,
        };

        Ok(())
    }

    /// Last second at which the offer can still be accepted
    pub fn expires_at(&self) -> Result<i64> {
        let duration =
            i64::try_from(self.duration_seconds).map_err(|_| LendingError::MathOverflow)?;
        Ok(self
            .created_at
            .checked_add(duration)
            .ok_or(LendingError::MathOverflow)?)
    }

    pub fn is_expired(&self, now: i64) -> Result<bool> {
        Ok(now > self.expires_at()?)
    }

    /// Simple interest over the full term:
    /// floor(principal * interest_rate_bps / 10000)
    pub fn interest_on(&self, principal: u64) -> Result<u64> {
        let interest = (principal as u128)
            .checked_mul(self.interest_rate_bps as u128)
            .ok_or(LendingError::MathOverflow)?
            / BPS_DENOMINATOR as u128;

        Ok(u64::try_from(interest).map_err(|_| LendingError::MathOverflow)?)
    }
}
