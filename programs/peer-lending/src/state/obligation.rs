use anchor_lang::prelude::*;

use crate::constants::OBLIGATION_SEED;
use crate::error::LendingError;

/// Borrower's collateral escrow, one per borrower identity
/// PDA Seeds: ["obligation", borrower]
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct Obligation {
    /// Owner of this obligation
    pub borrower: Pubkey,

    /// Mint of the posted collateral
    pub collateral_token_mint: Pubkey,

    /// Collateral vault token account (PDA-owned)
    pub collateral_account: Pubkey,

    /// Collateral currently escrowed (native units)
    pub deposited_amount: u64,

    /// Set while this borrower's collateral backs an unrepaid loan.
    /// Guards the one-active-loan-per-borrower rule.
    pub loan_active: bool,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl Obligation {
    pub const SEED_PREFIX: &'static [u8] = OBLIGATION_SEED;

    pub fn is_initialized(&self) -> bool {
        self.borrower != Pubkey::default()
    }

    /// Create the obligation on first deposit, or top it up.
    ///
    /// Top-ups must use the same collateral mint. `loan_active` starts false
    /// and is left untouched by later deposits.
    ///
    /// Returns the new deposited amount.
    pub fn deposit(
        &mut self,
        borrower: Pubkey,
        collateral_token_mint: Pubkey,
        collateral_account: Pubkey,
        amount: u64,
        bump: u8,
    ) -> Result<u64> {
        require!(amount > 0, LendingError::InvalidAmount);

        if self.is_initialized() {
            require_keys_eq!(
                self.collateral_token_mint,
                collateral_token_mint,
                LendingError::InvalidCollateralToken
            );
            require_keys_eq!(
                self.collateral_account,
                collateral_account,
                LendingError::InvalidVault
            );
        } else {
            *self = Obligation {
                borrower,
                collateral_token_mint,
                collateral_account,
                deposited_amount: 0,
                loan_active: false,
                bump,
            };
        }

        self.deposited_amount = self
            .deposited_amount
            .checked_add(amount)
            .ok_or(LendingError::MathOverflow)?;

        Ok(self.deposited_amount)
    }

    /// Detach the repaid loan and hand back all escrowed collateral.
    /// Returns the amount to transfer out of the collateral vault.
    pub fn release_collateral(&mut self) -> u64 {
        let amount = self.deposited_amount;
        self.deposited_amount = 0;
        self.loan_active = false;
        amount
    }
}
