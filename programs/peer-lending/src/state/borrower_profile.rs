use anchor_lang::prelude::*;

use crate::constants::{BORROWER_PROFILE_SEED, MAX_SCORE, REPAY_SCORE_REWARD};

/// Borrower reputation read by accept_loan
/// PDA Seeds: ["borrower_profile", borrower]
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct BorrowerProfile {
    /// Borrower this profile scores
    pub borrower: Pubkey,

    /// Reputation score (0-1000)
    pub score: u64,

    /// Unix timestamp of the last score change
    pub last_updated: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl BorrowerProfile {
    pub const SEED_PREFIX: &'static [u8] = BORROWER_PROFILE_SEED;

    pub fn init(&mut self, borrower: Pubkey, now: i64, bump: u8) {
        *self = BorrowerProfile {
            borrower,
            score: 0,
            last_updated: now,
            bump,
        };
    }

    /// Credit an on-time repayment, capped at MAX_SCORE
    pub fn reward_repayment(&mut self, now: i64) -> u64 {
        self.score = self
            .score
            .saturating_add(REPAY_SCORE_REWARD)
            .min(MAX_SCORE);
        self.last_updated = now;
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_starts_at_zero() {
        let borrower = Pubkey::new_unique();
        let mut profile = BorrowerProfile::default();
        profile.init(borrower, 42, 250);
        assert_eq!(profile.borrower, borrower);
        assert_eq!(profile.score, 0);
        assert_eq!(profile.last_updated, 42);
    }

    #[test]
    fn repayment_reward_is_capped() {
        let mut profile = BorrowerProfile {
            score: 980,
            ..BorrowerProfile::default()
        };
        assert_eq!(profile.reward_repayment(7), 1_000);
        assert_eq!(profile.reward_repayment(8), 1_000);
        assert_eq!(profile.last_updated, 8);
    }
}
