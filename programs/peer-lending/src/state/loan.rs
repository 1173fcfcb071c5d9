use anchor_lang::prelude::*;

use crate::constants::LOAN_SEED;
use crate::error::LendingError;
use crate::state::{LoanOffer, Obligation};

/// An accepted offer, one per (offer, borrower) pair
/// PDA Seeds: ["loan", loan_offer, borrower]
#[account]
#[derive(InitSpace, Default, Debug, PartialEq, Eq)]
pub struct Loan {
    /// Offer this loan was accepted from
    pub offer: Pubkey,

    /// Lender of the offer, receives the repayment
    pub lender: Pubkey,

    /// Borrower who accepted the offer
    pub borrower: Pubkey,

    /// Principal, copied from the offer at acceptance
    pub principal: u64,

    /// Interest for the full term, fixed at acceptance
    pub interest_owed: u64,

    /// Unix timestamp of acceptance
    pub start_time: i64,

    /// Repayment deadline (start_time + offer duration)
    pub repay_by_time: i64,

    /// Set once by repay_loan, never cleared
    pub is_repaid: bool,

    /// Bump seed for PDA derivation
    pub bump: u8,
}

/// Lifecycle of a loan at a given instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoanStatus {
    Open,
    Repaid,
    /// Past the deadline and unpaid. Repayment is rejected from here on;
    /// the protocol does not seize collateral.
    Overdue,
}

/// What repay_loan has to move once the state change is accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repayment {
    /// Transferred borrower -> lender
    pub amount_due: u64,
    /// Transferred collateral vault -> borrower
    pub collateral_returned: u64,
}

impl Loan {
    pub const SEED_PREFIX: &'static [u8] = LOAN_SEED;

    pub fn is_initialized(&self) -> bool {
        self.offer != Pubkey::default()
    }

    /// Accept `offer` for `borrower`.
    ///
    /// Every precondition is checked before any field is written, so a
    /// failure leaves offer, obligation and loan untouched. On success the
    /// offer is closed, the obligation is marked active and the loan opened.
    ///
    /// Returns the principal to move out of the offer vault.
    #[allow(clippy::too_many_arguments)]
    pub fn accept(
        &mut self,
        offer_key: Pubkey,
        offer: &mut LoanOffer,
        obligation: &mut Obligation,
        borrower: Pubkey,
        borrower_score: u64,
        now: i64,
        bump: u8,
    ) -> Result<u64> {
        require!(!self.is_initialized(), LendingError::LoanAlreadyExists);
        require!(offer.is_active, LendingError::OfferNotActive);
        require_keys_eq!(obligation.borrower, borrower, LendingError::InvalidLoanAccount);
        require!(!obligation.loan_active, LendingError::LoanAlreadyExists);
        require!(obligation.deposited_amount > 0, LendingError::CollateralNotEnough);
        require!(borrower_score >= offer.min_score, LendingError::InsufficientScore);
        require!(!offer.is_expired(now)?, LendingError::LoanOfferExpired);

        let interest_owed = offer.interest_on(offer.amount)?;
        // The full amount due must be representable before the loan exists
        offer
            .amount
            .checked_add(interest_owed)
            .ok_or(LendingError::MathOverflow)?;
        let duration =
            i64::try_from(offer.duration_seconds).map_err(|_| LendingError::MathOverflow)?;
        let repay_by_time = now.checked_add(duration).ok_or(LendingError::MathOverflow)?;

        offer.is_active = false;
        obligation.loan_active = true;
        *self = Loan {
            offer: offer_key,
            lender: offer.lender,
            borrower,
            principal: offer.amount,
            interest_owed,
            start_time: now,
            repay_by_time,
            is_repaid: false,
            bump,
        };

        Ok(self.principal)
    }

    /// Principal plus interest for the full term
    pub fn amount_due(&self) -> Result<u64> {
        Ok(self
            .principal
            .checked_add(self.interest_owed)
            .ok_or(LendingError::MathOverflow)?)
    }

    pub fn status(&self, now: i64) -> LoanStatus {
        if self.is_repaid {
            LoanStatus::Repaid
        } else if now > self.repay_by_time {
            LoanStatus::Overdue
        } else {
            LoanStatus::Open
        }
    }

    /// Settle the loan with up to `repayment_amount` from the borrower.
    /// Exactly `amount_due` is charged; all collateral is released.
    pub fn repay(
        &mut self,
        obligation: &mut Obligation,
        repayment_amount: u64,
        now: i64,
    ) -> Result<Repayment> {
        require!(!self.is_repaid, LendingError::LoanAlreadyRepaid);
        require_keys_eq!(obligation.borrower, self.borrower, LendingError::InvalidLoanAccount);
        require!(now <= self.repay_by_time, LendingError::LoanRepaymentOverdue);
        let amount_due = self.amount_due()?;
        require!(repayment_amount >= amount_due, LendingError::InsufficientRepayment);

        self.is_repaid = true;
        let collateral_returned = obligation.release_collateral();

        Ok(Repayment {
            amount_due,
            collateral_returned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OfferTerms;

    const DAY: i64 = 86_400;
    const T0: i64 = 1_700_000_000;

    struct Fixture {
        offer_key: Pubkey,
        offer: LoanOffer,
        obligation: Obligation,
        borrower: Pubkey,
        loan: Loan,
    }

    fn fixture() -> Fixture {
        let mut offer = LoanOffer::default();
        offer
            .open(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                &OfferTerms {
                    amount: 1_000_000,
                    interest_rate_bps: 500,
                    duration_seconds: 30 * DAY as u64,
                    min_score: 500,
                },
                T0,
                255,
            )
            .unwrap();

        let borrower = Pubkey::new_unique();
        let mut obligation = Obligation::default();
        obligation
            .deposit(borrower, Pubkey::new_unique(), Pubkey::new_unique(), 500_000, 255)
            .unwrap();

        Fixture {
            offer_key: Pubkey::new_unique(),
            offer,
            obligation,
            borrower,
            loan: Loan::default(),
        }
    }

    impl Fixture {
        fn accept(&mut self, score: u64, now: i64) -> Result<u64> {
            self.loan.accept(
                self.offer_key,
                &mut self.offer,
                &mut self.obligation,
                self.borrower,
                score,
                now,
                254,
            )
        }
    }

    #[test]
    fn accept_opens_loan_and_closes_offer() {
        let mut f = fixture();
        let principal = f.accept(600, T0 + DAY).unwrap();

        assert_eq!(principal, 1_000_000);
        assert!(!f.offer.is_active);
        assert!(f.obligation.loan_active);
        assert_eq!(f.loan.offer, f.offer_key);
        assert_eq!(f.loan.lender, f.offer.lender);
        assert_eq!(f.loan.borrower, f.borrower);
        assert_eq!(f.loan.principal, 1_000_000);
        assert_eq!(f.loan.interest_owed, 50_000);
        assert_eq!(f.loan.start_time, T0 + DAY);
        assert_eq!(f.loan.repay_by_time, T0 + DAY + 30 * DAY);
        assert!(!f.loan.is_repaid);
        assert_eq!(f.loan.status(T0 + DAY), LoanStatus::Open);
    }

    #[test]
    fn longest_openable_offer_accepts_on_its_last_second() {
        let mut f = fixture();
        let duration = ((i64::MAX - T0) / 2) as u64;
        let mut offer = LoanOffer::default();
        offer
            .open(
                f.offer.lender,
                f.offer.token_mint,
                f.offer.vault,
                &OfferTerms {
                    amount: 1_000_000,
                    interest_rate_bps: 500,
                    duration_seconds: duration,
                    min_score: 500,
                },
                T0,
                255,
            )
            .unwrap();
        f.offer = offer;

        let last_second = f.offer.expires_at().unwrap();
        assert_eq!(f.accept(600, last_second).unwrap(), 1_000_000);
        assert_eq!(f.loan.repay_by_time, last_second + duration as i64);
    }

    #[test]
    fn inactive_offer_always_rejected() {
        let mut f = fixture();
        f.offer.is_active = false;
        // Even with a bad score and an active obligation the offer check wins
        f.obligation.loan_active = true;
        assert_eq!(f.accept(0, T0).unwrap_err(), LendingError::OfferNotActive.into());
    }

    #[test]
    fn active_obligation_rejected_and_nothing_changes() {
        let mut f = fixture();
        f.obligation.loan_active = true;
        let before = (f.offer.clone(), f.obligation.clone());

        assert_eq!(f.accept(600, T0).unwrap_err(), LendingError::LoanAlreadyExists.into());
        assert_eq!((f.offer.clone(), f.obligation.clone()), before);
        assert!(!f.loan.is_initialized());
    }

    #[test]
    fn existing_loan_for_pair_rejected() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        assert_eq!(f.accept(600, T0).unwrap_err(), LendingError::LoanAlreadyExists.into());
    }

    #[test]
    fn empty_collateral_rejected() {
        let mut f = fixture();
        f.obligation.deposited_amount = 0;
        assert_eq!(f.accept(600, T0).unwrap_err(), LendingError::CollateralNotEnough.into());
    }

    #[test]
    fn score_below_minimum_rejected() {
        let mut f = fixture();
        assert_eq!(f.accept(499, T0).unwrap_err(), LendingError::InsufficientScore.into());
        assert!(f.accept(500, T0).is_ok());
    }

    #[test]
    fn stale_offer_rejected() {
        let mut f = fixture();
        let err = f.accept(600, T0 + 30 * DAY + 1).unwrap_err();
        assert_eq!(err, LendingError::LoanOfferExpired.into());
        assert!(f.offer.is_active);
    }

    #[test]
    fn wrong_borrower_obligation_rejected() {
        let mut f = fixture();
        f.borrower = Pubkey::new_unique();
        assert_eq!(f.accept(600, T0).unwrap_err(), LendingError::InvalidLoanAccount.into());
    }

    #[test]
    fn repay_settles_loan_and_releases_collateral() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();

        let repayment = f.loan.repay(&mut f.obligation, 1_050_000, T0 + DAY).unwrap();

        assert_eq!(
            repayment,
            Repayment {
                amount_due: 1_050_000,
                collateral_returned: 500_000,
            }
        );
        assert!(f.loan.is_repaid);
        assert!(!f.obligation.loan_active);
        assert_eq!(f.obligation.deposited_amount, 0);
        assert_eq!(f.loan.status(T0 + 365 * DAY), LoanStatus::Repaid);
    }

    #[test]
    fn overpayment_charges_only_amount_due() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        let repayment = f.loan.repay(&mut f.obligation, 2_000_000, T0).unwrap();
        assert_eq!(repayment.amount_due, 1_050_000);
    }

    #[test]
    fn underpayment_rejected() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        let err = f.loan.repay(&mut f.obligation, 1_049_999, T0).unwrap_err();
        assert_eq!(err, LendingError::InsufficientRepayment.into());
        assert!(!f.loan.is_repaid);
        assert!(f.obligation.loan_active);
    }

    #[test]
    fn repay_after_deadline_rejected_even_with_funds() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        let late = f.loan.repay_by_time + 1;
        assert_eq!(f.loan.status(late), LoanStatus::Overdue);

        let err = f.loan.repay(&mut f.obligation, u64::MAX, late).unwrap_err();
        assert_eq!(err, LendingError::LoanRepaymentOverdue.into());
        assert_eq!(f.obligation.deposited_amount, 500_000);
    }

    #[test]
    fn repay_on_deadline_accepted() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        let deadline = f.loan.repay_by_time;
        assert!(f.loan.repay(&mut f.obligation, 1_050_000, deadline).is_ok());
    }

    #[test]
    fn second_repay_rejected() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        f.loan.repay(&mut f.obligation, 1_050_000, T0).unwrap();
        let err = f.loan.repay(&mut f.obligation, 1_050_000, T0).unwrap_err();
        assert_eq!(err, LendingError::LoanAlreadyRepaid.into());
    }

    #[test]
    fn amount_due_overflow_fails_closed() {
        let loan = Loan {
            principal: u64::MAX,
            interest_owed: 1,
            ..Loan::default()
        };
        assert_eq!(loan.amount_due().unwrap_err(), LendingError::MathOverflow.into());

        // Overflow is reported ahead of any shortfall
        let mut obligation = Obligation {
            borrower: loan.borrower,
            ..Obligation::default()
        };
        let mut loan = Loan {
            repay_by_time: T0,
            ..loan
        };
        assert_eq!(
            loan.repay(&mut obligation, 0, T0).unwrap_err(),
            LendingError::MathOverflow.into()
        );
        assert!(!loan.is_repaid);
    }

    #[test]
    fn unrepresentable_amount_due_blocks_acceptance() {
        let mut f = fixture();
        f.offer.amount = u64::MAX;
        assert_eq!(f.accept(600, T0).unwrap_err(), LendingError::MathOverflow.into());
        assert!(f.offer.is_active);
    }

    #[test]
    fn obligation_reusable_after_repayment() {
        let mut f = fixture();
        f.accept(600, T0).unwrap();
        f.loan.repay(&mut f.obligation, 1_050_000, T0).unwrap();

        let mut next_offer = f.offer.clone();
        next_offer.is_active = true;
        let mut next_loan = Loan::default();
        f.obligation
            .deposit(
                f.borrower,
                f.obligation.collateral_token_mint,
                f.obligation.collateral_account,
                10,
                255,
            )
            .unwrap();
        next_loan
            .accept(Pubkey::new_unique(), &mut next_offer, &mut f.obligation, f.borrower, 600, T0, 255)
            .unwrap();
        assert!(f.obligation.loan_active);
    }
}
