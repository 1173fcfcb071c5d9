/// Peer Lending Protocol Constants

// ============================================================================
// SCALING CONSTANTS
// ============================================================================

/// Basis points denominator (100% = 10000 BPS)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Seconds per day, used when converting offer terms entered in days
pub const SECONDS_PER_DAY: u64 = 86_400;

// ============================================================================
// PDA SEEDS
// ============================================================================

/// Seed prefix for LoanOffer PDA: ["loan_offer", lender, token_mint]
pub const LOAN_OFFER_SEED: &[u8] = b"loan_offer";

/// Seed prefix for the offer's principal vault: ["vault", loan_offer]
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed prefix for Obligation PDA: ["obligation", borrower]
pub const OBLIGATION_SEED: &[u8] = b"obligation";

/// Seed prefix for the borrower's collateral vault:
/// ["collateral_vault", borrower, collateral_mint]
pub const COLLATERAL_VAULT_SEED: &[u8] = b"collateral_vault";

/// Seed prefix for Loan PDA: ["loan", loan_offer, borrower]
pub const LOAN_SEED: &[u8] = b"loan";

/// Seed prefix for BorrowerProfile PDA: ["borrower_profile", borrower]
pub const BORROWER_PROFILE_SEED: &[u8] = b"borrower_profile";

// ============================================================================
// SCORE LIMITS
// ============================================================================

/// Highest reputation score an offer may require and a profile may hold
pub const MAX_SCORE: u64 = 1_000;

/// Score added to a borrower's profile for each loan repaid on time
pub const REPAY_SCORE_REWARD: u64 = 50;
