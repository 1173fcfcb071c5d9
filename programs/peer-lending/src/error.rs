use anchor_lang::prelude::*;

/// Protocol errors. Codes are assigned in declaration order starting at 6000,
/// so new variants go at the end.
#[error_code]
#[derive(PartialEq, Eq)]
pub enum LendingError {
    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Interest rate must be greater than zero")]
    InvalidInterestRate,

    #[msg("Loan duration must be greater than zero")]
    InvalidDuration,

    #[msg("Minimum score must be valid (0-1000)")]
    InvalidScore,

    #[msg("Loan offer is not active")]
    OfferNotActive,

    #[msg("Borrower score is insufficient")]
    InsufficientScore,

    #[msg("Loan offer has expired")]
    LoanOfferExpired,

    #[msg("Loan already repaid")]
    LoanAlreadyRepaid,

    #[msg("Insufficient repayment amount")]
    InsufficientRepayment,

    #[msg("Loan repayment is overdue")]
    LoanRepaymentOverdue,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Borrower already has an active loan")]
    LoanAlreadyExists,

    #[msg("An offer for this lender and mint already exists")]
    OfferAlreadyExists,

    #[msg("Supplied token does not match the obligation's collateral")]
    InvalidCollateralToken,

    #[msg("No collateral deposited")]
    CollateralNotEnough,

    #[msg("Loan does not belong to this offer and borrower")]
    InvalidLoanAccount,

    #[msg("Token mint mismatch")]
    InvalidTokenMint,

    #[msg("Token account owner mismatch")]
    InvalidTokenOwner,

    #[msg("Invalid vault account")]
    InvalidVault,
}

impl LendingError {
    /// Every variant, in code order
    pub const ALL: [LendingError; 19] = [
        LendingError::InvalidAmount,
        LendingError::InvalidInterestRate,
        LendingError::InvalidDuration,
        LendingError::InvalidScore,
        LendingError::OfferNotActive,
        LendingError::InsufficientScore,
        LendingError::LoanOfferExpired,
        LendingError::LoanAlreadyRepaid,
        LendingError::InsufficientRepayment,
        LendingError::LoanRepaymentOverdue,
        LendingError::MathOverflow,
        LendingError::LoanAlreadyExists,
        LendingError::OfferAlreadyExists,
        LendingError::InvalidCollateralToken,
        LendingError::CollateralNotEnough,
        LendingError::InvalidLoanAccount,
        LendingError::InvalidTokenMint,
        LendingError::InvalidTokenOwner,
        LendingError::InvalidVault,
    ];

    /// Custom program error code as it appears in a failed transaction
    pub fn code(self) -> u32 {
        anchor_lang::error::ERROR_CODE_OFFSET + self as u32
    }

    /// Reverse of [`LendingError::code`]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Recover the protocol error carried by an Anchor error, if any
    pub fn from_anchor(err: &anchor_lang::error::Error) -> Option<Self> {
        match err {
            anchor_lang::error::Error::AnchorError(e) => Self::from_code(e.error_code_number),
            anchor_lang::error::Error::ProgramError(_) => None,
        }
    }
}
