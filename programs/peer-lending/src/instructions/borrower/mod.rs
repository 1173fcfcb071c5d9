pub mod initialize_borrower_profile;
pub mod create_obligation;
pub mod accept_loan;
pub mod repay_loan;

pub use initialize_borrower_profile::*;
pub use create_obligation::*;
pub use accept_loan::*;
pub use repay_loan::*;
