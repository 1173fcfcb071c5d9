pub mod initialize;
pub mod lender;
pub mod borrower;

pub use initialize::*;
pub use lender::*;
pub use borrower::*;
