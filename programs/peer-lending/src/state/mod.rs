pub mod borrower_profile;
pub mod loan;
pub mod obligation;
pub mod offer;

pub use borrower_profile::*;
pub use loan::*;
pub use obligation::*;
pub use offer::*;
