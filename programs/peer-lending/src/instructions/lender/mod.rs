pub mod create_offer;

pub use create_offer::*;
