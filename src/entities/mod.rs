pub mod codes;
pub mod winners;

pub use codes as code_entity;
pub use codes::{ClaimResult, ClaimState};
pub use winners as winner_entity;
