pub mod admin;
pub mod common;
pub mod redemption;

pub use admin::*;
pub use common::*;
pub use redemption::*;
