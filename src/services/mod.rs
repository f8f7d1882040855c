pub mod claim_service;
pub mod provisioning_service;
pub mod reconciliation_service;
pub mod winner_service;

pub use claim_service::*;
pub use provisioning_service::*;
pub use reconciliation_service::*;
pub use winner_service::*;
