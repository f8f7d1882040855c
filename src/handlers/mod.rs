pub mod admin;
pub mod redemption;

pub use admin::admin_config;
pub use redemption::redemption_config;
