pub mod auth;
pub mod driver;
pub mod ledger;
pub mod order;
