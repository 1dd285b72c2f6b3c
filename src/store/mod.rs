pub mod drivers;
pub mod ledger;
pub mod orders;
