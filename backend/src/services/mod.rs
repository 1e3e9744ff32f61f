pub mod auth_service;
pub mod balance_service;
pub mod ledger_service;
pub mod valuation_service;
