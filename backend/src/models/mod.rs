mod api;
mod investment;
mod transaction;
mod user;

pub use api::ApiResponse;
pub use investment::{
    normalize_symbol, validate_holding_inputs, CreateInvestmentRequest, Investment, InvestmentPatch,
    InvestmentType,
    NewInvestment, PortfolioSummary, PriceUpdate, RefreshPricesRequest, UpdateInvestmentRequest,
};
pub use transaction::{
    validate_amount, CreateTransactionRequest, NewTransaction, Transaction, TransactionPatch,
    TransactionType, UpdateTransactionRequest,
};
pub use user::{normalize_email, AuthResponse, LoginRequest, RegisterRequest, User, UserPatch};
