use std::sync::Arc;

use crate::external::price_provider::PriceProvider;
use crate::services::auth_service::AuthService;
use crate::services::ledger_service::LedgerService;
use crate::services::valuation_service::InvestmentService;

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub investments: InvestmentService,
    pub auth: AuthService,
    pub price_provider: Arc<dyn PriceProvider>,
}
