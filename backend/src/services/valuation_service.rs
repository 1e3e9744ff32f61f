use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    normalize_symbol, validate_holding_inputs, Investment, InvestmentPatch, NewInvestment,
    PortfolioSummary, PriceUpdate,
};
use crate::store::JsonFileStore;
use crate::utils::{check_range, is_positive, round_currency};

/// Derived fields of a holding, rounded to currency precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub total_value: BigDecimal,
    pub profit_loss: BigDecimal,
    pub profit_loss_percentage: BigDecimal,
}

impl Valuation {
    pub fn compute(quantity: &BigDecimal, purchase_price: &BigDecimal, current_price: &BigDecimal) -> Self {
        let total_value = round_currency(&(quantity * current_price));
        let cost_basis = quantity * purchase_price;
        let profit_loss = round_currency(&(&total_value - &cost_basis));
        let profit_loss_percentage = percentage(&profit_loss, &cost_basis);
        Self {
            total_value,
            profit_loss,
            profit_loss_percentage,
        }
    }

    pub fn apply_to(self, investment: &mut Investment) {
        investment.total_value = self.total_value;
        investment.profit_loss = self.profit_loss;
        investment.profit_loss_percentage = self.profit_loss_percentage;
    }
}

/// `part / whole * 100` at currency precision; zero when `whole` is zero.
fn percentage(part: &BigDecimal, whole: &BigDecimal) -> BigDecimal {
    if whole.is_zero() {
        return round_currency(&BigDecimal::zero());
    }
    round_currency(&(part / whole * BigDecimal::from(100)))
}

/// Recomputes all three derived fields from the holding's current inputs.
pub fn revalue(investment: &mut Investment) {
    Valuation::compute(&investment.quantity, &investment.purchase_price, &investment.current_price)
        .apply_to(investment);
}

pub fn summarize(investments: &[Investment]) -> PortfolioSummary {
    let total_value: BigDecimal = investments
        .iter()
        .fold(BigDecimal::zero(), |acc, i| acc + &i.total_value);
    let total_cost: BigDecimal = investments
        .iter()
        .fold(BigDecimal::zero(), |acc, i| acc + &i.quantity * &i.purchase_price);
    let total_profit_loss = &total_value - &total_cost;

    PortfolioSummary {
        total_profit_loss_percentage: percentage(&total_profit_loss, &total_cost),
        total_value: round_currency(&total_value),
        total_cost: round_currency(&total_cost),
        total_profit_loss: round_currency(&total_profit_loss),
        investment_count: investments.len(),
    }
}

#[derive(Clone)]
pub struct InvestmentService {
    store: Arc<JsonFileStore>,
}

impl InvestmentService {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }

    /// Opens a holding at its purchase price, so it starts with zero profit.
    pub fn create(&self, user_id: Uuid, input: NewInvestment) -> Result<Investment, AppError> {
        validate_holding_inputs(Some(&input.quantity), Some(&input.purchase_price))?;
        let now = Utc::now();
        let mut investment = Investment {
            id: Uuid::new_v4(),
            user_id,
            name: input.name,
            investment_type: input.investment_type,
            symbol: normalize_symbol(&input.symbol),
            current_price: input.purchase_price.clone(),
            quantity: input.quantity,
            purchase_price: input.purchase_price,
            total_value: BigDecimal::zero(),
            profit_loss: BigDecimal::zero(),
            profit_loss_percentage: BigDecimal::zero(),
            purchase_date: input.purchase_date,
            created_at: now,
            updated_at: now,
        };
        revalue(&mut investment);

        let investment = self.store.write(|db| {
            if db.get_user(user_id).is_none() {
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
            Ok(db.insert_investment(investment))
        })?;
        info!(
            "Created investment {} ({} x {}) for user {}",
            investment.symbol, investment.quantity, investment.purchase_price, user_id
        );
        Ok(investment)
    }

    /// Patches a holding; quantity or purchase price changes re-derive the
    /// valuation against the existing current price.
    pub fn update(&self, id: Uuid, mut patch: InvestmentPatch) -> Result<Investment, AppError> {
        validate_holding_inputs(patch.quantity.as_ref(), patch.purchase_price.as_ref())?;
        patch.symbol = patch.symbol.as_deref().map(normalize_symbol);
        self.store.write(|db| {
            db.patch_investment(id, |investment| {
                patch.apply_to(investment);
                if patch.touches_valuation() {
                    revalue(investment);
                }
            })
            .ok_or_else(|| AppError::NotFound("Investment not found".to_string()))
        })
    }

    pub fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if self.store.read(|db| db.get_investment(id).is_none()) {
            return Ok(false);
        }
        self.store.write(|db| Ok(db.remove_investment(id)))
    }

    pub fn get(&self, id: Uuid) -> Result<Investment, AppError> {
        self.store
            .read(|db| db.get_investment(id).cloned())
            .ok_or_else(|| AppError::NotFound("Investment not found".to_string()))
    }

    pub fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Investment>, AppError> {
        Ok(self.store.read(|db| db.list_investments_by_user(user_id)))
    }

    /// Sets the market price of every holding whose symbol appears in
    /// `updates`, regardless of owner, and re-derives its valuation.
    ///
    /// Returns each touched holding once, in the order it was first updated,
    /// with its final state. Unknown symbols are skipped.
    pub fn refresh_prices(&self, updates: &[PriceUpdate]) -> Result<Vec<Investment>, AppError> {
        self.apply_prices(updates, None)
    }

    /// Same as [`refresh_prices`](Self::refresh_prices), restricted to the
    /// holdings of `user_id`. Other owners' holdings of the same symbols keep
    /// their price.
    pub fn refresh_owned_prices(
        &self,
        user_id: Uuid,
        updates: &[PriceUpdate],
    ) -> Result<Vec<Investment>, AppError> {
        self.apply_prices(updates, Some(user_id))
    }

    fn apply_prices(&self, updates: &[PriceUpdate], owner: Option<Uuid>) -> Result<Vec<Investment>, AppError> {
        for update in updates {
            check_range(&update.new_price, "Price")?;
        }
        if updates.iter().any(|u| !is_positive(&u.new_price)) {
            return Err(AppError::Validation("Prices must be greater than 0".into()));
        }
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        self.store.write(|db| {
            let mut touched: Vec<Uuid> = Vec::new();
            for update in updates {
                let symbol = normalize_symbol(&update.symbol);
                let price = round_currency(&update.new_price);
                let ids: Vec<Uuid> = db
                    .find_investments_by_symbol(&symbol)
                    .iter()
                    .filter(|i| owner.map_or(true, |owner| i.user_id == owner))
                    .map(|i| i.id)
                    .collect();
                if ids.is_empty() {
                    debug!("No holdings for symbol {}, skipping price update", symbol);
                    continue;
                }
                for id in ids {
                    db.patch_investment(id, |investment| {
                        investment.current_price = price.clone();
                        revalue(investment);
                    });
                    if !touched.contains(&id) {
                        touched.push(id);
                    }
                }
            }

            info!("Refreshed prices for {} holdings", touched.len());
            Ok(touched
                .iter()
                .filter_map(|id| db.get_investment(*id).cloned())
                .collect())
        })
    }

    pub fn summary(&self, user_id: Uuid) -> Result<PortfolioSummary, AppError> {
        let holdings = self.list_by_user(user_id)?;
        Ok(summarize(&holdings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvestmentType, User};
    use crate::store::Database;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn setup() -> (InvestmentService, Uuid) {
        let mut db = Database::default();
        let user = db.insert_user(User::new("Ana".into(), "ana@example.com", dec("0")));
        let store = Arc::new(JsonFileStore::in_memory(db));
        (InvestmentService::new(store), user.id)
    }

    fn holding(symbol: &str, quantity: &str, price: &str) -> NewInvestment {
        NewInvestment {
            name: format!("{} holding", symbol),
            investment_type: InvestmentType::Stocks,
            symbol: symbol.to_string(),
            quantity: dec(quantity),
            purchase_price: dec(price),
            purchase_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        }
    }

    fn assert_consistent(i: &Investment) {
        let expected = Valuation::compute(&i.quantity, &i.purchase_price, &i.current_price);
        assert_eq!(i.total_value, expected.total_value);
        assert_eq!(i.profit_loss, expected.profit_loss);
        assert_eq!(i.profit_loss_percentage, expected.profit_loss_percentage);
    }

    #[test]
    fn test_compute_valuation() {
        let v = Valuation::compute(&dec("200"), &dec("30.00"), &dec("28.50"));
        assert_eq!(v.total_value, dec("5700.00"));
        assert_eq!(v.profit_loss, dec("-300.00"));
        assert_eq!(v.profit_loss_percentage, dec("-5.00"));

        let v = Valuation::compute(&dec("3"), &dec("10"), &dec("10.01"));
        assert_eq!(v.total_value, dec("30.03"));
        assert_eq!(v.profit_loss, dec("0.03"));
        assert_eq!(v.profit_loss_percentage, dec("0.10"));
    }

    #[test]
    fn test_zero_cost_basis_yields_zero_percentage() {
        let v = Valuation::compute(&dec("0"), &dec("10"), &dec("12"));
        assert_eq!(v.profit_loss_percentage, dec("0"));
    }

    #[test]
    fn test_create_then_refresh_scenario() {
        let (service, user_id) = setup();
        let created = service.create(user_id, holding("abc", "10", "20.00")).unwrap();

        assert_eq!(created.symbol, "ABC");
        assert_eq!(created.current_price, dec("20.00"));
        assert_eq!(created.total_value, dec("200.00"));
        assert_eq!(created.profit_loss, dec("0.00"));
        assert_eq!(created.profit_loss_percentage, dec("0.00"));

        let updated = service
            .refresh_prices(&[PriceUpdate { symbol: "ABC".into(), new_price: dec("25.00") }])
            .unwrap();
        assert_eq!(updated.len(), 1);
        let refreshed = &updated[0];
        assert_eq!(refreshed.current_price, dec("25.00"));
        assert_eq!(refreshed.total_value, dec("250.00"));
        assert_eq!(refreshed.profit_loss, dec("50.00"));
        assert_eq!(refreshed.profit_loss_percentage, dec("25.00"));
        assert_consistent(refreshed);
    }

    #[test]
    fn test_refresh_only_touches_matching_symbols() {
        let (service, user_id) = setup();
        let a = service.create(user_id, holding("AAA", "1", "10")).unwrap();
        let b = service.create(user_id, holding("BBB", "2", "10")).unwrap();
        let a2 = service.create(user_id, holding("AAA", "3", "8")).unwrap();

        let updated = service
            .refresh_prices(&[
                PriceUpdate { symbol: "aaa".into(), new_price: dec("12") },
                PriceUpdate { symbol: "ZZZ".into(), new_price: dec("99") },
            ])
            .unwrap();

        let ids: Vec<Uuid> = updated.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.id, a2.id]);
        assert_eq!(service.get(b.id).unwrap(), b);
        for i in &updated {
            assert_eq!(i.current_price, dec("12.00"));
            assert_consistent(i);
        }
    }

    #[test]
    fn test_refresh_reports_each_holding_once_with_final_price() {
        let (service, user_id) = setup();
        let a = service.create(user_id, holding("AAA", "1", "10")).unwrap();

        let updated = service
            .refresh_prices(&[
                PriceUpdate { symbol: "AAA".into(), new_price: dec("11") },
                PriceUpdate { symbol: "AAA".into(), new_price: dec("9") },
            ])
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, a.id);
        assert_eq!(updated[0].current_price, dec("9.00"));
    }

    #[test]
    fn test_refresh_rejects_non_positive_price() {
        let (service, _) = setup();
        let result = service.refresh_prices(&[PriceUpdate { symbol: "AAA".into(), new_price: dec("0") }]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_owned_refresh_leaves_other_owners_alone() {
        let mut db = Database::default();
        let ana = db.insert_user(User::new("Ana".into(), "ana@example.com", dec("0")));
        let bruno = db.insert_user(User::new("Bruno".into(), "bruno@example.com", dec("0")));
        let service = InvestmentService::new(Arc::new(JsonFileStore::in_memory(db)));
        let mine = service.create(ana.id, holding("VALE3", "10", "50")).unwrap();
        let theirs = service.create(bruno.id, holding("VALE3", "10", "50")).unwrap();

        let updated = service
            .refresh_owned_prices(ana.id, &[PriceUpdate { symbol: "VALE3".into(), new_price: dec("0.01") }])
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, mine.id);
        assert_eq!(updated[0].current_price, dec("0.01"));
        assert_eq!(service.get(theirs.id).unwrap(), theirs);
    }

    #[test]
    fn test_rejects_out_of_range_inputs() {
        let (service, user_id) = setup();
        let huge = holding("AAA", "1e9223372036854775807", "10");
        assert!(matches!(service.create(user_id, huge), Err(AppError::Validation(_))));

        let created = service.create(user_id, holding("AAA", "1", "10")).unwrap();
        let patch = InvestmentPatch { purchase_price: Some(dec("1e40")), ..Default::default() };
        assert!(matches!(service.update(created.id, patch), Err(AppError::Validation(_))));

        let result = service.refresh_prices(&[PriceUpdate {
            symbol: "AAA".into(),
            new_price: dec("1e-9223372036854775807"),
        }]);
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "Price is out of range"));
        assert_eq!(service.get(created.id).unwrap(), created);
    }

    #[test]
    fn test_update_recomputes_only_for_valuation_inputs() {
        let (service, user_id) = setup();
        let created = service.create(user_id, holding("XYZ", "10", "20")).unwrap();
        service
            .refresh_prices(&[PriceUpdate { symbol: "XYZ".into(), new_price: dec("30") }])
            .unwrap();

        let renamed = service
            .update(
                created.id,
                InvestmentPatch { name: Some("Renamed".into()), ..Default::default() },
            )
            .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.total_value, dec("300.00"));

        let resized = service
            .update(
                created.id,
                InvestmentPatch {
                    quantity: Some(dec("4")),
                    purchase_price: Some(dec("25")),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(resized.current_price, dec("30.00"));
        assert_eq!(resized.total_value, dec("120.00"));
        assert_eq!(resized.profit_loss, dec("20.00"));
        assert_eq!(resized.profit_loss_percentage, dec("20.00"));
    }

    #[test]
    fn test_update_and_delete_missing() {
        let (service, _) = setup();
        let result = service.update(Uuid::new_v4(), InvestmentPatch::default());
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(!service.delete(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_summary() {
        let (service, user_id) = setup();
        service.create(user_id, holding("AAA", "10", "20")).unwrap();
        service.create(user_id, holding("BBB", "5", "10")).unwrap();
        service
            .refresh_prices(&[PriceUpdate { symbol: "AAA".into(), new_price: dec("25") }])
            .unwrap();

        let summary = service.summary(user_id).unwrap();
        assert_eq!(summary.investment_count, 2);
        assert_eq!(summary.total_value, dec("300.00"));
        assert_eq!(summary.total_cost, dec("250.00"));
        assert_eq!(summary.total_profit_loss, dec("50.00"));
        assert_eq!(summary.total_profit_loss_percentage, dec("20.00"));
    }
}
