use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, TimeZone, Utc};

use crate::errors::AppError;
use crate::models::{Investment, InvestmentType, NewTransaction, Transaction, TransactionType, User};
use crate::services::auth_service::hash_password;
use crate::services::valuation_service::revalue;
use crate::store::Database;

pub const DEMO_EMAIL: &str = "joana@example.com";

/// Demo document for a fresh data file: one customer, a short ledger history
/// and two holdings. The opening balance already reflects the history, so the
/// seeded entries are inserted without replaying their effects.
pub fn demo_database(password: &str) -> Result<Database, AppError> {
    let mut db = Database::default();
    let mut user = User::new("Joana Silva".into(), DEMO_EMAIL, dec("2500.00")?);
    user.created_at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single().unwrap_or(user.created_at);
    user.updated_at = user.created_at;
    let user = db.insert_user(user);
    db.set_credential(DEMO_EMAIL, hash_password(password)?);

    let history = [
        (TransactionType::Deposit, "150.00", "Depósito via PIX", (2022, 11, 18)),
        (TransactionType::Deposit, "100.00", "Depósito", (2022, 11, 21)),
        (TransactionType::Deposit, "50.00", "Depósito", (2022, 11, 21)),
        (TransactionType::Transfer, "500.00", "Transferência", (2022, 11, 21)),
    ];
    for (transaction_type, amount, description, (y, m, d)) in history {
        db.insert_transaction(Transaction::new(
            user.id,
            NewTransaction {
                transaction_type,
                amount: dec(amount)?,
                description: Some(description.to_string()),
                date: date(y, m, d)?,
            },
        ));
    }

    let holdings = [
        ("Vale S.A.", "VALE3", "100", "50.00", "55.00", (2023, 1, 15)),
        ("Petrobras", "PETR4", "200", "30.00", "28.50", (2023, 2, 10)),
    ];
    for (name, symbol, quantity, purchase_price, current_price, (y, m, d)) in holdings {
        let purchase_date = date(y, m, d)?;
        let created_at = Utc
            .from_utc_datetime(&purchase_date.and_hms_opt(10, 0, 0).unwrap_or_default());
        let mut investment = Investment {
            id: uuid::Uuid::new_v4(),
            user_id: user.id,
            name: name.to_string(),
            investment_type: InvestmentType::Stocks,
            symbol: symbol.to_string(),
            quantity: dec(quantity)?,
            purchase_price: dec(purchase_price)?,
            current_price: dec(current_price)?,
            total_value: BigDecimal::zero(),
            profit_loss: BigDecimal::zero(),
            profit_loss_percentage: BigDecimal::zero(),
            purchase_date,
            created_at,
            updated_at: created_at,
        };
        revalue(&mut investment);
        db.insert_investment(investment);
    }

    Ok(db)
}

fn dec(value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value).map_err(|e| AppError::Internal(format!("bad seed amount {}: {}", value, e)))
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| AppError::Internal(format!("bad seed date {}-{}-{}", y, m, d)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_database_contents() {
        let db = demo_database("demo123").unwrap();
        let user = db.find_user_by_email(DEMO_EMAIL).unwrap();
        assert_eq!(user.account_balance, BigDecimal::from_str("2500.00").unwrap());
        assert!(db.credential(DEMO_EMAIL).is_some());

        let ledger = db.list_transactions_by_user(user.id);
        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger[0].date, NaiveDate::from_ymd_opt(2022, 11, 21).unwrap());

        let vale = db.find_investments_by_symbol("VALE3")[0];
        assert_eq!(vale.total_value, BigDecimal::from_str("5500.00").unwrap());
        assert_eq!(vale.profit_loss, BigDecimal::from_str("500.00").unwrap());
        assert_eq!(vale.profit_loss_percentage, BigDecimal::from_str("10.00").unwrap());

        let petr = db.find_investments_by_symbol("PETR4")[0];
        assert_eq!(petr.total_value, BigDecimal::from_str("5700.00").unwrap());
        assert_eq!(petr.profit_loss, BigDecimal::from_str("-300.00").unwrap());
        assert_eq!(petr.profit_loss_percentage, BigDecimal::from_str("-5.00").unwrap());
    }
}
