use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{normalize_email, Investment, Transaction, TransactionPatch, User, UserPatch};

/// The whole persisted document: users, their password hashes keyed by email,
/// ledger entries and portfolio holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub investments: Vec<Investment>,
}

impl Database {
    // ---- users ----

    pub fn get_user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users.iter().find(|u| u.email == email)
    }

    pub fn insert_user(&mut self, user: User) -> User {
        self.users.push(user.clone());
        user
    }

    pub fn set_user(&mut self, id: Uuid, patch: UserPatch) -> Option<User> {
        let user = self.users.iter_mut().find(|u| u.id == id)?;
        if let Some(balance) = patch.account_balance {
            user.account_balance = balance;
        }
        user.updated_at = Utc::now();
        Some(user.clone())
    }

    pub fn credential(&self, email: &str) -> Option<&str> {
        self.credentials
            .get(&normalize_email(email))
            .map(String::as_str)
    }

    pub fn set_credential(&mut self, email: &str, password_hash: String) {
        self.credentials.insert(normalize_email(email), password_hash);
    }

    // ---- transactions ----

    pub fn get_transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn insert_transaction(&mut self, transaction: Transaction) -> Transaction {
        self.transactions.push(transaction.clone());
        transaction
    }

    pub fn patch_transaction(&mut self, id: Uuid, patch: &TransactionPatch) -> Option<Transaction> {
        let transaction = self.transactions.iter_mut().find(|t| t.id == id)?;
        patch.apply_to(transaction);
        Some(transaction.clone())
    }

    pub fn remove_transaction(&mut self, id: Uuid) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        self.transactions.len() != before
    }

    /// Most recent `date` first; entries sharing a date keep insertion order.
    pub fn list_transactions_by_user(&self, user_id: Uuid) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        transactions
    }

    // ---- investments ----

    pub fn get_investment(&self, id: Uuid) -> Option<&Investment> {
        self.investments.iter().find(|i| i.id == id)
    }

    pub fn insert_investment(&mut self, investment: Investment) -> Investment {
        self.investments.push(investment.clone());
        investment
    }

    /// Runs `update` against the stored investment and stamps `updated_at`.
    pub fn patch_investment<F>(&mut self, id: Uuid, update: F) -> Option<Investment>
    where
        F: FnOnce(&mut Investment),
    {
        let investment = self.investments.iter_mut().find(|i| i.id == id)?;
        update(investment);
        investment.updated_at = Utc::now();
        Some(investment.clone())
    }

    pub fn remove_investment(&mut self, id: Uuid) -> bool {
        let before = self.investments.len();
        self.investments.retain(|i| i.id != id);
        self.investments.len() != before
    }

    /// Newest holdings first.
    pub fn list_investments_by_user(&self, user_id: Uuid) -> Vec<Investment> {
        let mut investments: Vec<Investment> = self
            .investments
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        investments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        investments
    }

    /// Every holding with this symbol, whoever owns it.
    pub fn find_investments_by_symbol(&self, symbol: &str) -> Vec<&Investment> {
        self.investments
            .iter()
            .filter(|i| i.symbol == symbol)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, TransactionType};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn entry(user_id: Uuid, day: u32, amount: i64) -> Transaction {
        Transaction::new(
            user_id,
            NewTransaction {
                transaction_type: TransactionType::Deposit,
                amount: BigDecimal::from(amount),
                description: None,
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            },
        )
    }

    #[test]
    fn test_transactions_listed_by_date_descending_and_stable() {
        let mut db = Database::default();
        let user_id = Uuid::new_v4();
        let first = db.insert_transaction(entry(user_id, 3, 1));
        let older = db.insert_transaction(entry(user_id, 1, 2));
        let second = db.insert_transaction(entry(user_id, 3, 3));
        db.insert_transaction(entry(Uuid::new_v4(), 9, 4));

        let ids: Vec<Uuid> = db
            .list_transactions_by_user(user_id)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, older.id]);
    }

    #[test]
    fn test_find_user_by_email_ignores_case() {
        let mut db = Database::default();
        let user = db.insert_user(User::new("Ana".into(), "Ana@Example.com", BigDecimal::from(0)));
        assert_eq!(db.find_user_by_email(" ana@example.COM").map(|u| u.id), Some(user.id));
        assert!(db.find_user_by_email("other@example.com").is_none());
    }

    #[test]
    fn test_remove_missing_records_reports_false() {
        let mut db = Database::default();
        assert!(!db.remove_transaction(Uuid::new_v4()));
        assert!(!db.remove_investment(Uuid::new_v4()));
    }
}
