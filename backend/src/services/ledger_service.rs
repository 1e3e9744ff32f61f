use std::sync::Arc;

use bigdecimal::BigDecimal;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    validate_amount, NewTransaction, Transaction, TransactionPatch, TransactionType,
};
use crate::services::balance_service::{self, BalanceDirection};
use crate::store::{Database, JsonFileStore};

/// The change one ledger entry makes to its owner's balance.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceEffect {
    pub direction: BalanceDirection,
    pub amount: BigDecimal,
}

impl BalanceEffect {
    pub fn signed(&self) -> BigDecimal {
        match self.direction {
            BalanceDirection::Add => self.amount.clone(),
            BalanceDirection::Subtract => -self.amount.clone(),
        }
    }

    fn apply(&self, db: &mut Database, user_id: Uuid) -> Result<(), AppError> {
        balance_service::apply_delta(db, user_id, &self.amount, self.direction)?;
        Ok(())
    }
}

/// Effect of recording an entry: deposits add, everything else subtracts.
pub fn new_effect(kind: TransactionType, amount: &BigDecimal) -> BalanceEffect {
    let direction = if kind.is_credit() {
        BalanceDirection::Add
    } else {
        BalanceDirection::Subtract
    };
    BalanceEffect { direction, amount: amount.clone() }
}

/// Effect that undoes a previously recorded entry.
pub fn reversal_effect(kind: TransactionType, amount: &BigDecimal) -> BalanceEffect {
    let effect = new_effect(kind, amount);
    BalanceEffect {
        direction: effect.direction.inverse(),
        amount: effect.amount,
    }
}

/// Keeps every user's balance equal to the signed sum of their ledger.
///
/// Each operation runs as a single store write, so the record change and the
/// balance change commit together or not at all.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<JsonFileStore>,
}

impl LedgerService {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self { store }
    }

    /// Records a new entry and applies its effect. Does not check funds.
    pub fn create(&self, user_id: Uuid, input: NewTransaction) -> Result<Transaction, AppError> {
        let input = validate_new(input)?;
        self.store.write(|db| record_new(db, user_id, input))
    }

    /// Like [`create`](Self::create), but first rejects debits larger than the
    /// current balance. The check runs inside the same store write.
    pub fn create_with_funds_check(
        &self,
        user_id: Uuid,
        input: NewTransaction,
    ) -> Result<Transaction, AppError> {
        let input = validate_new(input)?;
        self.store.write(|db| {
            let user = db
                .get_user(user_id)
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            if !input.transaction_type.is_credit() && user.account_balance < input.amount {
                return Err(AppError::InsufficientFunds);
            }
            record_new(db, user_id, input)
        })
    }

    /// Reverses the stored effect, merges `patch`, then applies the new effect.
    /// Runs the full reverse/reapply cycle even when only the description changes.
    pub fn update(&self, id: Uuid, mut patch: TransactionPatch) -> Result<Transaction, AppError> {
        patch.amount = patch.amount.as_ref().map(validate_amount).transpose()?;
        self.store.write(|db| {
            let old = db
                .get_transaction(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

            reversal_effect(old.transaction_type, &old.amount).apply(db, old.user_id)?;
            let updated = db
                .patch_transaction(id, &patch)
                .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;
            new_effect(updated.transaction_type, &updated.amount).apply(db, updated.user_id)?;

            info!(
                "Updated transaction {} for user {}: {} {} -> {} {}",
                id, updated.user_id, old.transaction_type, old.amount, updated.transaction_type, updated.amount
            );
            Ok(updated)
        })
    }

    /// Reverses the entry's effect and removes it. `Ok(false)` when absent.
    pub fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if self.store.read(|db| db.get_transaction(id).is_none()) {
            return Ok(false);
        }
        self.store.write(|db| {
            let Some(existing) = db.get_transaction(id).cloned() else {
                return Ok(false);
            };
            reversal_effect(existing.transaction_type, &existing.amount).apply(db, existing.user_id)?;
            let removed = db.remove_transaction(id);
            info!("Deleted transaction {} for user {}", id, existing.user_id);
            Ok(removed)
        })
    }

    pub fn get(&self, id: Uuid) -> Result<Transaction, AppError> {
        self.store
            .read(|db| db.get_transaction(id).cloned())
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// The user's ledger, most recent date first.
    pub fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        Ok(self.store.read(|db| db.list_transactions_by_user(user_id)))
    }
}

fn validate_new(mut input: NewTransaction) -> Result<NewTransaction, AppError> {
    input.amount = validate_amount(&input.amount)?;
    Ok(input)
}

fn record_new(db: &mut Database, user_id: Uuid, input: NewTransaction) -> Result<Transaction, AppError> {
    if db.get_user(user_id).is_none() {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    let transaction = db.insert_transaction(Transaction::new(user_id, input));
    new_effect(transaction.transaction_type, &transaction.amount).apply(db, user_id)?;
    info!(
        "Recorded {} of {} for user {} ({})",
        transaction.transaction_type, transaction.amount, user_id, transaction.id
    );
    Ok(transaction)
}
