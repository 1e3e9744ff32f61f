use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{User, UserPatch};
use crate::store::Database;
use crate::utils::round_currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    Add,
    Subtract,
}

impl BalanceDirection {
    pub fn apply(self, balance: &BigDecimal, amount: &BigDecimal) -> BigDecimal {
        match self {
            BalanceDirection::Add => balance + amount,
            BalanceDirection::Subtract => balance - amount,
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            BalanceDirection::Add => BalanceDirection::Subtract,
            BalanceDirection::Subtract => BalanceDirection::Add,
        }
    }
}

/// Moves `amount` into or out of the stored balance of `user_id`.
///
/// Negative balances are allowed here; overdraft checks belong to callers.
/// The write lands in `db`, so it commits together with whatever else the
/// enclosing store write changes.
pub fn apply_delta(
    db: &mut Database,
    user_id: Uuid,
    amount: &BigDecimal,
    direction: BalanceDirection,
) -> Result<User, AppError> {
    let user = db
        .get_user(user_id)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    let new_balance = round_currency(&direction.apply(&user.account_balance, amount));
    debug!(
        "Balance of user {}: {} -> {} ({:?} {})",
        user_id, user.account_balance, new_balance, direction, amount
    );

    db.set_user(
        user_id,
        UserPatch {
            account_balance: Some(new_balance),
        },
    )
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}
