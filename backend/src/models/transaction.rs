use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{check_range, parse_date, round_currency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Payment => "payment",
        }
    }

    /// Only deposits add to the balance; every other kind takes money out.
    pub fn is_credit(self) -> bool {
        matches!(self, TransactionType::Deposit)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            "payment" => Ok(TransactionType::Payment),
            _ => Err("Invalid transaction type".to_string()),
        }
    }
}

// One entry of a user's ledger. Its effect on the balance is derived from
// `transaction_type` and `amount` and is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated ledger entry that has not been recorded yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<BigDecimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub amount: Option<BigDecimal>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub amount: Option<BigDecimal>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl Transaction {
    pub fn new(user_id: Uuid, data: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            transaction_type: data.transaction_type,
            amount: data.amount,
            description: data.description,
            date: data.date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TransactionPatch {
    /// Merges the provided fields into `transaction` and stamps `updated_at`.
    pub fn apply_to(&self, transaction: &mut Transaction) {
        if let Some(kind) = self.transaction_type {
            transaction.transaction_type = kind;
        }
        if let Some(amount) = &self.amount {
            transaction.amount = amount.clone();
        }
        if let Some(description) = &self.description {
            transaction.description = Some(description.clone());
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
        transaction.updated_at = Utc::now();
    }
}

impl CreateTransactionRequest {
    pub fn validate(self) -> Result<NewTransaction, String> {
        let (Some(kind), Some(amount), Some(date)) = (self.transaction_type, self.amount, self.date) else {
            return Err("Type, amount, and date are required".to_string());
        };
        let transaction_type = kind.parse::<TransactionType>()?;
        let amount = validate_amount(&amount)?;
        let date = parse_date(&date)?;

        Ok(NewTransaction {
            transaction_type,
            amount,
            description: clean_description(self.description),
            date,
        })
    }
}

impl UpdateTransactionRequest {
    pub fn validate(self) -> Result<TransactionPatch, String> {
        let transaction_type = self
            .transaction_type
            .map(|kind| kind.parse::<TransactionType>())
            .transpose()?;
        let amount = self.amount.as_ref().map(validate_amount).transpose()?;
        let date = self.date.as_deref().map(parse_date).transpose()?;

        Ok(TransactionPatch {
            transaction_type,
            amount,
            description: clean_description(self.description),
            date,
        })
    }
}

/// Amounts are strictly positive and kept at currency precision.
pub fn validate_amount(amount: &BigDecimal) -> Result<BigDecimal, String> {
    check_range(amount, "Amount")?;
    let amount = round_currency(amount);
    if amount <= BigDecimal::from(0) {
        return Err("Amount must be greater than 0".to_string());
    }
    Ok(amount)
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
