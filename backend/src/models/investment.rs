use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{check_range, is_positive, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentType {
    Stocks,
    Bonds,
    Funds,
    Crypto,
}

impl InvestmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            InvestmentType::Stocks => "stocks",
            InvestmentType::Bonds => "bonds",
            InvestmentType::Funds => "funds",
            InvestmentType::Crypto => "crypto",
        }
    }
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stocks" => Ok(InvestmentType::Stocks),
            "bonds" => Ok(InvestmentType::Bonds),
            "funds" => Ok(InvestmentType::Funds),
            "crypto" => Ok(InvestmentType::Crypto),
            _ => Err("Invalid investment type".to_string()),
        }
    }
}

// A holding in the user's portfolio. `total_value`, `profit_loss` and
// `profit_loss_percentage` are derived from quantity and prices and are only
// ever written together by the valuation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub symbol: String,
    pub quantity: BigDecimal,
    pub purchase_price: BigDecimal,
    pub current_price: BigDecimal,
    pub total_value: BigDecimal,
    pub profit_loss: BigDecimal,
    pub profit_loss_percentage: BigDecimal,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub name: String,
    pub investment_type: InvestmentType,
    pub symbol: String,
    pub quantity: BigDecimal,
    pub purchase_price: BigDecimal,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct InvestmentPatch {
    pub name: Option<String>,
    pub investment_type: Option<InvestmentType>,
    pub symbol: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub purchase_price: Option<BigDecimal>,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestmentRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub investment_type: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub purchase_price: Option<BigDecimal>,
    pub purchase_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvestmentRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub investment_type: Option<String>,
    pub symbol: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub purchase_price: Option<BigDecimal>,
    pub purchase_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub new_price: BigDecimal,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshPricesRequest {
    #[serde(default)]
    pub prices: Vec<PriceUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: BigDecimal,
    pub total_cost: BigDecimal,
    pub total_profit_loss: BigDecimal,
    pub total_profit_loss_percentage: BigDecimal,
    pub investment_count: usize,
}

impl CreateInvestmentRequest {
    pub fn validate(self) -> Result<NewInvestment, String> {
        let (Some(name), Some(kind), Some(symbol), Some(quantity), Some(purchase_price), Some(purchase_date)) = (
            self.name,
            self.investment_type,
            self.symbol,
            self.quantity,
            self.purchase_price,
            self.purchase_date,
        ) else {
            return Err("All fields are required".to_string());
        };
        if name.trim().is_empty() || symbol.trim().is_empty() {
            return Err("All fields are required".to_string());
        }
        let investment_type = kind.parse::<InvestmentType>()?;
        validate_holding_inputs(Some(&quantity), Some(&purchase_price))?;

        Ok(NewInvestment {
            name: name.trim().to_string(),
            investment_type,
            symbol: normalize_symbol(&symbol),
            quantity,
            purchase_price,
            purchase_date: parse_date(&purchase_date)?,
        })
    }
}

impl UpdateInvestmentRequest {
    pub fn validate(self) -> Result<InvestmentPatch, String> {
        let investment_type = self
            .investment_type
            .map(|kind| kind.parse::<InvestmentType>())
            .transpose()?;
        validate_holding_inputs(self.quantity.as_ref(), self.purchase_price.as_ref())?;
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Name cannot be empty".to_string());
        }
        if self.symbol.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("Symbol cannot be empty".to_string());
        }

        Ok(InvestmentPatch {
            name: self.name.map(|n| n.trim().to_string()),
            investment_type,
            symbol: self.symbol.as_deref().map(normalize_symbol),
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

impl InvestmentPatch {
    /// Whether applying this patch changes an input of the derived fields.
    pub fn touches_valuation(&self) -> bool {
        self.quantity.is_some() || self.purchase_price.is_some()
    }

    pub fn apply_to(&self, investment: &mut Investment) {
        if let Some(name) = &self.name {
            investment.name = name.clone();
        }
        if let Some(kind) = self.investment_type {
            investment.investment_type = kind;
        }
        if let Some(symbol) = &self.symbol {
            investment.symbol = symbol.clone();
        }
        if let Some(quantity) = &self.quantity {
            investment.quantity = quantity.clone();
        }
        if let Some(price) = &self.purchase_price {
            investment.purchase_price = price.clone();
        }
        if let Some(date) = self.purchase_date {
            investment.purchase_date = date;
        }
    }
}

/// Checks whichever of quantity and purchase price are present: both must be
/// within the supported decimal range and strictly positive.
pub fn validate_holding_inputs(
    quantity: Option<&BigDecimal>,
    purchase_price: Option<&BigDecimal>,
) -> Result<(), String> {
    if let Some(quantity) = quantity {
        check_range(quantity, "Quantity")?;
    }
    if let Some(price) = purchase_price {
        check_range(price, "Purchase price")?;
    }
    if quantity.is_some_and(|q| !is_positive(q)) || purchase_price.is_some_and(|p| !is_positive(p)) {
        return Err("Quantity and purchase price must be greater than 0".to_string());
    }
    Ok(())
}

/// Symbols are matched upper-case with surrounding blanks removed.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_normalizes_symbol() {
        let request = CreateInvestmentRequest {
            name: Some("Vale S.A.".into()),
            investment_type: Some("stocks".into()),
            symbol: Some(" vale3 ".into()),
            quantity: Some(BigDecimal::from(100)),
            purchase_price: Some(BigDecimal::from(50)),
            purchase_date: Some("2023-01-15".into()),
        };
        let new = request.validate().unwrap();
        assert_eq!(new.symbol, "VALE3");
        assert_eq!(new.investment_type, InvestmentType::Stocks);
    }

    #[test]
    fn test_create_request_rejects_missing_or_invalid_fields() {
        let missing = CreateInvestmentRequest {
            name: Some("Bitcoin".into()),
            ..Default::default()
        };
        assert_eq!(missing.validate().unwrap_err(), "All fields are required");

        let bad_type = CreateInvestmentRequest {
            name: Some("Bitcoin".into()),
            investment_type: Some("nft".into()),
            symbol: Some("BTC".into()),
            quantity: Some(BigDecimal::from(1)),
            purchase_price: Some(BigDecimal::from(100)),
            purchase_date: Some("2024-01-01".into()),
        };
        assert_eq!(bad_type.validate().unwrap_err(), "Invalid investment type");
    }

    #[test]
    fn test_update_request_rejects_non_positive_quantity() {
        let request = UpdateInvestmentRequest {
            quantity: Some(BigDecimal::from(-3)),
            ..Default::default()
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Quantity and purchase price must be greater than 0"
        );
    }

    #[test]
    fn test_requests_reject_out_of_range_decimals() {
        let request = CreateInvestmentRequest {
            name: Some("Vale S.A.".into()),
            investment_type: Some("stocks".into()),
            symbol: Some("VALE3".into()),
            quantity: Some(BigDecimal::from_str("1e9223372036854775807").unwrap()),
            purchase_price: Some(BigDecimal::from(50)),
            purchase_date: Some("2023-01-15".into()),
        };
        assert_eq!(request.validate().unwrap_err(), "Quantity is out of range");

        let update = UpdateInvestmentRequest {
            purchase_price: Some(BigDecimal::from_str("1e-9223372036854775807").unwrap()),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err(), "Purchase price is out of range");
    }

    #[test]
    fn test_patch_reports_valuation_inputs() {
        let rename = InvestmentPatch {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(!rename.touches_valuation());

        let resize = InvestmentPatch {
            quantity: Some(BigDecimal::from(5)),
            ..Default::default()
        };
        assert!(resize.touches_valuation());
    }
}
