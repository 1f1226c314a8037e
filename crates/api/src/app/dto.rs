//! Query-string inputs and their validation.

use thiserror::Error;

use pricedb_core::Money;
use pricedb_inventory::{validate_name, validate_price};

/// `?item=<name>&price=<decimal>`; every endpoint reads a subset.
///
/// Built from the raw key/value pairs so a repeated key is not a
/// deserialization error; the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub item: Option<String>,
    pub price: Option<String>,
}

/// Rejected request input. Carries the item name where one was given.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("missing item name")]
    MissingItem,

    #[error("could not convert price: {0:?}")]
    BadPrice(String),

    #[error("price cannot be negative: {0:?}")]
    NegativePrice(String),
}

impl ItemQuery {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "item" => &mut query.item,
                "price" => &mut query.price,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    pub fn item(&self) -> Result<&str, InputError> {
        let name = self.item.as_deref().ok_or(InputError::MissingItem)?;
        validate_name(name).map_err(|_| InputError::MissingItem)?;
        Ok(name)
    }

    /// Parsed, non-negative price for the item named `name`.
    pub fn price(&self, name: &str) -> Result<Money, InputError> {
        let bad = || InputError::BadPrice(name.to_string());
        let price = self
            .price
            .as_deref()
            .ok_or_else(bad)?
            .parse::<Money>()
            .map_err(|_| bad())?;
        validate_price(price).map_err(|_| InputError::NegativePrice(name.to_string()))?;
        Ok(price)
    }

    pub fn item_and_price(&self) -> Result<(&str, Money), InputError> {
        let name = self.item()?;
        Ok((name, self.price(name)?))
    }
}
