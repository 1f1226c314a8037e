use serde::{Deserialize, Serialize};

use pricedb_core::{DomainError, DomainResult, Money};

/// A named inventory entry with its current price.
///
/// The name is the unique key within a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: Money,
}

impl Item {
    /// Build a validated item.
    pub fn new(name: impl Into<String>, price: Money) -> DomainResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        validate_price(price)?;
        Ok(Self { name, price })
    }
}

impl core::fmt::Display for Item {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.name, self.price)
    }
}

pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }
    Ok(())
}

pub fn validate_price(price: Money) -> DomainResult<()> {
    if price.is_negative() {
        return Err(DomainError::NegativePrice(price));
    }
    Ok(())
}
