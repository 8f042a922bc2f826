//! Sort and filter vocabulary for derived token views

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ParseError;
use crate::token::Token;

/// Numeric column a view can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    MarketCap,
    Price,
    #[serde(rename = "volume24h")]
    Volume24h,
    #[serde(rename = "priceChange24h")]
    PriceChange24h,
    Liquidity,
    Holders,
    Age,
}

impl SortField {
    /// Read this field from a token as a comparable number.
    pub fn value(&self, token: &Token) -> f64 {
        match self {
            SortField::MarketCap => token.market_cap,
            SortField::Price => token.price,
            SortField::Volume24h => token.volume_24h,
            SortField::PriceChange24h => token.price_change_24h,
            SortField::Liquidity => token.liquidity,
            SortField::Holders => token.holders as f64,
            SortField::Age => token.age as f64,
        }
    }
}

impl FromStr for SortField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketCap" => Ok(SortField::MarketCap),
            "price" => Ok(SortField::Price),
            "volume24h" => Ok(SortField::Volume24h),
            "priceChange24h" => Ok(SortField::PriceChange24h),
            "liquidity" => Ok(SortField::Liquidity),
            "holders" => Ok(SortField::Holders),
            "age" => Ok(SortField::Age),
            other => Err(ParseError::UnknownSortField(other.to_string())),
        }
    }
}

/// Ordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ParseError::UnknownSortDirection(other.to_string())),
        }
    }
}

/// Current sort of a table view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TableSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click semantics: the same field flips direction, a different
    /// field starts descending.
    pub fn toggle(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Desc,
            }
        }
    }
}

impl Default for TableSort {
    fn default() -> Self {
        Self {
            field: SortField::MarketCap,
            direction: SortDirection::Desc,
        }
    }
}

/// Threshold filters. Each threshold only applies when present; all present
/// thresholds must hold (conjunction).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_liquidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_holders: Option<u64>,
}

impl TableFilters {
    /// Whether no threshold is set.
    pub fn is_empty(&self) -> bool {
        self.min_market_cap.is_none()
            && self.max_market_cap.is_none()
            && self.min_volume.is_none()
            && self.min_liquidity.is_none()
            && self.min_holders.is_none()
    }

    /// Evaluate every present threshold against a token.
    pub fn matches(&self, token: &Token) -> bool {
        self.min_market_cap.map_or(true, |min| token.market_cap >= min)
            && self.max_market_cap.map_or(true, |max| token.market_cap <= max)
            && self.min_volume.map_or(true, |min| token.volume_24h >= min)
            && self.min_liquidity.map_or(true, |min| token.liquidity >= min)
            && self.min_holders.map_or(true, |min| token.holders >= min)
    }
}
