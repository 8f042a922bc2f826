//! Token record and lifecycle category
//!
//! A `Token` is the full post-mutation record exchanged between the feed and
//! its consumers. Live updates always carry the whole record, never a delta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;
use crate::ids::{TokenAddress, TokenId};

/// Lifecycle bucket a token belongs to
///
/// Price and market cap bands are disjoint per category, so that
/// NEW < FINAL_STRETCH < MIGRATED by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Freshly launched pairs
    New,
    /// Pairs close to migrating
    FinalStretch,
    /// Pairs that completed migration
    Migrated,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 3] = [Category::New, Category::FinalStretch, Category::Migrated];

    /// Wire slug, also used as the id prefix for generated tokens
    pub fn slug(&self) -> &'static str {
        match self {
            Category::New => "new",
            Category::FinalStretch => "final-stretch",
            Category::Migrated => "migrated",
        }
    }

    /// Position in `Category::ALL`
    pub fn index(&self) -> usize {
        match self {
            Category::New => 0,
            Category::FinalStretch => 1,
            Category::Migrated => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Category::New),
            "final-stretch" => Ok(Category::FinalStretch),
            "migrated" => Ok(Category::Migrated),
            other => Err(ParseError::UnknownCategory(other.to_string())),
        }
    }
}

/// A tracked token pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub symbol: String,
    pub address: TokenAddress,
    /// Price in quote currency, never negative
    pub price: f64,
    /// 24h change in percent, signed
    pub price_change_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub holders: u64,
    /// Minutes since creation
    pub age: u64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Token {
    /// Check the record-level invariants: non-negative numeric fields and
    /// `last_updated >= created_at`.
    pub fn is_valid(&self) -> bool {
        let non_negative = [self.price, self.market_cap, self.volume_24h, self.liquidity]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);

        non_negative && self.price_change_24h.is_finite() && self.last_updated >= self.created_at
    }
}

/// Direction of a price move between two observations of the same token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMovement {
    Up,
    Down,
    Flat,
}

impl PriceMovement {
    /// Classify the move from `previous` to `next`.
    pub fn between(previous: f64, next: f64) -> Self {
        if next > previous {
            PriceMovement::Up
        } else if next < previous {
            PriceMovement::Down
        } else {
            PriceMovement::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_token() -> Token {
        let now = Utc::now();
        Token {
            id: TokenId::new("new-0"),
            name: "Moonshot".to_string(),
            symbol: "MOON".to_string(),
            address: TokenAddress::new("So11111111111111111111111111111111111111112"),
            price: 0.0042,
            price_change_24h: 12.5,
            market_cap: 120_000.0,
            volume_24h: 60_000.0,
            liquidity: 18_000.0,
            holders: 812,
            age: 14,
            category: Category::New,
            logo_url: None,
            description: None,
            website: None,
            twitter: None,
            telegram: None,
            created_at: now - Duration::minutes(14),
            last_updated: now,
        }
    }

    #[test]
    fn test_category_slug_roundtrip() {
        for category in Category::ALL {
            let parsed: Category = category.slug().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("graduated".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_index_matches_all() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_category_serializes_as_slug() {
        let json = serde_json::to_string(&Category::FinalStretch).unwrap();
        assert_eq!(json, "\"final-stretch\"");
    }

    #[test]
    fn test_token_wire_shape() {
        let token = sample_token();
        let value = serde_json::to_value(&token).unwrap();

        assert_eq!(value["id"], "new-0");
        assert_eq!(value["category"], "new");
        assert!(value.get("priceChange24h").is_some());
        assert!(value.get("volume24h").is_some());
        assert!(value.get("marketCap").is_some());
        assert!(value.get("lastUpdated").is_some());
        // absent metadata is omitted
        assert!(value.get("logoUrl").is_none());
    }

    #[test]
    fn test_token_serialization_roundtrip() {
        let token = sample_token();
        let json = serde_json::to_string(&token).unwrap();
        let deserialized: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(token, deserialized);
    }

    #[test]
    fn test_token_validity() {
        let token = sample_token();
        assert!(token.is_valid());

        let mut negative = token.clone();
        negative.price = -1.0;
        assert!(!negative.is_valid());

        let mut backwards = token;
        backwards.last_updated = backwards.created_at - Duration::seconds(1);
        assert!(!backwards.is_valid());
    }

    #[test]
    fn test_price_movement() {
        assert_eq!(PriceMovement::between(1.0, 1.5), PriceMovement::Up);
        assert_eq!(PriceMovement::between(1.0, 0.5), PriceMovement::Down);
        assert_eq!(PriceMovement::between(1.0, 1.0), PriceMovement::Flat);
    }
}
