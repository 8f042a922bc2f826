//! Synthetic token generator
//!
//! Stands in for an upstream market-data feed. Produces token batches per
//! category and random price/volume mutations of existing tokens, using a
//! seedable ChaCha RNG so runs can be replayed deterministically.
//!
//! Category bands are disjoint: NEW < FINAL_STRETCH < MIGRATED for both price
//! and market cap.

use std::ops::{Range, RangeInclusive};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use types::ids::{TokenAddress, TokenId};
use types::token::{Category, Token};

const TOKEN_NAMES: [(&str, &str); 20] = [
    ("Moonshot", "MOON"),
    ("RocketFi", "ROCK"),
    ("SafeMoon", "SAFE"),
    ("DogeCoin", "DOGE"),
    ("ShibaInu", "SHIB"),
    ("PepeCoin", "PEPE"),
    ("FlokiInu", "FLOKI"),
    ("BabyDoge", "BABY"),
    ("ElonMars", "ELON"),
    ("MoonDoge", "MDOGE"),
    ("SafeEarth", "EARTH"),
    ("CumRocket", "CUMMIES"),
    ("BonkToken", "BONK"),
    ("SaitaInu", "SAIT"),
    ("KishuInu", "KISHU"),
    ("AkitaInu", "AKITA"),
    ("HokkaInu", "HOKK"),
    ("SamoyedCoin", "SAMO"),
    ("CateCoin", "CATE"),
    ("DogeKing", "KING"),
];

/// Length of a generated contract address.
const ADDRESS_LEN: usize = 44;

/// Max relative price move per mutation, in percent.
const MAX_PRICE_MOVE_PCT: f64 = 5.0;
/// Max relative volume move per mutation, in percent.
const MAX_VOLUME_MOVE_PCT: f64 = 10.0;
/// Max absolute drift of the 24h change per mutation, in percentage points.
const MAX_CHANGE_DRIFT: f64 = 2.0;

/// Numeric bands a freshly generated token falls into.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBands {
    pub price: Range<f64>,
    pub market_cap: Range<f64>,
    /// Minutes since creation
    pub age: RangeInclusive<u64>,
}

impl CategoryBands {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::New => Self {
                price: 0.000_001..0.01,
                market_cap: 10_000.0..500_000.0,
                age: 1..=60,
            },
            Category::FinalStretch => Self {
                price: 0.01..1.0,
                market_cap: 500_000.0..5_000_000.0,
                age: 60..=480,
            },
            Category::Migrated => Self {
                price: 1.0..100.0,
                market_cap: 5_000_000.0..100_000_000.0,
                age: 480..=10_080,
            },
        }
    }
}

/// Token generator with a deterministic seeded RNG.
pub struct TokenGenerator {
    rng: ChaCha8Rng,
}

impl TokenGenerator {
    /// Create a generator with a fixed seed (replayable output).
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create a generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, entropy otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generate a single token with the given id.
    pub fn generate_token(&mut self, id: TokenId, category: Category) -> Token {
        let bands = CategoryBands::for_category(category);
        let (name, symbol) = TOKEN_NAMES[self.rng.gen_range(0..TOKEN_NAMES.len())];

        let price = self.rng.gen_range(bands.price);
        let market_cap = self.rng.gen_range(bands.market_cap);
        let age = self.rng.gen_range(bands.age);

        let volume_24h = market_cap * self.rng.gen_range(0.1..2.0);
        let liquidity = market_cap * self.rng.gen_range(0.05..0.3);

        let now = Utc::now();
        let created_at = now - chrono::Duration::minutes(age as i64);

        Token {
            logo_url: Some(format!(
                "https://api.dicebear.com/7.x/identicon/svg?seed={}",
                id
            )),
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            address: self.address(),
            price,
            price_change_24h: self.rng.gen_range(-50.0..200.0),
            market_cap,
            volume_24h,
            liquidity,
            holders: self.rng.gen_range(100..=50_000),
            age,
            category,
            description: None,
            website: None,
            twitter: None,
            telegram: None,
            created_at,
            last_updated: now,
        }
    }

    /// Generate `count` tokens for a category, with ids `"{slug}-{index}"`.
    pub fn generate_batch(&mut self, count: usize, category: Category) -> Vec<Token> {
        (0..count)
            .map(|i| {
                let id = TokenId::new(format!("{}-{}", category.slug(), i));
                self.generate_token(id, category)
            })
            .collect()
    }

    /// Apply one random price/volume move to a token.
    ///
    /// Never touches `id`, `address`, `category` or `created_at`. Numeric
    /// fields that must stay non-negative are clamped, and `last_updated`
    /// always moves strictly forward.
    pub fn mutate(&mut self, token: &Token) -> Token {
        let price_pct: f64 = self.rng.gen_range(-MAX_PRICE_MOVE_PCT..MAX_PRICE_MOVE_PCT);
        let volume_pct: f64 = self.rng.gen_range(-MAX_VOLUME_MOVE_PCT..MAX_VOLUME_MOVE_PCT);
        let change_drift: f64 = self.rng.gen_range(-MAX_CHANGE_DRIFT..MAX_CHANGE_DRIFT);

        let price_factor = 1.0 + price_pct / 100.0;
        let volume_factor = 1.0 + volume_pct / 100.0;

        let price_change_24h = token.price_change_24h + change_drift;

        Token {
            price: non_negative(token.price * price_factor),
            price_change_24h: if price_change_24h.is_finite() {
                price_change_24h
            } else {
                token.price_change_24h
            },
            volume_24h: non_negative(token.volume_24h * volume_factor),
            market_cap: non_negative(token.market_cap * price_factor),
            liquidity: non_negative(token.liquidity),
            last_updated: advance(token.last_updated),
            ..token.clone()
        }
    }

    /// Uniform index into a collection of `len` items.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    /// Uniform delay in `[min, max]`, millisecond granularity.
    pub fn jitter(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(min_ms..=max_ms))
    }

    fn address(&mut self) -> TokenAddress {
        let address: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(ADDRESS_LEN)
            .map(char::from)
            .collect();
        TokenAddress::new(address)
    }
}

/// Clamp to a finite, non-negative value.
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Wall-clock now, or one nanosecond past `previous` if the clock has not
/// moved past it.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::nanoseconds(1)
    }
}
