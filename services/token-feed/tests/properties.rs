//! Property tests for generation, mutation, upserts and views.

use proptest::prelude::*;
use token_feed::generator::TokenGenerator;
use token_feed::store::CategoryStore;
use token_feed::view::project;
use types::sort::{SortDirection, SortField, TableFilters};
use types::token::Category;

fn category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::New),
        Just(Category::FinalStretch),
        Just(Category::Migrated),
    ]
}

fn sort_field() -> impl Strategy<Value = SortField> {
    prop_oneof![
        Just(SortField::MarketCap),
        Just(SortField::Price),
        Just(SortField::Volume24h),
        Just(SortField::PriceChange24h),
        Just(SortField::Liquidity),
        Just(SortField::Holders),
        Just(SortField::Age),
    ]
}

fn direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn filters() -> impl Strategy<Value = TableFilters> {
    (
        proptest::option::of(1e4f64..1e8),
        proptest::option::of(1e4f64..1e8),
        proptest::option::of(1e3f64..1e7),
        proptest::option::of(1e3f64..1e7),
        proptest::option::of(100u64..50_000),
    )
        .prop_map(|(min_market_cap, max_market_cap, min_volume, min_liquidity, min_holders)| {
            TableFilters {
                min_market_cap,
                max_market_cap,
                min_volume,
                min_liquidity,
                min_holders,
            }
        })
}

#[test]
fn test_category_bands_over_many_tokens() {
    let mut gen = TokenGenerator::seeded(1000);

    let new = gen.generate_batch(1000, Category::New);
    assert!(new.iter().all(|t| t.price < 0.01));

    let migrated = gen.generate_batch(1000, Category::Migrated);
    assert!(migrated.iter().all(|t| t.price >= 1.0));
}

proptest! {
    #[test]
    fn mutate_preserves_identity(seed in any::<u64>(), cat in category(), rounds in 1usize..20) {
        let mut gen = TokenGenerator::seeded(seed);
        let original = gen.generate_token("token-0".into(), cat);

        let mut current = original.clone();
        for _ in 0..rounds {
            let next = gen.mutate(&current);
            prop_assert!(next.last_updated > current.last_updated);
            current = next;
        }

        prop_assert_eq!(&current.id, &original.id);
        prop_assert_eq!(&current.address, &original.address);
        prop_assert_eq!(current.category, original.category);
        prop_assert_eq!(current.created_at, original.created_at);
        prop_assert!(current.is_valid());
    }

    #[test]
    fn upsert_touches_only_matching_collection(seed in any::<u64>(), cat in category(), index in 0usize..8) {
        let mut gen = TokenGenerator::seeded(seed);
        let mut store = CategoryStore::new();
        for c in Category::ALL {
            store.replace_category(c, gen.generate_batch(8, c));
        }
        let before = store.clone();

        let updated = gen.mutate(&store.tokens(cat)[index]);
        let touched = store.upsert_token(&updated);

        prop_assert_eq!(touched, vec![cat]);
        prop_assert_eq!(&store.tokens(cat)[index], &updated);
        prop_assert_eq!(store.tokens(cat).len(), 8);
        for other in Category::ALL.into_iter().filter(|c| *c != cat) {
            prop_assert_eq!(store.tokens(other), before.tokens(other));
        }
    }

    #[test]
    fn view_is_filter_conjunctive_and_sorted(
        seed in any::<u64>(),
        field in sort_field(),
        dir in direction(),
        filters in filters(),
    ) {
        let mut gen = TokenGenerator::seeded(seed);
        let mut tokens = gen.generate_batch(10, Category::New);
        tokens.extend(gen.generate_batch(10, Category::FinalStretch));
        tokens.extend(gen.generate_batch(10, Category::Migrated));

        let rows = project(&tokens, field, dir, &filters);

        let expected = tokens.iter().filter(|t| filters.matches(t)).count();
        prop_assert_eq!(rows.len(), expected);
        prop_assert!(rows.iter().all(|t| filters.matches(t)));
        for pair in rows.windows(2) {
            let (a, b) = (field.value(&pair[0]), field.value(&pair[1]));
            match dir {
                SortDirection::Asc => {
                    prop_assert!(a <= b);
                }
                SortDirection::Desc => {
                    prop_assert!(a >= b);
                }
            }
        }

        let unfiltered = project(&tokens, field, dir, &TableFilters::default());
        prop_assert_eq!(unfiltered.len(), tokens.len());
    }

    #[test]
    fn view_sort_is_stable(seed in any::<u64>(), dir in direction(), buckets in 1u64..4) {
        let mut gen = TokenGenerator::seeded(seed);
        let mut tokens = gen.generate_batch(24, Category::FinalStretch);
        for (i, token) in tokens.iter_mut().enumerate() {
            token.holders = (i as u64) % buckets;
        }

        let rows = project(&tokens, SortField::Holders, dir, &TableFilters::default());

        // within one holders value, input order is kept
        for value in 0..buckets {
            let input: Vec<_> = tokens.iter().filter(|t| t.holders == value).map(|t| t.id.clone()).collect();
            let output: Vec<_> = rows.iter().filter(|t| t.holders == value).map(|t| t.id.clone()).collect();
            prop_assert_eq!(input, output);
        }
    }
}
