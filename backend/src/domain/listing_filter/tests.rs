//! Tests for the listing filter and price range handles.

use super::*;
use crate::domain::{
    DisplayName, EmailAddress, ImageRef, ListingDraft, ListingId, NewListing, User, UserId,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rstest::{fixture, rstest};

fn listing(title: &str, price: u64, category: Category) -> Listing {
    let owner = User::new(
        UserId::random(),
        DisplayName::new("Seller").expect("name"),
        EmailAddress::new("seller@example.com").expect("email"),
    );
    let draft = ListingDraft::new(title, "desc", Price::new(price), category, "017")
        .expect("valid draft");
    let new = NewListing::new(draft, ImageRef::from_stored("https://i.example.com/x.png"), &owner);
    let created = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    Listing::from_parts(ListingId::random(), created, new)
}

#[fixture]
fn catalogue() -> Vec<Listing> {
    vec![
        listing("Phone", 100, Category::Electronics),
        listing("Novel", 500, Category::Books),
        listing("Phone charger", 200, Category::Electronics),
        listing("Desk", 1500, Category::Furniture),
        listing("iPhone case", 0, Category::Other),
    ]
}

fn titles(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(Listing::title).collect()
}

#[rstest]
fn two_category_scenario_keeps_only_the_phone() {
    let items = vec![
        listing("Phone", 100, Category::Electronics),
        listing("Novel", 500, Category::Books),
    ];
    let filter = ListingFilter::new(
        CategoryFilter::All,
        PriceRange::new(Price::new(0), Price::new(200)),
        "",
    );
    assert_eq!(titles(&filter.apply(&items)), vec!["Phone"]);
}

#[rstest]
fn default_filter_keeps_everything(catalogue: Vec<Listing>) {
    assert_eq!(ListingFilter::default().apply(&catalogue), catalogue);
}

#[rstest]
fn category_match_is_exact(catalogue: Vec<Listing>) {
    let filter = ListingFilter::new(
        CategoryFilter::Only(Category::Electronics),
        PriceRange::default(),
        "",
    );
    assert_eq!(titles(&filter.apply(&catalogue)), vec!["Phone", "Phone charger"]);
}

#[rstest]
fn price_bounds_are_inclusive(catalogue: Vec<Listing>) {
    let filter = ListingFilter::new(
        CategoryFilter::All,
        PriceRange::new(Price::new(100), Price::new(500)),
        "",
    );
    assert_eq!(
        titles(&filter.apply(&catalogue)),
        vec!["Phone", "Novel", "Phone charger"]
    );
}

#[rstest]
#[case("phone", vec!["Phone", "Phone charger", "iPhone case"])]
#[case("PHONE C", vec!["Phone charger"])]
#[case("sofa", vec![])]
fn search_is_case_insensitive_substring(
    catalogue: Vec<Listing>,
    #[case] search: &str,
    #[case] expected: Vec<&str>,
) {
    let filter = ListingFilter::new(CategoryFilter::All, PriceRange::default(), search);
    assert_eq!(titles(&filter.apply(&catalogue)), expected);
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn listing_strategy() -> impl Strategy<Value = Listing> {
    ("[A-Za-z][A-Za-z ]{0,11}", 0_u64..2_000, category_strategy())
        .prop_map(|(title, price, category)| listing(&title, price, category))
}

fn category_filter_strategy() -> impl Strategy<Value = CategoryFilter> {
    prop_oneof![
        Just(CategoryFilter::All),
        category_strategy().prop_map(CategoryFilter::Only),
    ]
}

proptest! {
    /// The result is exactly the listings passing all three predicates,
    /// in their original order.
    #[test]
    fn result_is_the_ordered_subset_matching_all_predicates(
        catalogue in prop::collection::vec(listing_strategy(), 0..24),
        category in category_filter_strategy(),
        min in 0_u64..2_000,
        max in 0_u64..2_000,
        search in "[A-Za-z ]{0,3}",
    ) {
        let range = PriceRange::new(Price::new(min), Price::new(max));
        let filter = ListingFilter::new(category, range, search.clone());
        let result = filter.apply(&catalogue);

        let needle = search.to_lowercase();
        let expected: Vec<Listing> = catalogue
            .iter()
            .filter(|l| {
                let category_ok = match category {
                    CategoryFilter::All => true,
                    CategoryFilter::Only(c) => l.category() == c,
                };
                let price_ok = (range.min()..=range.max()).contains(&l.price());
                let search_ok = l.title().to_lowercase().contains(&needle);
                category_ok && price_ok && search_ok
            })
            .cloned()
            .collect();
        prop_assert_eq!(&result, &expected);

        // Subset in order: each kept listing appears after the previous one.
        let mut rest = catalogue.iter();
        for kept in &result {
            prop_assert!(rest.any(|candidate| candidate == kept));
        }
    }

    /// Dragging never leaves the handles crossed.
    #[test]
    fn drags_keep_min_at_or_below_max(
        start in (0_u64..2_000, 0_u64..2_000),
        min in prop::option::of(0_u64..2_000),
        max in prop::option::of(0_u64..2_000),
        last_min in any::<bool>(),
    ) {
        let mut range = PriceRange::new(Price::new(start.0), Price::new(start.1));
        let last = if last_min { PriceBound::Min } else { PriceBound::Max };
        range.drag_both(min.map(Price::new), max.map(Price::new), last);
        prop_assert!(range.min() <= range.max());
        let moved = if last_min { min } else { max };
        if let Some(value) = moved {
            let held = if last_min { range.min() } else { range.max() };
            prop_assert_eq!(held, Price::new(value));
        }
    }
}

#[rstest]
fn dragging_min_above_max_raises_max() {
    let mut range = PriceRange::new(Price::new(0), Price::new(200));
    range.drag_min(Price::new(350));
    assert_eq!((range.min(), range.max()), (Price::new(350), Price::new(350)));
}

#[rstest]
fn dragging_max_below_min_lowers_min() {
    let mut range = PriceRange::new(Price::new(100), Price::new(200));
    range.drag_max(Price::new(50));
    assert_eq!((range.min(), range.max()), (Price::new(50), Price::new(50)));
}

#[rstest]
fn dragging_within_bounds_moves_one_handle() {
    let mut range = PriceRange::new(Price::new(100), Price::new(900));
    range.drag_min(Price::new(300));
    range.drag_max(Price::new(400));
    assert_eq!((range.min(), range.max()), (Price::new(300), Price::new(400)));
}

#[rstest]
#[case(PriceBound::Min, (700, 700))]
#[case(PriceBound::Max, (300, 300))]
fn last_moved_handle_wins_a_crossing(#[case] last: PriceBound, #[case] expected: (u64, u64)) {
    let mut range = PriceRange::new(Price::new(0), Price::new(1000));
    range.drag_both(Some(Price::new(700)), Some(Price::new(300)), last);
    assert_eq!(
        (range.min().amount(), range.max().amount()),
        expected
    );
}

#[rstest]
fn covering_spans_zero_to_highest_price(catalogue: Vec<Listing>) {
    let range = PriceRange::covering(&catalogue);
    assert_eq!((range.min(), range.max()), (Price::ZERO, Price::new(1500)));
    let empty: Vec<Listing> = Vec::new();
    assert_eq!(PriceRange::covering(&empty).max(), Price::ZERO);
}
