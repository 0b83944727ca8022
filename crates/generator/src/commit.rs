//! Turning reviewed rows into shelf products.

use chrono::{DateTime, Days, NaiveDate, Utc};

use pim_core::ShelfProductId;
use pim_shelf::{ProductDraft, ProductRevision, ShelfCollection, ShelfError, ShelfProduct};

use crate::combination::{BatchConstants, CombinationRow};
use crate::config::GeneratorSettings;
use crate::review::ReviewSet;

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// The configurable fields a product gets from `row` under `constants`.
///
/// Blank category or type fall back to the settings defaults. Optional
/// fields and numeric lending attributes left blank are dropped.
pub fn product_revision(
    row: &CombinationRow,
    constants: &BatchConstants,
    settings: &GeneratorSettings,
) -> ProductRevision {
    ProductRevision {
        name: row.name.clone(),
        description: row.description.clone(),
        category: or_default(&constants.category, &settings.default_category),
        product_type: or_default(&constants.product_type, &settings.default_product_type),
        attributes: row.fields.clone(),
        optional_fields: constants
            .optional_fields
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        product_attributes: constants.committed_product_attributes(),
    }
}

/// Map rows to draft products without touching any shelf.
///
/// Codes are numbered from `first_seq` in row order. Effective date is the
/// commit day; expiry is `settings.expiry_days` calendar days later.
pub fn build_products<'a>(
    rows: impl IntoIterator<Item = &'a CombinationRow>,
    constants: &BatchConstants,
    settings: &GeneratorSettings,
    first_seq: usize,
    now: DateTime<Utc>,
) -> Vec<ShelfProduct> {
    let effective_date = now.date_naive();
    let expiry_date = effective_date
        .checked_add_days(Days::new(u64::from(settings.expiry_days)))
        .unwrap_or(NaiveDate::MAX);

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let seq = first_seq + i;
            let revision = product_revision(row, constants, settings);
            ShelfProduct::draft(ProductDraft {
                id: ShelfProductId::new(),
                name: revision.name,
                description: revision.description,
                description_code: format!("{}{seq:03}", settings.description_code_prefix),
                product_code: format!("{}{seq:02}", settings.product_code_prefix),
                effective_date,
                expiry_date,
                category: revision.category,
                product_type: revision.product_type,
                attributes: revision.attributes,
                optional_fields: revision.optional_fields,
                product_attributes: revision.product_attributes,
            })
        })
        .collect()
}

/// Append every selected row of `review` to `shelf` as a draft product.
///
/// The append is one batch: on error nothing is added. An empty selection
/// appends an empty batch.
pub fn commit_selected<S>(
    review: &ReviewSet,
    constants: &BatchConstants,
    settings: &GeneratorSettings,
    shelf: &S,
    now: DateTime<Utc>,
) -> Result<Vec<ShelfProduct>, ShelfError>
where
    S: ShelfCollection + ?Sized,
{
    let first_seq = shelf.len() + 1;
    let products = build_products(review.selected_rows(), constants, settings, first_seq, now);
    shelf.append(products.clone())?;

    tracing::info!(
        batch_id = %review.batch_id(),
        committed = products.len(),
        generated = review.total_count(),
        shelf_total = shelf.len(),
        "generated products committed"
    );
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::AttributeDomain;
    use crate::combination::{GeneratorConfig, RowIdAllocator, generate_rows};
    use pim_core::RowId;
    use pim_shelf::{InMemoryShelf, ShelfStatus, seed_products};
    use pim_templating::Template;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        "2026-03-25T10:30:00Z".parse().unwrap()
    }

    fn review(values: &[&str]) -> (ReviewSet, BatchConstants) {
        let mut config = GeneratorConfig::new(vec![AttributeDomain::new(
            "Term",
            "Term",
            Vec::<String>::new(),
            "60",
        )]);
        config.domain_mut("Term").unwrap().set(values.iter().copied());
        config.name_template = Template::from("Fixed - &Term");
        let rows = generate_rows(&config, &mut RowIdAllocator::new());
        (ReviewSet::new(rows), config.constants)
    }

    #[test]
    fn products_are_drafts_with_sequential_codes_and_dates() {
        let (review, constants) = review(&["12", "24"]);
        let products = build_products(
            review.rows(),
            &constants,
            &GeneratorSettings::default(),
            4,
            now(),
        );
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].description_code(), "GEN004");
        assert_eq!(products[1].product_code(), "T2G05");
        assert_eq!(products[1].name(), "Fixed - 24");
        assert!(products.iter().all(|p| p.status() == ShelfStatus::Draft));
        assert_eq!(products[0].effective_date_display(), "25/03/2026");
        assert_eq!(products[0].expiry_date_display(), "25/03/2027");
        assert_eq!(products[0].attribute("term"), Some("12"));
    }

    #[test]
    fn expiry_counts_calendar_days_across_leap_years() {
        let (review, constants) = review(&["12"]);
        let leap: DateTime<Utc> = "2027-06-01T00:00:00Z".parse().unwrap();
        let products =
            build_products(review.rows(), &constants, &GeneratorSettings::default(), 1, leap);
        // 2028 is a leap year, so 365 days lands one day short of the anniversary.
        assert_eq!(products[0].expiry_date_display(), "31/05/2028");
    }

    #[test]
    fn blank_constants_fall_back_to_settings() {
        let (review, mut constants) = review(&["12"]);
        constants.category = "  ".to_string();
        constants.product_type = String::new();
        constants.add_optional_field("channel");
        constants
            .optional_fields
            .insert("rank".to_string(), "FIRST".to_string());

        let products =
            build_products(review.rows(), &constants, &GeneratorSettings::default(), 1, now());
        assert_eq!(products[0].category(), "MORTGAGE");
        assert_eq!(products[0].product_type(), "MORTGAGE");
        assert_eq!(products[0].optional_field("rank"), Some("FIRST"));
        assert_eq!(products[0].optional_field("channel"), None);
    }

    #[test]
    fn lending_attributes_are_copied_onto_products() {
        let (review, mut constants) = review(&["12"]);
        constants.set_product_attribute("propertyValueMax", "one million").unwrap();
        constants.add_product_attribute("creditScoreMax").unwrap();
        constants.set_product_attribute("creditScoreMax", "850").unwrap();

        let products =
            build_products(review.rows(), &constants, &GeneratorSettings::default(), 1, now());
        assert_eq!(products[0].property_value_max(), Some(rust_decimal::Decimal::ZERO));
        assert_eq!(products[0].credit_score_max(), Some(rust_decimal::Decimal::from(850)));
        assert_eq!(products[0].product_attribute_display("occupancy"), "OWNER_OCCUPIED");
        assert_eq!(products[0].product_attribute_display("mortgageAmountMin"), "—");
    }

    #[test]
    fn commit_appends_only_selected_rows_after_existing_products() {
        let shelf = InMemoryShelf::with_products(seed_products());
        let before = shelf.list();
        let (mut review, constants) = review(&["12", "24", "36"]);
        review.toggle(RowId::new(2)).unwrap();

        let committed =
            commit_selected(&review, &constants, &GeneratorSettings::default(), &shelf, now())
                .unwrap();
        assert_eq!(committed.len(), 2);
        assert_eq!(committed[0].description_code(), "GEN004");
        assert_eq!(committed[1].name(), "Fixed - 36");

        let after = shelf.list();
        assert_eq!(after.len(), 5);
        assert_eq!(&after[..3], &before[..]);
    }

    #[test]
    fn empty_selection_appends_nothing() {
        let shelf = InMemoryShelf::new();
        let (mut review, constants) = review(&["12"]);
        review.deselect_all_visible();
        let committed =
            commit_selected(&review, &constants, &GeneratorSettings::default(), &shelf, now())
                .unwrap();
        assert!(committed.is_empty());
        assert!(shelf.is_empty());
    }

    #[test]
    fn rejected_batch_leaves_shelf_untouched() {
        let (review, constants) = review(&["12", "24"]);
        let settings = GeneratorSettings::default();
        let existing = build_products(review.rows(), &constants, &settings, 1, now());
        let shelf = InMemoryShelf::with_products(vec![existing[0].clone()]);

        let mut batch = build_products(review.rows(), &constants, &settings, 2, now());
        batch.push(existing[0].clone());
        assert!(matches!(shelf.append(batch), Err(ShelfError::DuplicateId(_))));
        assert_eq!(shelf.len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: committing k selected rows grows the shelf by exactly k unique drafts.
            #[test]
            fn commit_appends_exactly_k(k in 0usize..40, seeded in any::<bool>()) {
                let shelf = if seeded {
                    InMemoryShelf::with_products(seed_products())
                } else {
                    InMemoryShelf::new()
                };
                let before = shelf.len();
                let values: Vec<String> = (0..k.max(1)).map(|i| i.to_string()).collect();
                let refs: Vec<&str> = values.iter().map(String::as_str).collect();
                let (mut review, constants) = review(&refs);
                if k == 0 {
                    review.deselect_all_visible();
                }

                let committed = commit_selected(
                    &review,
                    &constants,
                    &GeneratorSettings::default(),
                    &shelf,
                    now(),
                )
                .unwrap();

                prop_assert_eq!(committed.len(), k);
                prop_assert_eq!(shelf.len(), before + k);
                let ids: HashSet<_> = committed.iter().map(|p| p.id_typed()).collect();
                prop_assert_eq!(ids.len(), k);
                prop_assert!(committed.iter().all(|p| p.status() == ShelfStatus::Draft));
            }
        }
    }
}
