//! Sample shelf contents for demos and tests.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use pim_core::{Aggregate, ShelfProductId};

use crate::product::{ProductAttribute, ProductDraft, ShelfEvent, ShelfProduct, ShelfStatus};
use crate::rate::ProductRate;

struct Sample {
    name: &'static str,
    description: &'static str,
    code: u32,
    product_code: &'static str,
    status: ShelfStatus,
    effective: (i32, u32, u32),
    expiry: (i32, u32, u32),
    product_type: &'static str,
    repayment_type: &'static str,
    transaction_type: &'static str,
    family: &'static str,
    term_years: &'static str,
    rate_type: &'static str,
    ltv_range: &'static str,
    published: bool,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        name: "Internal refinance",
        description: "Residency",
        code: 1,
        product_code: "T2AB",
        status: ShelfStatus::Active,
        effective: (2020, 3, 25),
        expiry: (2021, 3, 25),
        product_type: "Residential",
        repayment_type: "CLOSED",
        transaction_type: "REFINANCE",
        family: "Full Featured",
        term_years: "5",
        rate_type: "Fixed",
        ltv_range: "<= 65% LTV",
        published: true,
    },
    Sample {
        name: "Residency",
        description: "Initiator",
        code: 2,
        product_code: "T2AC",
        status: ShelfStatus::Draft,
        effective: (2020, 3, 25),
        expiry: (2021, 3, 25),
        product_type: "Commercial",
        repayment_type: "ANY",
        transaction_type: "NEW_PURCHASE",
        family: "Pmt Mortgage",
        term_years: "1",
        rate_type: "Adjustable",
        ltv_range: "65%-75% LTV",
        published: false,
    },
    Sample {
        name: "New purchase",
        description: "Residential",
        code: 3,
        product_code: "T2AD",
        status: ShelfStatus::Active,
        effective: (2020, 6, 1),
        expiry: (2022, 6, 1),
        product_type: "Multi-family",
        repayment_type: "OPEN",
        transaction_type: "NEW_PURCHASE",
        family: "Full Featured",
        term_years: "5",
        rate_type: "Fixed",
        ltv_range: "<= 65% LTV",
        published: true,
    },
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// The three products a fresh workspace shows on its shelf (codes SOBO01..03).
pub fn seed_products() -> Vec<ShelfProduct> {
    SAMPLES.iter().map(build).collect()
}

fn build(sample: &Sample) -> ShelfProduct {
    let effective_date = date(sample.effective);
    let occurred_at: DateTime<Utc> = effective_date.and_time(NaiveTime::MIN).and_utc();

    let mut product = ShelfProduct::draft(ProductDraft {
        id: ShelfProductId::new(),
        name: sample.name.to_string(),
        description: sample.description.to_string(),
        description_code: format!("SOBO{:02}", sample.code),
        product_code: sample.product_code.to_string(),
        effective_date,
        expiry_date: date(sample.expiry),
        category: "MORTGAGE".to_string(),
        product_type: sample.product_type.to_string(),
        attributes: vec![
            ProductAttribute::new("ProductFamily", sample.family),
            ProductAttribute::new("Term", sample.term_years),
            ProductAttribute::new("RateType", sample.rate_type),
            ProductAttribute::new("LtvRange", sample.ltv_range),
        ],
        optional_fields: BTreeMap::from([
            ("repaymentType".to_string(), sample.repayment_type.to_string()),
            ("transactionType".to_string(), sample.transaction_type.to_string()),
        ]),
        product_attributes: BTreeMap::new(),
    });
    let product_id = product.id_typed();

    if sample.status == ShelfStatus::Active {
        product.apply(&ShelfEvent::Activated {
            product_id,
            occurred_at,
        });
    }
    if sample.published {
        product.apply(&ShelfEvent::Published {
            product_id,
            occurred_at,
        });
    }
    // The draft sample already carries a negotiated rate.
    if sample.code == 2 {
        let mut rate = ProductRate::new(Decimal::new(440, 2));
        rate.target_rate = Some(Decimal::new(445, 2));
        rate.ceiling_rate = Some(Decimal::new(445, 2));
        product.apply(&ShelfEvent::RateAssigned {
            product_id,
            rate,
            occurred_at,
        });
    }
    product
}
