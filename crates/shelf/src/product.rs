use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pim_core::{Aggregate, AggregateRoot, DomainError, Event, ShelfProductId};

use crate::rate::ProductRate;

/// Display format for effective/expiry dates (`dd/mm/yyyy`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Shown for a product attribute the product does not carry.
pub const EMPTY_CELL: &str = "—";

/// Shelf product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShelfStatus {
    Draft,
    Active,
    Inactive,
    Expired,
    Review,
}

impl ShelfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfStatus::Draft => "DRAFT",
            ShelfStatus::Active => "ACTIVE",
            ShelfStatus::Inactive => "INACTIVE",
            ShelfStatus::Expired => "EXPIRED",
            ShelfStatus::Review => "REVIEW",
        }
    }
}

impl core::fmt::Display for ShelfStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated attribute value (e.g. `Term = 60`), in generator domain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub key: String,
    pub value: String,
}

impl ProductAttribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A batch-level lending attribute (occupancy, LTV limits, credit score...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Choice(String),
    Flag(bool),
    Number(Decimal),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl core::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AttributeValue::Choice(choice) => f.write_str(choice),
            AttributeValue::Flag(true) => f.write_str("Yes"),
            AttributeValue::Flag(false) => f.write_str("No"),
            AttributeValue::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

/// Everything needed to place a new product on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: ShelfProductId,
    pub name: String,
    pub description: String,
    pub description_code: String,
    pub product_code: String,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub category: String,
    pub product_type: String,
    pub attributes: Vec<ProductAttribute>,
    pub optional_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub product_attributes: BTreeMap<String, AttributeValue>,
}

/// The configurable part of a product, as written back by an edit session.
///
/// Identity, codes, status, dates and rate are not part of a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRevision {
    pub name: String,
    pub description: String,
    pub category: String,
    pub product_type: String,
    pub attributes: Vec<ProductAttribute>,
    pub optional_fields: BTreeMap<String, String>,
    pub product_attributes: BTreeMap<String, AttributeValue>,
}

/// Aggregate root: a product on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfProduct {
    id: ShelfProductId,
    name: String,
    description: String,
    description_code: String,
    product_code: String,
    status: ShelfStatus,
    visibility: String,
    rate_embodiment: String,
    effective_date: NaiveDate,
    expiry_date: NaiveDate,
    category: String,
    product_type: String,
    attributes: Vec<ProductAttribute>,
    optional_fields: BTreeMap<String, String>,
    #[serde(default)]
    product_attributes: BTreeMap<String, AttributeValue>,
    unpublished: bool,
    rate: Option<ProductRate>,
    #[serde(default)]
    version: u64,
}

impl ShelfProduct {
    /// New products start as unpublished drafts with no rate.
    pub fn draft(draft: ProductDraft) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            description: draft.description,
            description_code: draft.description_code,
            product_code: draft.product_code,
            status: ShelfStatus::Draft,
            visibility: "automatic".to_string(),
            rate_embodiment: "any".to_string(),
            effective_date: draft.effective_date,
            expiry_date: draft.expiry_date,
            category: draft.category,
            product_type: draft.product_type,
            attributes: draft.attributes,
            optional_fields: draft.optional_fields,
            product_attributes: draft.product_attributes,
            unpublished: true,
            rate: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> ShelfProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn description_code(&self) -> &str {
        &self.description_code
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn status(&self) -> ShelfStatus {
        self.status
    }

    pub fn visibility(&self) -> &str {
        &self.visibility
    }

    pub fn rate_embodiment(&self) -> &str {
        &self.rate_embodiment
    }

    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn effective_date_display(&self) -> String {
        self.effective_date.format(DATE_FORMAT).to_string()
    }

    pub fn expiry_date_display(&self) -> String {
        self.expiry_date.format(DATE_FORMAT).to_string()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn attributes(&self) -> &[ProductAttribute] {
        &self.attributes
    }

    /// Attribute value by placeholder key (case-insensitive).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key.eq_ignore_ascii_case(key))
            .map(|a| a.value.as_str())
    }

    pub fn optional_fields(&self) -> &BTreeMap<String, String> {
        &self.optional_fields
    }

    pub fn optional_field(&self, field_id: &str) -> Option<&str> {
        self.optional_fields.get(field_id).map(String::as_str)
    }

    pub fn product_attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.product_attributes
    }

    pub fn product_attribute(&self, attribute_id: &str) -> Option<&AttributeValue> {
        self.product_attributes.get(attribute_id)
    }

    /// Shelf cell text for a product attribute, [`EMPTY_CELL`] when absent.
    pub fn product_attribute_display(&self, attribute_id: &str) -> String {
        self.product_attribute(attribute_id)
            .map_or_else(|| EMPTY_CELL.to_string(), ToString::to_string)
    }

    pub fn property_value_max(&self) -> Option<Decimal> {
        self.product_attribute("propertyValueMax")
            .and_then(AttributeValue::as_number)
    }

    pub fn credit_score_max(&self) -> Option<Decimal> {
        self.product_attribute("creditScoreMax")
            .and_then(AttributeValue::as_number)
    }

    pub fn is_unpublished(&self) -> bool {
        self.unpublished
    }

    pub fn rate(&self) -> Option<&ProductRate> {
        self.rate.as_ref()
    }

    /// Only active products are offered to borrowers.
    pub fn is_offerable(&self) -> bool {
        self.status == ShelfStatus::Active && !self.unpublished
    }
}

impl AggregateRoot for ShelfProduct {
    type Id = ShelfProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfCommand {
    SubmitForReview {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Activate {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Deactivate {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Expire {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    AssignRate {
        product_id: ShelfProductId,
        rate: ProductRate,
        occurred_at: DateTime<Utc>,
    },
    ReviseDetails {
        product_id: ShelfProductId,
        name: String,
        description: String,
        occurred_at: DateTime<Utc>,
    },
    /// Overwrite every configurable field from an edit session.
    ReviseConfiguration {
        product_id: ShelfProductId,
        revision: ProductRevision,
        occurred_at: DateTime<Utc>,
    },
    Publish {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Unpublish {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
}

impl ShelfCommand {
    pub fn product_id(&self) -> ShelfProductId {
        match self {
            ShelfCommand::SubmitForReview { product_id, .. }
            | ShelfCommand::Activate { product_id, .. }
            | ShelfCommand::Deactivate { product_id, .. }
            | ShelfCommand::Expire { product_id, .. }
            | ShelfCommand::AssignRate { product_id, .. }
            | ShelfCommand::ReviseDetails { product_id, .. }
            | ShelfCommand::ReviseConfiguration { product_id, .. }
            | ShelfCommand::Publish { product_id, .. }
            | ShelfCommand::Unpublish { product_id, .. } => *product_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfEvent {
    SubmittedForReview {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Activated {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Deactivated {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Expired {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    RateAssigned {
        product_id: ShelfProductId,
        rate: ProductRate,
        occurred_at: DateTime<Utc>,
    },
    DetailsRevised {
        product_id: ShelfProductId,
        name: String,
        description: String,
        occurred_at: DateTime<Utc>,
    },
    ConfigurationRevised {
        product_id: ShelfProductId,
        revision: ProductRevision,
        occurred_at: DateTime<Utc>,
    },
    Published {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
    Unpublished {
        product_id: ShelfProductId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ShelfEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShelfEvent::SubmittedForReview { .. } => "shelf.product.submitted_for_review",
            ShelfEvent::Activated { .. } => "shelf.product.activated",
            ShelfEvent::Deactivated { .. } => "shelf.product.deactivated",
            ShelfEvent::Expired { .. } => "shelf.product.expired",
            ShelfEvent::RateAssigned { .. } => "shelf.product.rate_assigned",
            ShelfEvent::DetailsRevised { .. } => "shelf.product.details_revised",
            ShelfEvent::ConfigurationRevised { .. } => "shelf.product.configuration_revised",
            ShelfEvent::Published { .. } => "shelf.product.published",
            ShelfEvent::Unpublished { .. } => "shelf.product.unpublished",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ShelfEvent::SubmittedForReview { occurred_at, .. }
            | ShelfEvent::Activated { occurred_at, .. }
            | ShelfEvent::Deactivated { occurred_at, .. }
            | ShelfEvent::Expired { occurred_at, .. }
            | ShelfEvent::RateAssigned { occurred_at, .. }
            | ShelfEvent::DetailsRevised { occurred_at, .. }
            | ShelfEvent::ConfigurationRevised { occurred_at, .. }
            | ShelfEvent::Published { occurred_at, .. }
            | ShelfEvent::Unpublished { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for ShelfProduct {
    type Command = ShelfCommand;
    type Event = ShelfEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ShelfEvent::SubmittedForReview { .. } => self.status = ShelfStatus::Review,
            ShelfEvent::Activated { .. } => self.status = ShelfStatus::Active,
            ShelfEvent::Deactivated { .. } => self.status = ShelfStatus::Inactive,
            ShelfEvent::Expired { .. } => self.status = ShelfStatus::Expired,
            ShelfEvent::RateAssigned { rate, .. } => self.rate = Some(rate.clone()),
            ShelfEvent::DetailsRevised {
                name, description, ..
            } => {
                self.name = name.clone();
                self.description = description.clone();
            }
            ShelfEvent::ConfigurationRevised { revision, .. } => {
                let revision = revision.clone();
                self.name = revision.name;
                self.description = revision.description;
                self.category = revision.category;
                self.product_type = revision.product_type;
                self.attributes = revision.attributes;
                self.optional_fields = revision.optional_fields;
                self.product_attributes = revision.product_attributes;
                // An edited product goes back to unpublished until re-published.
                self.unpublished = true;
            }
            ShelfEvent::Published { .. } => self.unpublished = false,
            ShelfEvent::Unpublished { .. } => self.unpublished = true,
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if command.product_id() != self.id {
            return Err(DomainError::invariant("product_id mismatch"));
        }

        let event = match command.clone() {
            ShelfCommand::SubmitForReview {
                product_id,
                occurred_at,
            } => {
                match self.status {
                    ShelfStatus::Draft => {}
                    ShelfStatus::Review => {
                        return Err(DomainError::conflict("product is already in review"));
                    }
                    _ => {
                        return Err(DomainError::invariant(
                            "only draft products can be submitted for review",
                        ));
                    }
                }
                ShelfEvent::SubmittedForReview {
                    product_id,
                    occurred_at,
                }
            }
            ShelfCommand::Activate {
                product_id,
                occurred_at,
            } => {
                match self.status {
                    ShelfStatus::Active => {
                        return Err(DomainError::conflict("product is already active"));
                    }
                    ShelfStatus::Expired => {
                        return Err(DomainError::invariant("expired products cannot be activated"));
                    }
                    _ => {}
                }
                ShelfEvent::Activated {
                    product_id,
                    occurred_at,
                }
            }
            ShelfCommand::Deactivate {
                product_id,
                occurred_at,
            } => {
                match self.status {
                    ShelfStatus::Active => {}
                    ShelfStatus::Inactive => {
                        return Err(DomainError::conflict("product is already inactive"));
                    }
                    _ => {
                        return Err(DomainError::invariant(
                            "only active products can be deactivated",
                        ));
                    }
                }
                ShelfEvent::Deactivated {
                    product_id,
                    occurred_at,
                }
            }
            ShelfCommand::Expire {
                product_id,
                occurred_at,
            } => {
                self.ensure_not_expired()?;
                ShelfEvent::Expired {
                    product_id,
                    occurred_at,
                }
            }
            ShelfCommand::AssignRate {
                product_id,
                rate,
                occurred_at,
            } => {
                self.ensure_not_expired()?;
                if !rate.is_consistent() {
                    return Err(DomainError::validation("floor rate exceeds ceiling rate"));
                }
                ShelfEvent::RateAssigned {
                    product_id,
                    rate,
                    occurred_at,
                }
            }
            ShelfCommand::ReviseDetails {
                product_id,
                name,
                description,
                occurred_at,
            } => {
                self.ensure_not_expired()?;
                if name.trim().is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
                ShelfEvent::DetailsRevised {
                    product_id,
                    name,
                    description,
                    occurred_at,
                }
            }
            ShelfCommand::ReviseConfiguration {
                product_id,
                revision,
                occurred_at,
            } => {
                self.ensure_not_expired()?;
                if revision.name.trim().is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
                ShelfEvent::ConfigurationRevised {
                    product_id,
                    revision,
                    occurred_at,
                }
            }
            ShelfCommand::Publish {
                product_id,
                occurred_at,
            } => {
                if !self.unpublished {
                    return Err(DomainError::conflict("product is already published"));
                }
                ShelfEvent::Published {
                    product_id,
                    occurred_at,
                }
            }
            ShelfCommand::Unpublish {
                product_id,
                occurred_at,
            } => {
                if self.unpublished {
                    return Err(DomainError::conflict("product is already unpublished"));
                }
                ShelfEvent::Unpublished {
                    product_id,
                    occurred_at,
                }
            }
        };

        Ok(vec![event])
    }
}

impl ShelfProduct {
    fn ensure_not_expired(&self) -> Result<(), DomainError> {
        if self.status == ShelfStatus::Expired {
            return Err(DomainError::invariant("expired products are read-only"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_product() -> ShelfProduct {
        let effective = NaiveDate::from_ymd_opt(2026, 3, 25).unwrap();
        ShelfProduct::draft(ProductDraft {
            id: ShelfProductId::new(),
            name: "Super - Full Featured - 60".to_string(),
            description: "Residential".to_string(),
            description_code: "GEN001".to_string(),
            product_code: "T2G01".to_string(),
            effective_date: effective,
            expiry_date: effective + chrono::Duration::days(365),
            category: "MORTGAGE".to_string(),
            product_type: "MORTGAGE".to_string(),
            attributes: vec![
                ProductAttribute::new("ProductFamily", "Full Featured"),
                ProductAttribute::new("Term", "60"),
            ],
            optional_fields: BTreeMap::from([("repaymentType".to_string(), "OPEN".to_string())]),
            product_attributes: BTreeMap::from([
                (
                    "occupancy".to_string(),
                    AttributeValue::Choice("OWNER_OCCUPIED".to_string()),
                ),
                (
                    "propertyValueMax".to_string(),
                    AttributeValue::Number(Decimal::new(1_500_000, 0)),
                ),
            ]),
        })
    }

    fn run(product: &mut ShelfProduct, command: ShelfCommand) -> Result<(), DomainError> {
        let events = product.handle(&command)?;
        for event in &events {
            product.apply(event);
        }
        Ok(())
    }

    fn activate(id: ShelfProductId) -> ShelfCommand {
        ShelfCommand::Activate {
            product_id: id,
            occurred_at: test_time(),
        }
    }

    #[test]
    fn draft_products_start_unpublished_without_rate() {
        let product = test_product();
        assert_eq!(product.status(), ShelfStatus::Draft);
        assert!(product.is_unpublished());
        assert!(product.rate().is_none());
        assert_eq!(product.version(), 0);
        assert_eq!(product.visibility(), "automatic");
        assert_eq!(product.rate_embodiment(), "any");
        assert_eq!(product.attribute("term"), Some("60"));
        assert_eq!(product.optional_field("repaymentType"), Some("OPEN"));
    }

    #[test]
    fn dates_display_day_first() {
        let product = test_product();
        assert_eq!(product.effective_date_display(), "25/03/2026");
        assert_eq!(product.expiry_date_display(), "25/03/2027");
    }

    #[test]
    fn review_then_activate() {
        let mut product = test_product();
        let id = product.id_typed();
        run(
            &mut product,
            ShelfCommand::SubmitForReview {
                product_id: id,
                occurred_at: test_time(),
            },
        )
        .unwrap();
        assert_eq!(product.status(), ShelfStatus::Review);

        run(&mut product, activate(id)).unwrap();
        assert_eq!(product.status(), ShelfStatus::Active);
        assert_eq!(product.version(), 2);
    }

    #[test]
    fn activate_twice_is_a_conflict() {
        let mut product = test_product();
        let id = product.id_typed();
        run(&mut product, activate(id)).unwrap();
        match run(&mut product, activate(id)).unwrap_err() {
            DomainError::Conflict(_) => {}
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn deactivate_requires_active() {
        let mut product = test_product();
        let id = product.id_typed();
        let deactivate = ShelfCommand::Deactivate {
            product_id: id,
            occurred_at: test_time(),
        };
        match product.handle(&deactivate).unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
        run(&mut product, activate(id)).unwrap();
        run(&mut product, deactivate.clone()).unwrap();
        assert_eq!(product.status(), ShelfStatus::Inactive);
        run(&mut product, activate(id)).unwrap();
        assert_eq!(product.status(), ShelfStatus::Active);
    }

    #[test]
    fn expired_products_are_read_only() {
        let mut product = test_product();
        let id = product.id_typed();
        run(
            &mut product,
            ShelfCommand::Expire {
                product_id: id,
                occurred_at: test_time(),
            },
        )
        .unwrap();

        assert!(product.handle(&activate(id)).is_err());
        let assign = ShelfCommand::AssignRate {
            product_id: id,
            rate: ProductRate::new(Decimal::new(44, 1)),
            occurred_at: test_time(),
        };
        match product.handle(&assign).unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn assign_rate_rejects_inverted_band() {
        let product = test_product();
        let mut rate = ProductRate::new(Decimal::new(44, 1));
        rate.floor_rate = Some(Decimal::new(5, 0));
        rate.ceiling_rate = Some(Decimal::new(4, 0));
        let cmd = ShelfCommand::AssignRate {
            product_id: product.id_typed(),
            rate,
            occurred_at: test_time(),
        };
        match product.handle(&cmd).unwrap_err() {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn assign_rate_records_rate() {
        let mut product = test_product();
        let rate = ProductRate::new(Decimal::new(44, 1));
        let id = product.id_typed();
        run(
            &mut product,
            ShelfCommand::AssignRate {
                product_id: id,
                rate: rate.clone(),
                occurred_at: test_time(),
            },
        )
        .unwrap();
        assert_eq!(product.rate(), Some(&rate));
    }

    #[test]
    fn revise_details_rejects_blank_name() {
        let mut product = test_product();
        let id = product.id_typed();
        let blank = ShelfCommand::ReviseDetails {
            product_id: id,
            name: "  ".to_string(),
            description: "x".to_string(),
            occurred_at: test_time(),
        };
        assert!(matches!(product.handle(&blank), Err(DomainError::Validation(_))));

        run(
            &mut product,
            ShelfCommand::ReviseDetails {
                product_id: id,
                name: "Renamed".to_string(),
                description: "New description".to_string(),
                occurred_at: test_time(),
            },
        )
        .unwrap();
        assert_eq!(product.name(), "Renamed");
        assert_eq!(product.description(), "New description");
    }

    fn revision(name: &str) -> ProductRevision {
        ProductRevision {
            name: name.to_string(),
            description: "Edited".to_string(),
            category: "LINE OF CREDIT".to_string(),
            product_type: "HELOC".to_string(),
            attributes: vec![ProductAttribute::new("ProductFamily", "Limited")],
            optional_fields: BTreeMap::new(),
            product_attributes: BTreeMap::from([(
                "creditScoreMax".to_string(),
                AttributeValue::Number(Decimal::new(900, 0)),
            )]),
        }
    }

    #[test]
    fn revise_configuration_keeps_identity_and_codes() {
        let mut product = test_product();
        let id = product.id_typed();
        run(&mut product, activate(id)).unwrap();
        run(
            &mut product,
            ShelfCommand::Publish {
                product_id: id,
                occurred_at: test_time(),
            },
        )
        .unwrap();

        run(
            &mut product,
            ShelfCommand::ReviseConfiguration {
                product_id: id,
                revision: revision("Limited HELOC"),
                occurred_at: test_time(),
            },
        )
        .unwrap();

        assert_eq!(product.id_typed(), id);
        assert_eq!(product.description_code(), "GEN001");
        assert_eq!(product.product_code(), "T2G01");
        assert_eq!(product.status(), ShelfStatus::Active);
        assert_eq!(product.name(), "Limited HELOC");
        assert_eq!(product.category(), "LINE OF CREDIT");
        assert_eq!(product.attribute("ProductFamily"), Some("Limited"));
        assert_eq!(product.attribute("Term"), None);
        assert!(product.optional_field("repaymentType").is_none());
        assert_eq!(product.credit_score_max(), Some(Decimal::new(900, 0)));
        assert_eq!(product.property_value_max(), None);
        assert!(product.is_unpublished());
        assert_eq!(product.version(), 3);
    }

    #[test]
    fn revise_configuration_rejects_blank_name_and_expired_products() {
        let mut product = test_product();
        let id = product.id_typed();
        let blank = ShelfCommand::ReviseConfiguration {
            product_id: id,
            revision: revision(" "),
            occurred_at: test_time(),
        };
        assert!(matches!(product.handle(&blank), Err(DomainError::Validation(_))));

        run(
            &mut product,
            ShelfCommand::Expire {
                product_id: id,
                occurred_at: test_time(),
            },
        )
        .unwrap();
        let edit = ShelfCommand::ReviseConfiguration {
            product_id: id,
            revision: revision("Late edit"),
            occurred_at: test_time(),
        };
        assert!(matches!(
            product.handle(&edit),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn product_attributes_display_with_dash_when_absent() {
        let product = test_product();
        assert_eq!(product.product_attribute_display("propertyValueMax"), "1500000");
        assert_eq!(product.product_attribute_display("occupancy"), "OWNER_OCCUPIED");
        assert_eq!(product.product_attribute_display("creditScoreMax"), "—");
        assert_eq!(AttributeValue::Flag(true).to_string(), "Yes");
        assert_eq!(
            AttributeValue::Number(Decimal::new(4400, 2)).to_string(),
            "44"
        );
    }

    #[test]
    fn publish_flags_toggle_once() {
        let mut product = test_product();
        let id = product.id_typed();
        let publish = ShelfCommand::Publish {
            product_id: id,
            occurred_at: test_time(),
        };
        run(&mut product, publish.clone()).unwrap();
        assert!(!product.is_unpublished());
        assert!(matches!(product.handle(&publish), Err(DomainError::Conflict(_))));

        run(&mut product, activate(id)).unwrap();
        assert!(product.is_offerable());
    }

    #[test]
    fn commands_for_another_product_are_rejected() {
        let product = test_product();
        let err = product.handle(&activate(ShelfProductId::new())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let product = test_product();
        let before = product.clone();
        let events1 = product.handle(&activate(product.id_typed())).unwrap();
        assert_eq!(product, before);
        assert_eq!(events1.len(), 1);
        assert_eq!(events1[0].event_type(), "shelf.product.activated");
    }

    #[test]
    fn status_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ShelfStatus::Draft).unwrap(), "\"DRAFT\"");
        assert_eq!(ShelfStatus::Review.to_string(), "REVIEW");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn command_for(id: ShelfProductId, pick: u8) -> ShelfCommand {
            let occurred_at = Utc::now();
            match pick % 6 {
                0 => ShelfCommand::SubmitForReview { product_id: id, occurred_at },
                1 => ShelfCommand::Activate { product_id: id, occurred_at },
                2 => ShelfCommand::Deactivate { product_id: id, occurred_at },
                3 => ShelfCommand::Expire { product_id: id, occurred_at },
                4 => ShelfCommand::Publish { product_id: id, occurred_at },
                _ => ShelfCommand::Unpublish { product_id: id, occurred_at },
            }
        }

        proptest! {
            /// Property: version counts accepted commands; expired is terminal.
            #[test]
            fn version_tracks_accepted_commands(picks in prop::collection::vec(any::<u8>(), 0..20)) {
                let mut product = test_product();
                let id = product.id_typed();
                let mut accepted = 0u64;
                let mut was_expired = false;
                for pick in picks {
                    if run(&mut product, command_for(id, pick)).is_ok() {
                        accepted += 1;
                    }
                    if was_expired {
                        prop_assert_eq!(product.status(), ShelfStatus::Expired);
                    }
                    was_expired = product.status() == ShelfStatus::Expired;
                }
                prop_assert_eq!(product.version(), accepted);
            }
        }
    }
}
