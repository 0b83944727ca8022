//! Attribute catalogue: the choices an operator can combine.
//!
//! This is read-only input to the generator. Domain order here is the column
//! order of generated rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pim_core::{DomainError, DomainResult, ValueObject};
use pim_shelf::{AttributeValue, coerce_decimal};
use pim_templating::Template;

/// Placeholder keys understood by the generator.
pub mod keys {
    pub const PRODUCT_CATEGORY: &str = "ProductCategory";
    pub const PRODUCT_TYPE: &str = "ProductType";
    pub const PRODUCT_FAMILY: &str = "ProductFamily";
    pub const TERM: &str = "Term";
    pub const RATE_TYPE: &str = "RateType";
    pub const RATE_HOLD_DAYS: &str = "RateHoldDays";
    pub const LTV_RANGE: &str = "LtvRange";
    pub const REGION: &str = "Region";
}

/// A named axis of choice with its selectable values.
///
/// `fallback` stands in when nothing is selected, so a domain always
/// contributes at least one factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDomain {
    pub key: String,
    pub label: String,
    pub values: Vec<String>,
    pub fallback: String,
}

impl AttributeDomain {
    pub fn new<V: Into<String>>(
        key: impl Into<String>,
        label: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
            fallback: fallback.into(),
        }
    }
}

pub const PRODUCT_FAMILIES: [&str; 3] = ["Full Featured", "Limited", "Smart Save"];
/// Terms in months.
pub const TERMS: [&str; 6] = ["12", "24", "36", "48", "60", "120"];
pub const RATE_TYPES: [&str; 3] = ["Fixed", "Variable", "Adjustable"];
pub const RATE_HOLD_DAYS: [&str; 5] = ["30", "60", "90", "120", "180"];
pub const REGIONS: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NT", "NS", "NU", "ON", "PE", "QC", "SK", "YT",
];

/// Loan-to-value band, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtvBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl ValueObject for LtvBand {}

impl LtvBand {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Build from typed text; non-numeric input counts as zero.
    pub fn from_text(min: &str, max: &str) -> Self {
        Self::new(coerce_decimal(min), coerce_decimal(max))
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for LtvBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}% - {}%", self.min.normalize(), self.max.normalize())
    }
}

pub fn standard_ltv_bands() -> Vec<LtvBand> {
    [(0, 65), (65, 75), (75, 80), (80, 90), (90, 95), (0, 95)]
        .into_iter()
        .map(|(min, max)| LtvBand::new(Decimal::from(min), Decimal::from(max)))
        .collect()
}

/// Standard domains in row column order.
pub fn standard_domains() -> Vec<AttributeDomain> {
    vec![
        AttributeDomain::new(keys::PRODUCT_FAMILY, "Product family", PRODUCT_FAMILIES, "Full Featured"),
        AttributeDomain::new(keys::TERM, "Term (months)", TERMS, "60"),
        AttributeDomain::new(keys::RATE_TYPE, "Rate type", RATE_TYPES, "Fixed"),
        AttributeDomain::new(keys::RATE_HOLD_DAYS, "Rate hold (days)", RATE_HOLD_DAYS, ""),
        AttributeDomain::new(
            keys::LTV_RANGE,
            "LTV range",
            standard_ltv_bands().iter().map(LtvBand::label),
            LtvBand::new(Decimal::ZERO, Decimal::from(95)).label(),
        ),
        AttributeDomain::new(keys::REGION, "Region", REGIONS, "QC"),
    ]
}

pub const PRODUCT_CATEGORIES: [&str; 3] = ["MORTGAGE", "LINE OF CREDIT", "LOAN"];

const MORTGAGE_TYPES: &[&str] = &["MORTGAGE"];
const LINE_OF_CREDIT_TYPES: &[&str] = &["HELOC", "PERSONAL_LOC", "RRSP LOC"];
const LOAN_TYPES: &[&str] = &[
    "AUTO_LOAN",
    "CONSTRUCTION_LOAN",
    "PERSONAL_UNSECURED_LOAN",
    "INVESTMENT_LOAN",
    "STUDENT_LOAN",
    "RRSP_LOAN",
    "BUSINESS_LOAN",
    "BUILDER_LOAN",
    "BRIDGE_LOAN",
    "INVESTMENT_SECURED_LOAN",
];

/// Product types allowed for `category`; unknown categories get the mortgage list.
pub fn product_types(category: &str) -> &'static [&'static str] {
    match category {
        "LINE OF CREDIT" => LINE_OF_CREDIT_TYPES,
        "LOAN" => LOAN_TYPES,
        _ => MORTGAGE_TYPES,
    }
}

/// Keep `current` if `category` allows it, otherwise its first allowed type.
pub fn sync_product_type(category: &str, current: &str) -> String {
    let allowed = product_types(category);
    if allowed.contains(&current) {
        current.to_string()
    } else {
        allowed.first().copied().unwrap_or_default().to_string()
    }
}

/// An optional general property the operator can add to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalFieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    /// `None` means free text.
    pub options: Option<&'static [&'static str]>,
}

impl OptionalFieldSpec {
    /// Placeholder key: the id with its first letter upper-cased.
    pub fn placeholder_key(&self) -> String {
        optional_field_key(self.id)
    }
}

pub const REPAYMENT_TYPES: &[&str] = &["OPEN", "CLOSED", "ANY"];
pub const TRANSACTION_TYPES: &[&str] = &[
    "NEW_PURCHASE",
    "CONSTRUCTION_DRAWS",
    "CONSTRUCTION_SINGLE_ADVANCE",
    "BUILDER_SINGLE_ADVANCE",
    "MORTGAGE_IN_COMPANY_NAME",
    "RENEWAL",
    "TRANSFER",
    "REFINANCE",
    "REFINANCE_WITH_IMPROVEMENT",
    "REFINANCE_WITH_CONSTRUCTION",
    "PORT",
    "STANDALONE BRIDGE",
    "PURCHASE_WITH_IMPROVEMENT",
    "PREAPPROVAL",
    "ASSUMPTION",
    "AMENDMENTS",
];
pub const RANKS: &[&str] = &["FIRST", "SECOND", "THIRD"];

pub const OPTIONAL_FIELDS: [OptionalFieldSpec; 5] = [
    OptionalFieldSpec {
        id: "repaymentType",
        label: "Repayment type",
        options: Some(REPAYMENT_TYPES),
    },
    OptionalFieldSpec {
        id: "transactionType",
        label: "Transaction type",
        options: Some(TRANSACTION_TYPES),
    },
    OptionalFieldSpec {
        id: "channel",
        label: "Channel",
        options: None,
    },
    OptionalFieldSpec {
        id: "rank",
        label: "Rank",
        options: Some(RANKS),
    },
    OptionalFieldSpec {
        id: "subtype",
        label: "Sub type",
        options: None,
    },
];

pub fn find_optional_field(id: &str) -> Option<&'static OptionalFieldSpec> {
    OPTIONAL_FIELDS.iter().find(|f| f.id == id)
}

pub fn optional_field_key(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// How a lending attribute is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Choice(&'static [&'static str]),
    Flag,
    Number,
}

/// A batch-level lending attribute, shown only for the categories in
/// `applicable_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductAttributeSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: AttributeKind,
    /// Required attributes are always present; the others must be added.
    pub required: bool,
    pub applicable_to: &'static [&'static str],
    /// Initial text. A blank number starts unset.
    pub default: &'static str,
}

const MORTGAGE_ONLY: &[&str] = &["MORTGAGE"];
const SECURED: &[&str] = &["MORTGAGE", "LINE OF CREDIT"];

pub const OCCUPANCIES: &[&str] = &[
    "OWNER_OCCUPIED",
    "OWNER_OCCUPIED_AND_RENTAL",
    "ANY_RENTAL",
    "RENTAL_1_UNIT",
    "RENTAL_2-4_UNITS",
    "SECOND_HOME",
    "SEASONAL",
    "VACANT",
];
pub const MORTGAGE_TYPE_OPTIONS: &[&str] = &["RESIDENTIAL", "COMMERCIAL"];
pub const INSURABILITIES: &[&str] = &["CONVENTIONAL_UNINSURED", "INSURED", "CONVENTIONAL_INSURABLE"];

const fn attribute(
    id: &'static str,
    label: &'static str,
    kind: AttributeKind,
    required: bool,
    applicable_to: &'static [&'static str],
    default: &'static str,
) -> ProductAttributeSpec {
    ProductAttributeSpec {
        id,
        label,
        kind,
        required,
        applicable_to,
        default,
    }
}

/// Term and rate hold are generator domains, so they are not listed here.
pub const PRODUCT_ATTRIBUTES: [ProductAttributeSpec; 15] = [
    attribute("occupancy", "Occupancy", AttributeKind::Choice(OCCUPANCIES), true, SECURED, "OWNER_OCCUPIED"),
    attribute("isRenewal", "Is renewal", AttributeKind::Flag, true, MORTGAGE_ONLY, "false"),
    attribute("mortgageType", "Mortgage type", AttributeKind::Choice(MORTGAGE_TYPE_OPTIONS), true, MORTGAGE_ONLY, "RESIDENTIAL"),
    attribute("insurability", "Insurability", AttributeKind::Choice(INSURABILITIES), true, SECURED, "CONVENTIONAL_INSURABLE"),
    attribute("ltvMin", "LTV min (%)", AttributeKind::Number, true, SECURED, "0"),
    attribute("ltvMax", "LTV max (%)", AttributeKind::Number, true, SECURED, "95"),
    attribute("tdsMax", "TDS max (%)", AttributeKind::Number, true, SECURED, "44"),
    attribute("gdsMax", "GDS max (%)", AttributeKind::Number, true, SECURED, "39"),
    attribute("amortizationMin", "Amortization min", AttributeKind::Number, true, MORTGAGE_ONLY, "5"),
    attribute("amortizationMax", "Amortization max", AttributeKind::Number, true, MORTGAGE_ONLY, "30"),
    attribute("propertyValueMax", "Property value max", AttributeKind::Number, true, SECURED, ""),
    attribute("mortgageAmountMin", "Mortgage amount min", AttributeKind::Number, true, MORTGAGE_ONLY, ""),
    attribute("mortgageAmountMax", "Mortgage amount max", AttributeKind::Number, true, MORTGAGE_ONLY, ""),
    attribute("creditScoreMin", "Credit score min", AttributeKind::Number, false, SECURED, ""),
    attribute("creditScoreMax", "Credit score max", AttributeKind::Number, false, SECURED, ""),
];

impl ProductAttributeSpec {
    pub fn applies_to(&self, category: &str) -> bool {
        self.applicable_to.contains(&category)
    }

    /// Interpret typed text for this attribute.
    ///
    /// Numbers never fail: blank text leaves the value unset (`None`) and
    /// anything non-numeric counts as zero. Choices must be one of the
    /// options; flags accept `true` / `false`.
    pub fn parse(&self, text: &str) -> DomainResult<Option<AttributeValue>> {
        let text = text.trim();
        match self.kind {
            AttributeKind::Number if text.is_empty() => Ok(None),
            AttributeKind::Number => Ok(Some(AttributeValue::Number(coerce_decimal(text)))),
            AttributeKind::Flag => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Some(AttributeValue::Flag(true))),
                "false" => Ok(Some(AttributeValue::Flag(false))),
                _ => Err(DomainError::validation(format!(
                    "{} must be true or false, got {text:?}",
                    self.label
                ))),
            },
            AttributeKind::Choice(options) if options.contains(&text) => {
                Ok(Some(AttributeValue::Choice(text.to_string())))
            }
            AttributeKind::Choice(_) => Err(DomainError::validation(format!(
                "{text:?} is not a valid {}",
                self.label
            ))),
        }
    }

    /// Value before the operator types anything.
    pub fn default_value(&self) -> Option<AttributeValue> {
        self.parse(self.default).ok().flatten()
    }
}

pub fn find_product_attribute(id: &str) -> Option<&'static ProductAttributeSpec> {
    PRODUCT_ATTRIBUTES.iter().find(|a| a.id == id)
}

/// Attributes shown for `category`, in catalogue order.
pub fn applicable_attributes(category: &str) -> impl Iterator<Item = &'static ProductAttributeSpec> {
    PRODUCT_ATTRIBUTES
        .iter()
        .filter(move |a| a.applies_to(category))
}

/// Keys offered as template chips, before optional fields.
pub const TEMPLATE_PROPERTIES: [(&str, &str); 8] = [
    (keys::PRODUCT_CATEGORY, "Product category"),
    (keys::PRODUCT_TYPE, "Product type"),
    (keys::PRODUCT_FAMILY, "Product family"),
    (keys::TERM, "Term (months)"),
    (keys::RATE_TYPE, "Rate type"),
    (keys::RATE_HOLD_DAYS, "Rate hold (days)"),
    (keys::LTV_RANGE, "LTV range"),
    (keys::REGION, "Region"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateChip {
    pub key: String,
    pub label: String,
    pub active: bool,
}

/// Chips for a template editor: standard properties, then added optional fields.
pub fn template_chips<'a>(
    template: &Template,
    added_optional_fields: impl IntoIterator<Item = &'a str>,
) -> Vec<TemplateChip> {
    let standard = TEMPLATE_PROPERTIES
        .iter()
        .map(|(key, label)| (key.to_string(), label.to_string()));
    let optional = added_optional_fields
        .into_iter()
        .filter_map(find_optional_field)
        .map(|f| (f.placeholder_key(), f.label.to_string()));

    standard
        .chain(optional)
        .map(|(key, label)| TemplateChip {
            active: template.references(&key),
            key,
            label,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_domains_have_expected_order_and_sizes() {
        let domains = standard_domains();
        let shape: Vec<(&str, usize)> = domains
            .iter()
            .map(|d| (d.key.as_str(), d.values.len()))
            .collect();
        assert_eq!(
            shape,
            [
                ("ProductFamily", 3),
                ("Term", 6),
                ("RateType", 3),
                ("RateHoldDays", 5),
                ("LtvRange", 6),
                ("Region", 13),
            ]
        );
    }

    #[test]
    fn ltv_band_labels_drop_trailing_zeros() {
        assert_eq!(LtvBand::from_text("0", "95.0").label(), "0% - 95%");
        assert_eq!(LtvBand::from_text("65.5", "75").label(), "65.5% - 75%");
    }

    #[test]
    fn ltv_band_coerces_junk_to_zero() {
        assert_eq!(LtvBand::from_text("abc", "").label(), "0% - 0%");
    }

    #[test]
    fn category_change_syncs_product_type() {
        assert_eq!(sync_product_type("LOAN", "MORTGAGE"), "AUTO_LOAN");
        assert_eq!(sync_product_type("LINE OF CREDIT", "RRSP LOC"), "RRSP LOC");
        assert_eq!(sync_product_type("UNKNOWN", "HELOC"), "MORTGAGE");
    }

    #[test]
    fn optional_field_keys_capitalize_first_letter() {
        assert_eq!(optional_field_key("repaymentType"), "RepaymentType");
        assert_eq!(optional_field_key("rank"), "Rank");
        assert_eq!(optional_field_key(""), "");
        assert!(find_optional_field("subtype").unwrap().options.is_none());
        assert!(find_optional_field("colour").is_none());
    }

    #[test]
    fn chips_mark_active_placeholders_case_insensitively() {
        let template = Template::from("Super - &ProductFamily - &Ratetype - &Rank");
        let chips = template_chips(&template, ["rank", "unknownField"]);
        assert_eq!(chips.len(), 9);
        let active: Vec<&str> = chips
            .iter()
            .filter(|c| c.active)
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(active, ["ProductFamily", "RateType", "Rank"]);
    }

    #[test]
    fn product_attributes_follow_category() {
        let mortgage: Vec<&str> = applicable_attributes("MORTGAGE").map(|a| a.id).collect();
        assert_eq!(mortgage.len(), 15);
        let loc: Vec<&str> = applicable_attributes("LINE OF CREDIT").map(|a| a.id).collect();
        assert!(loc.contains(&"propertyValueMax"));
        assert!(!loc.contains(&"amortizationMin"));
        assert!(!loc.contains(&"isRenewal"));
        assert_eq!(applicable_attributes("LOAN").count(), 0);
    }

    #[test]
    fn numeric_attribute_text_is_coerced() {
        let tds = find_product_attribute("tdsMax").unwrap();
        assert_eq!(
            tds.parse(" 42.5 ").unwrap(),
            Some(AttributeValue::Number(Decimal::new(425, 1)))
        );
        assert_eq!(
            tds.parse("forty").unwrap(),
            Some(AttributeValue::Number(Decimal::ZERO))
        );
        assert_eq!(tds.parse("   ").unwrap(), None);
        assert_eq!(
            tds.default_value(),
            Some(AttributeValue::Number(Decimal::from(44)))
        );
        assert_eq!(find_product_attribute("propertyValueMax").unwrap().default_value(), None);
    }

    #[test]
    fn choice_and_flag_attributes_validate_text() {
        let occupancy = find_product_attribute("occupancy").unwrap();
        assert!(matches!(occupancy.parse("CASTLE"), Err(DomainError::Validation(_))));
        assert_eq!(
            occupancy.parse("SEASONAL").unwrap(),
            Some(AttributeValue::Choice("SEASONAL".to_string()))
        );
        let renewal = find_product_attribute("isRenewal").unwrap();
        assert_eq!(renewal.parse("TRUE").unwrap(), Some(AttributeValue::Flag(true)));
        assert!(renewal.parse("maybe").is_err());
    }
}
