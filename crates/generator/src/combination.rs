//! Cartesian-product generation of product variants.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use pim_core::{DomainError, DomainResult, Entity, RowId};
use pim_shelf::{AttributeValue, ProductAttribute, ShelfProduct};
use pim_templating::{GenerationContext, Template};

use crate::catalogue::{self, AttributeDomain, ProductAttributeSpec, keys};

/// Shown in sample previews in place of an empty value.
pub const EMPTY_PREVIEW: &str = "—";

pub const DEFAULT_TEMPLATE: &str = "Super - &ProductFamily - &Term - &Ratetype";

/// A domain plus the values currently chosen from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSelection {
    pub domain: AttributeDomain,
    selected: Vec<String>,
}

impl DomainSelection {
    pub fn new(domain: AttributeDomain) -> Self {
        Self {
            domain,
            selected: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.domain.key
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Add `value` if not already chosen. Returns whether it was added.
    pub fn select(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.selected.contains(&value) {
            return false;
        }
        self.selected.push(value);
        true
    }

    pub fn deselect(&mut self, value: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|v| v != value);
        self.selected.len() != before
    }

    /// Replace the selection, dropping duplicates but keeping first-seen order.
    pub fn set<V: Into<String>>(&mut self, values: impl IntoIterator<Item = V>) {
        self.selected.clear();
        for value in values {
            self.select(value);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_defaulted(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected values, or the domain fallback when nothing is selected.
    pub fn effective_values(&self) -> Vec<&str> {
        if self.selected.is_empty() {
            vec![self.domain.fallback.as_str()]
        } else {
            self.selected.iter().map(String::as_str).collect()
        }
    }

    pub fn factor(&self) -> usize {
        self.selected.len().max(1)
    }
}

/// Values fixed for a whole batch (not combinatorial axes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConstants {
    pub category: String,
    pub product_type: String,
    /// Optional field id → chosen value. Absent fields contribute nothing.
    pub optional_fields: BTreeMap<String, String>,
    /// Lending attributes shown for the category. `None` is a number left
    /// blank; it is not carried onto committed products.
    pub product_attributes: BTreeMap<String, Option<AttributeValue>>,
}

impl Default for BatchConstants {
    fn default() -> Self {
        let mut constants = Self {
            category: "MORTGAGE".to_string(),
            product_type: "MORTGAGE".to_string(),
            optional_fields: BTreeMap::new(),
            product_attributes: BTreeMap::new(),
        };
        constants.sync_product_attributes();
        constants
    }
}

impl BatchConstants {
    /// Change category, resetting the product type if the new category
    /// does not allow it and re-syncing the lending attributes.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.product_type = catalogue::sync_product_type(&self.category, &self.product_type);
        self.sync_product_attributes();
    }

    /// Drop attributes the category does not use and fill in missing
    /// required ones with their defaults. Values already entered are kept.
    pub fn sync_product_attributes(&mut self) {
        let category = self.category.clone();
        self.product_attributes.retain(|id, _| {
            catalogue::find_product_attribute(id).is_some_and(|spec| spec.applies_to(&category))
        });
        for spec in catalogue::applicable_attributes(&category).filter(|a| a.required) {
            self.product_attributes
                .entry(spec.id.to_string())
                .or_insert_with(|| spec.default_value());
        }
    }

    fn applicable_attribute(&self, attribute_id: &str) -> DomainResult<&'static ProductAttributeSpec> {
        let spec = catalogue::find_product_attribute(attribute_id).ok_or(DomainError::NotFound)?;
        if !spec.applies_to(&self.category) {
            return Err(DomainError::invariant(format!(
                "{} does not apply to {}",
                spec.label, self.category
            )));
        }
        Ok(spec)
    }

    /// Show an optional lending attribute. Re-adding keeps its value.
    pub fn add_product_attribute(&mut self, attribute_id: &str) -> DomainResult<()> {
        let spec = self.applicable_attribute(attribute_id)?;
        self.product_attributes
            .entry(spec.id.to_string())
            .or_insert_with(|| spec.default_value());
        Ok(())
    }

    /// Hide an optional lending attribute. Required ones cannot be removed.
    pub fn remove_product_attribute(&mut self, attribute_id: &str) -> DomainResult<()> {
        let spec = catalogue::find_product_attribute(attribute_id).ok_or(DomainError::NotFound)?;
        if spec.required {
            return Err(DomainError::invariant(format!("{} is required", spec.label)));
        }
        self.product_attributes.remove(spec.id);
        Ok(())
    }

    /// Set a shown lending attribute from typed text.
    pub fn set_product_attribute(&mut self, attribute_id: &str, text: &str) -> DomainResult<()> {
        let spec = self.applicable_attribute(attribute_id)?;
        let slot = self
            .product_attributes
            .get_mut(spec.id)
            .ok_or_else(|| DomainError::invariant(format!("{} has not been added", spec.label)))?;
        *slot = spec.parse(text)?;
        Ok(())
    }

    /// Lending attributes with a value, as stored on a committed product.
    pub fn committed_product_attributes(&self) -> BTreeMap<String, AttributeValue> {
        self.product_attributes
            .iter()
            .filter_map(|(id, value)| value.clone().map(|v| (id.clone(), v)))
            .collect()
    }

    /// Add an optional field with an empty value; re-adding keeps the value.
    pub fn add_optional_field(&mut self, field_id: &str) {
        self.optional_fields.entry(field_id.to_string()).or_default();
    }

    pub fn remove_optional_field(&mut self, field_id: &str) -> Option<String> {
        self.optional_fields.remove(field_id)
    }

    /// Set the value of an optional field that has been added.
    ///
    /// Fields with a fixed option list only accept one of those options.
    pub fn set_optional_field(&mut self, field_id: &str, value: impl Into<String>) -> DomainResult<()> {
        let spec = catalogue::find_optional_field(field_id).ok_or(DomainError::NotFound)?;
        let value = value.into();
        let rejected = spec
            .options
            .is_some_and(|options| !value.is_empty() && !options.contains(&value.as_str()));
        if rejected {
            return Err(DomainError::validation(format!(
                "{value:?} is not a valid {}",
                spec.label
            )));
        }
        let slot = self
            .optional_fields
            .get_mut(spec.id)
            .ok_or_else(|| DomainError::invariant(format!("{} has not been added", spec.label)))?;
        *slot = value;
        Ok(())
    }

    /// Placeholder values shared by every row.
    pub fn context(&self) -> GenerationContext {
        let mut ctx = GenerationContext::new()
            .with(keys::PRODUCT_CATEGORY, self.category.clone())
            .with(keys::PRODUCT_TYPE, self.product_type.clone());
        for (field_id, value) in &self.optional_fields {
            ctx.insert(&catalogue::optional_field_key(field_id), value.clone());
        }
        ctx
    }
}

/// One generated variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationRow {
    pub id: RowId,
    /// One value per domain, in domain order.
    pub fields: Vec<ProductAttribute>,
    pub name: String,
    pub description: String,
}

impl CombinationRow {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }
}

impl Entity for CombinationRow {
    type Id = RowId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Hands out row ids; never repeats within one allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIdAllocator {
    next: u64,
}

impl Default for RowIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RowIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> RowId {
        let id = RowId::new(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFactor {
    pub key: String,
    pub label: String,
    pub count: usize,
    pub defaulted: bool,
}

/// Per-domain factor counts and their product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub factors: Vec<DomainFactor>,
    /// Saturates at `u64::MAX`.
    pub total: u64,
}

/// Everything a generation run reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub domains: Vec<DomainSelection>,
    pub constants: BatchConstants,
    pub name_template: Template,
    pub description_template: Template,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(catalogue::standard_domains())
    }
}

impl GeneratorConfig {
    pub fn new(domains: Vec<AttributeDomain>) -> Self {
        Self {
            domains: domains.into_iter().map(DomainSelection::new).collect(),
            constants: BatchConstants::default(),
            name_template: Template::from(DEFAULT_TEMPLATE),
            description_template: Template::from(DEFAULT_TEMPLATE),
        }
    }

    /// Seed a configuration from an existing shelf product (edit mode).
    ///
    /// Each standard domain is pre-selected with the product's value for that
    /// key, when it has one.
    pub fn from_product(product: &ShelfProduct) -> Self {
        let mut config = Self::default();
        config.name_template = Template::from(product.name());
        config.description_template = Template::from(product.description());

        for selection in &mut config.domains {
            let value = product
                .attribute(&selection.domain.key)
                .filter(|v| !v.trim().is_empty());
            if let Some(value) = value {
                selection.select(value);
            }
        }

        if !product.category().trim().is_empty() {
            config.constants.category = product.category().to_string();
        }
        if !product.product_type().trim().is_empty() {
            config.constants.product_type = product.product_type().to_string();
        }
        config.constants.optional_fields = product.optional_fields().clone();
        config.constants.product_attributes = product
            .product_attributes()
            .iter()
            .map(|(id, value)| (id.clone(), Some(value.clone())))
            .collect();
        config.constants.sync_product_attributes();
        config
    }

    pub fn domain(&self, key: &str) -> Option<&DomainSelection> {
        self.domains
            .iter()
            .find(|d| d.domain.key.eq_ignore_ascii_case(key))
    }

    pub fn domain_mut(&mut self, key: &str) -> Option<&mut DomainSelection> {
        self.domains
            .iter_mut()
            .find(|d| d.domain.key.eq_ignore_ascii_case(key))
    }

    pub fn breakdown(&self) -> Breakdown {
        let factors: Vec<DomainFactor> = self
            .domains
            .iter()
            .map(|d| DomainFactor {
                key: d.domain.key.clone(),
                label: d.domain.label.clone(),
                count: d.factor(),
                defaulted: d.is_defaulted(),
            })
            .collect();
        let total = factors
            .iter()
            .fold(1u64, |acc, f| acc.saturating_mul(f.count as u64));
        Breakdown { factors, total }
    }

    /// Context from the first effective value of each domain, with empty
    /// values shown as [`EMPTY_PREVIEW`].
    pub fn sample_context(&self) -> GenerationContext {
        let mut ctx = self.constants.context();
        for selection in &self.domains {
            let value = selection
                .effective_values()
                .first()
                .copied()
                .filter(|v| !v.is_empty())
                .unwrap_or(EMPTY_PREVIEW);
            ctx.insert(selection.key(), value);
        }
        ctx
    }

    pub fn sample_name(&self) -> String {
        self.name_template.render(&self.sample_context())
    }

    pub fn sample_description(&self) -> String {
        self.description_template.render(&self.sample_context())
    }
}

/// Build the full Cartesian product of `config`'s domains.
///
/// The first domain varies slowest. Nothing is capped or sampled; the row
/// count is always `config.breakdown().total`.
pub fn generate_rows(config: &GeneratorConfig, ids: &mut RowIdAllocator) -> Vec<CombinationRow> {
    let constants = config.constants.context();
    let axes: Vec<Vec<&str>> = config.domains.iter().map(|d| d.effective_values()).collect();

    let tuples: Box<dyn Iterator<Item = Vec<&str>> + '_> = if axes.is_empty() {
        Box::new(std::iter::once(Vec::new()))
    } else {
        Box::new(
            axes.iter()
                .map(|values| values.iter().copied())
                .multi_cartesian_product(),
        )
    };

    let rows: Vec<CombinationRow> = tuples
        .map(|tuple| {
            let mut ctx = constants.clone();
            let fields: Vec<ProductAttribute> = config
                .domains
                .iter()
                .zip(tuple)
                .map(|(selection, value)| {
                    ctx.insert(selection.key(), value);
                    ProductAttribute::new(selection.key(), value)
                })
                .collect();
            CombinationRow {
                id: ids.next_id(),
                name: config.name_template.render(&ctx),
                description: config.description_template.render(&ctx),
                fields,
            }
        })
        .collect();

    tracing::debug!(rows = rows.len(), domains = config.domains.len(), "combinations generated");
    rows
}
