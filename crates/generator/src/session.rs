//! One operator's generation session.
//!
//! `Configuring → Reviewing → (Configuring | Committed)`. An edit that
//! changes the configuration while reviewing discards the batch and returns
//! to `Configuring`; the next [`generate`](GeneratorSession::generate) starts
//! a fresh batch with new row ids and every row selected again. `Committed`
//! is terminal.
//!
//! A session opened with [`from_product`](GeneratorSession::from_product)
//! edits that shelf product: [`save_changes`](GeneratorSession::save_changes)
//! writes the single configured combination back over it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pim_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, RowId, SessionId, ShelfProductId};
use pim_shelf::{InMemoryShelf, ShelfCollection, ShelfCommand, ShelfProduct};
use pim_templating::Template;

use crate::catalogue::{self, TemplateChip};
use crate::combination::{Breakdown, GeneratorConfig, RowIdAllocator, generate_rows};
use crate::commit::{commit_selected, product_revision};
use crate::config::GeneratorSettings;
use crate::error::GeneratorError;
use crate::review::{HeaderCheckState, Page, ReviewSet, RowFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Configuring,
    Reviewing,
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateTarget {
    Name,
    Description,
}

/// The shelf product an edit session was opened from, at the version it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTarget {
    pub product_id: ShelfProductId,
    pub version: u64,
}

#[derive(Debug, Clone)]
enum Phase {
    Configuring,
    Reviewing(ReviewSet),
    Committed,
}

#[derive(Debug, Clone)]
pub struct GeneratorSession {
    id: SessionId,
    settings: GeneratorSettings,
    config: GeneratorConfig,
    row_ids: RowIdAllocator,
    phase: Phase,
    editing: Option<EditTarget>,
}

fn template_in(config: &mut GeneratorConfig, target: TemplateTarget) -> &mut Template {
    match target {
        TemplateTarget::Name => &mut config.name_template,
        TemplateTarget::Description => &mut config.description_template,
    }
}

impl GeneratorSession {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self::with_config(settings, GeneratorConfig::default())
    }

    pub fn with_config(settings: GeneratorSettings, config: GeneratorConfig) -> Self {
        Self {
            id: SessionId::new(),
            settings,
            config,
            row_ids: RowIdAllocator::new(),
            phase: Phase::Configuring,
            editing: None,
        }
    }

    /// Open an edit session for `product`, pre-filled from its values.
    pub fn from_product(settings: GeneratorSettings, product: &ShelfProduct) -> Self {
        let mut session = Self::with_config(settings, GeneratorConfig::from_product(product));
        session.editing = Some(EditTarget {
            product_id: product.id_typed(),
            version: product.version(),
        });
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Configuring => SessionState::Configuring,
            Phase::Reviewing(_) => SessionState::Reviewing,
            Phase::Committed => SessionState::Committed,
        }
    }

    pub fn editing(&self) -> Option<EditTarget> {
        self.editing
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn breakdown(&self) -> Breakdown {
        self.config.breakdown()
    }

    pub fn sample_name(&self) -> String {
        self.config.sample_name()
    }

    pub fn sample_description(&self) -> String {
        self.config.sample_description()
    }

    pub fn review(&self) -> Option<&ReviewSet> {
        match &self.phase {
            Phase::Reviewing(review) => Some(review),
            _ => None,
        }
    }

    fn ensure_open(&self) -> DomainResult<()> {
        match self.phase {
            Phase::Committed => Err(DomainError::conflict("session already committed")),
            _ => Ok(()),
        }
    }

    /// Apply `change` to the configuration.
    ///
    /// Refused after commit. A failed change leaves the configuration as it
    /// was. The review batch is dropped only if the configuration actually
    /// changed.
    fn edit<R>(
        &mut self,
        change: impl FnOnce(&mut GeneratorConfig) -> DomainResult<R>,
    ) -> DomainResult<R> {
        self.ensure_open()?;
        let before = self.config.clone();
        let outcome = change(&mut self.config);
        if outcome.is_err() {
            self.config = before;
            return outcome;
        }
        if self.config != before && matches!(self.phase, Phase::Reviewing(_)) {
            tracing::debug!(session_id = %self.id, "configuration changed; batch discarded");
            self.phase = Phase::Configuring;
        }
        outcome
    }

    fn reviewing_mut(&mut self) -> DomainResult<&mut ReviewSet> {
        self.ensure_open()?;
        match &mut self.phase {
            Phase::Reviewing(review) => Ok(review),
            _ => Err(DomainError::invariant("no batch has been generated")),
        }
    }

    fn reviewing(&self) -> DomainResult<&ReviewSet> {
        self.ensure_open()?;
        self.review()
            .ok_or_else(|| DomainError::invariant("no batch has been generated"))
    }

    pub fn select_value(&mut self, domain: &str, value: impl Into<String>) -> DomainResult<bool> {
        self.edit(|config| {
            let selection = config.domain_mut(domain).ok_or(DomainError::NotFound)?;
            Ok(selection.select(value))
        })
    }

    pub fn deselect_value(&mut self, domain: &str, value: &str) -> DomainResult<bool> {
        self.edit(|config| {
            let selection = config.domain_mut(domain).ok_or(DomainError::NotFound)?;
            Ok(selection.deselect(value))
        })
    }

    pub fn set_values<V: Into<String>>(
        &mut self,
        domain: &str,
        values: impl IntoIterator<Item = V>,
    ) -> DomainResult<()> {
        self.edit(|config| {
            let selection = config.domain_mut(domain).ok_or(DomainError::NotFound)?;
            selection.set(values);
            Ok(())
        })
    }

    pub fn clear_domain(&mut self, domain: &str) -> DomainResult<()> {
        self.edit(|config| {
            let selection = config.domain_mut(domain).ok_or(DomainError::NotFound)?;
            selection.clear();
            Ok(())
        })
    }

    /// Changing category resets the product type when the new category
    /// does not allow the current one, and re-syncs lending attributes.
    pub fn set_category(&mut self, category: impl Into<String>) -> DomainResult<()> {
        self.edit(|config| {
            config.constants.set_category(category);
            Ok(())
        })
    }

    pub fn set_product_type(&mut self, product_type: impl Into<String>) -> DomainResult<()> {
        self.edit(|config| {
            config.constants.product_type = product_type.into();
            Ok(())
        })
    }

    pub fn add_optional_field(&mut self, field_id: &str) -> DomainResult<()> {
        self.edit(|config| {
            let spec = catalogue::find_optional_field(field_id).ok_or(DomainError::NotFound)?;
            config.constants.add_optional_field(spec.id);
            Ok(())
        })
    }

    /// Removes the field and its value, and drops its placeholder from both
    /// templates.
    pub fn remove_optional_field(&mut self, field_id: &str) -> DomainResult<()> {
        let key = catalogue::optional_field_key(field_id);
        self.edit(|config| {
            config.constants.remove_optional_field(field_id);
            config.name_template.remove_placeholder(&key);
            config.description_template.remove_placeholder(&key);
            Ok(())
        })
    }

    /// Set the value of an added optional field.
    pub fn set_optional_field(&mut self, field_id: &str, value: impl Into<String>) -> DomainResult<()> {
        self.edit(|config| config.constants.set_optional_field(field_id, value))
    }

    pub fn add_product_attribute(&mut self, attribute_id: &str) -> DomainResult<()> {
        self.edit(|config| config.constants.add_product_attribute(attribute_id))
    }

    pub fn remove_product_attribute(&mut self, attribute_id: &str) -> DomainResult<()> {
        self.edit(|config| config.constants.remove_product_attribute(attribute_id))
    }

    /// Set a lending attribute from typed text; numbers are coerced.
    pub fn set_product_attribute(&mut self, attribute_id: &str, text: &str) -> DomainResult<()> {
        self.edit(|config| config.constants.set_product_attribute(attribute_id, text))
    }

    pub fn template(&self, target: TemplateTarget) -> &Template {
        match target {
            TemplateTarget::Name => &self.config.name_template,
            TemplateTarget::Description => &self.config.description_template,
        }
    }

    pub fn set_template(&mut self, target: TemplateTarget, text: impl Into<String>) -> DomainResult<()> {
        self.edit(|config| {
            *template_in(config, target) = Template::new(text);
            Ok(())
        })
    }

    pub fn insert_placeholder(&mut self, target: TemplateTarget, key: &str) -> DomainResult<()> {
        self.edit(|config| {
            template_in(config, target).insert_placeholder(key);
            Ok(())
        })
    }

    pub fn remove_placeholder(&mut self, target: TemplateTarget, key: &str) -> DomainResult<()> {
        self.edit(|config| {
            template_in(config, target).remove_placeholder(key);
            Ok(())
        })
    }

    pub fn template_chips(&self, target: TemplateTarget) -> Vec<TemplateChip> {
        let added = self.config.constants.optional_fields.keys().map(String::as_str);
        catalogue::template_chips(self.template(target), added)
    }

    /// Build a fresh batch from the current configuration.
    ///
    /// Any previous batch is replaced wholesale.
    pub fn generate(&mut self) -> DomainResult<&ReviewSet> {
        self.ensure_open()?;
        let rows = generate_rows(&self.config, &mut self.row_ids);
        if rows.len() > self.settings.display_warn_threshold {
            tracing::warn!(
                session_id = %self.id,
                rows = rows.len(),
                threshold = self.settings.display_warn_threshold,
                "large batch generated; review will be paginated"
            );
        }
        let review = ReviewSet::new(rows);
        tracing::debug!(
            session_id = %self.id,
            batch_id = %review.batch_id(),
            rows = review.total_count(),
            "batch ready for review"
        );
        self.phase = Phase::Reviewing(review);
        self.review()
            .ok_or_else(|| DomainError::invariant("batch missing after generate"))
    }

    /// Drop the batch and go back to editing.
    pub fn back_to_configuring(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        self.phase = Phase::Configuring;
        Ok(())
    }

    pub fn toggle_row(&mut self, id: RowId) -> DomainResult<bool> {
        self.reviewing_mut()?.toggle(id)
    }

    pub fn select_all_visible(&mut self) -> DomainResult<()> {
        self.reviewing_mut()?.select_all_visible();
        Ok(())
    }

    pub fn deselect_all_visible(&mut self) -> DomainResult<()> {
        self.reviewing_mut()?.deselect_all_visible();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: RowFilter) -> DomainResult<()> {
        self.reviewing_mut()?.set_filter(filter);
        Ok(())
    }

    pub fn header_state(&self) -> DomainResult<HeaderCheckState> {
        Ok(self.reviewing()?.header_state())
    }

    /// Page `number` (zero-based) of the visible rows at the configured page size.
    pub fn visible_page(&self, number: usize) -> DomainResult<Page<'_>> {
        Ok(self.reviewing()?.visible_page(number, self.settings.page_size))
    }

    /// True while reviewing with at least one row selected.
    pub fn is_commit_enabled(&self) -> bool {
        self.review().is_some_and(|r| r.selected_count() > 0)
    }

    /// Append the selected rows to `shelf` and close the session.
    ///
    /// On a shelf error nothing is appended and the session stays in review.
    pub fn commit<S>(&mut self, shelf: &S, now: DateTime<Utc>) -> Result<Vec<ShelfProduct>, GeneratorError>
    where
        S: ShelfCollection + ?Sized,
    {
        let review = self.reviewing()?;
        let products = commit_selected(review, &self.config.constants, &self.settings, shelf, now)?;
        self.phase = Phase::Committed;
        Ok(products)
    }

    /// Write the configured combination back over the product this session
    /// is editing, keeping its id, codes, status and dates.
    ///
    /// The configuration must describe exactly one combination. The shelf
    /// refuses the revision if the product changed since the session read
    /// it. On success the session is closed; on error nothing changes.
    pub fn save_changes(
        &mut self,
        shelf: &InMemoryShelf,
        now: DateTime<Utc>,
    ) -> Result<ShelfProduct, GeneratorError> {
        self.ensure_open()?;
        let target = self
            .editing
            .ok_or_else(|| DomainError::invariant("session is not editing a shelf product"))?;
        let total = self.config.breakdown().total;
        if total != 1 {
            return Err(DomainError::validation(format!(
                "saving changes needs exactly one combination, got {total}"
            ))
            .into());
        }

        let row = generate_rows(&self.config, &mut self.row_ids)
            .pop()
            .ok_or_else(|| DomainError::invariant("no combination generated"))?;
        let command = ShelfCommand::ReviseConfiguration {
            product_id: target.product_id,
            revision: product_revision(&row, &self.config.constants, &self.settings),
            occurred_at: now,
        };
        let updated = shelf.execute(ExpectedVersion::Exact(target.version), &command)?;

        tracing::info!(
            session_id = %self.id,
            product_id = %target.product_id,
            version = updated.version(),
            "shelf product revised"
        );
        self.phase = Phase::Committed;
        Ok(updated)
    }
}
