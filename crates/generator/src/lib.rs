//! Product generator: turns attribute selections and name/description
//! templates into a reviewable batch of product variants, then commits the
//! selected variants to the shelf.
//!
//! Flow: [`GeneratorSession`] owns a [`GeneratorConfig`] while `Configuring`,
//! [`generate`](GeneratorSession::generate) builds a [`ReviewSet`]
//! (`Reviewing`), and [`commit`](GeneratorSession::commit) appends the
//! selected rows as draft [`pim_shelf::ShelfProduct`]s (`Committed`).

pub mod catalogue;
pub mod combination;
pub mod commit;
pub mod config;
pub mod error;
pub mod review;
pub mod session;

pub use catalogue::{
    AttributeDomain, AttributeKind, LtvBand, OptionalFieldSpec, ProductAttributeSpec, TemplateChip,
};
pub use combination::{
    BatchConstants, Breakdown, CombinationRow, DomainFactor, DomainSelection, GeneratorConfig,
    RowIdAllocator, generate_rows,
};
pub use commit::{build_products, commit_selected, product_revision};
pub use config::GeneratorSettings;
pub use error::GeneratorError;
pub use review::{HeaderCheckState, Page, ReviewSet, RowFilter};
pub use session::{EditTarget, GeneratorSession, SessionState, TemplateTarget};
