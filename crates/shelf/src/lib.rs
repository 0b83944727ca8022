//! Product shelf: committed catalogue products and their post-commit lifecycle.
//!
//! Products enter the shelf only through a generator commit. Afterwards they
//! evolve through commands (status changes, rate assignment, detail edits);
//! nothing here performs IO.

pub mod product;
pub mod rate;
pub mod seed;
pub mod store;

pub use product::{
    AttributeValue, DATE_FORMAT, EMPTY_CELL, ProductAttribute, ProductDraft, ProductRevision,
    ShelfCommand, ShelfEvent, ShelfProduct, ShelfStatus,
};
pub use rate::{
    AnchorRate, BaseRate, ProductRate, RateSchedule, Subrate, SubrateKind, SubrateValue,
    coerce_decimal, default_anchor_rates,
};
pub use seed::seed_products;
pub use store::{InMemoryShelf, ShelfCollection, ShelfError};
