//! `pim-core`: building blocks shared by the catalogue crates.
//!
//! Pure domain primitives only: identifiers, the error model and the small
//! traits the shelf and generator crates build on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{BatchId, RowId, SessionId, ShelfProductId};
pub use value_object::ValueObject;
