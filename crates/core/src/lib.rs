//! `billing-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the billing crates
//! (errors, identifiers, money rendering, the calendar clock). No storage, no IO.

pub mod aggregate;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
