//! Listing-query construction: raw request parameters in, a validated
//! [`FilterDescriptor`] plus [`PageRequest`] out.

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod identifier;
pub mod page;

pub use builder::{ListParams, ListQueryBuilder};
pub use descriptor::{DateRange, FilterDescriptor, Keywords};
pub use error::ValidationError;
pub use identifier::Identifier;
pub use page::PageRequest;
