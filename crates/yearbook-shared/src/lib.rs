//! # yearbook-shared
//!
//! Types and pure helpers shared by the store and the command-line tool:
//! roles and permission rules, actor identifiers, report enums, field
//! validation and HTML escaping.

pub mod constants;
pub mod error;
pub mod roles;
pub mod sanitize;
pub mod types;
pub mod validation;

pub use error::{ParseError, ValidationError};
pub use roles::Role;
pub use types::{Actor, ReportReason, ReportStatus};
