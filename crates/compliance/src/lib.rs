//! `ttrack-compliance` — training compliance reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded roster, requirement and status
//! records, returns derived compliance tables plus validation issues.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod completion;
pub mod engine;
pub mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod requirements;
pub mod schema;
pub mod validation;

pub use engine::run;
pub use error::TrackerError;
pub use identity::{EmployeeKey, IdentityIndex, Resolution};
pub use model::{ComplianceReport, Employee, Requirement, RequiredType, StatusRecord, TrackerInput};
pub use validation::{validate, IssueLevel, ValidationIssue};
