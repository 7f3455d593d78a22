//! objmock core types
//!
//! Leaf building blocks of the mock engine, with no knowledge of how
//! operations are intercepted.
//!
//! # Overview
//!
//! - **Value**: dynamic values stored on surrogate targets, plus the
//!   [`MockRef`] and [`HandlerId`] handles
//! - **Report**: append-only access history of one surrogate
//! - **Registry**: two-way surrogate/handler association
//!
//! # Example
//!
//! ```rust
//! use objmock_core::{Call, Report, Value};
//!
//! let mut report = Report::new();
//! report.add_access_record(Call {
//!     arguments: vec![Value::Int(1)],
//!     return_value: Value::Null,
//! });
//!
//! assert!(report.is_called());
//! assert_eq!(report.last_call().unwrap().arguments, vec![Value::Int(1)]);
//! ```

#![warn(missing_docs)]

pub mod registry;
pub mod report;
pub mod value;

// Re-exports
pub use registry::{Registry, RegistryError};
pub use report::{
    AccessKind, AccessRecord, Call, Construct, PropertyDelete, PropertyGet, PropertySet, Report,
    ReportError,
};
pub use value::{EmulatedPrototype, HandlerId, MockRef, PropertyName, TargetKind, TypeTag, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
