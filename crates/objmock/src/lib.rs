//! objmock - deep auto-mocking test doubles
//!
//! Surrogates stand in for real dependencies, create nested child surrogates
//! the first time a missing property is read, and record every read, write,
//! removal, call and construction for later assertions.
//!
//! # Core Concepts
//!
//! - [`MockSpace`]: entry point owning the heap and the current registry
//! - [`Mock`]: handle to one surrogate; every method is a trapped operation
//! - [`Handler`]: interception state of one surrogate (target, report, policies)
//! - [`ValueFactory`]: policy deciding what calls and constructions produce
//! - [`Registry`]: queryable surrogate/handler association
//!
//! # Example
//!
//! ```rust
//! use objmock::prelude::*;
//!
//! let space = MockSpace::new();
//! let root = space.mock(MockOptions::new())?;
//!
//! // root.child.deepChild()
//! let result = root.child("child")?.child("deepChild")?.call(vec![])?;
//!
//! let id = space.deep_child_handler(&root, "child.deepChild")?;
//! let handler = space.handler(id)?;
//! assert!(handler.report().is_called());
//! assert_eq!(handler.report().last_call()?.return_value, result);
//! # Ok::<(), objmock::MockError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod factory;
pub mod handler;
pub mod heap;
pub mod mock;

// Re-exports
pub use config::MockConfig;
pub use error::{ConfigError, MockError};
pub use factory::{
    failing, fixed, from_fn, FactoryContext, FactoryPolicy, SharedFactory, SingletonFactory,
    UniqueFactory, ValueFactory,
};
pub use handler::{Handler, HandlerOptions, IgnoredProperties, Target};
pub use heap::MockHeap;
pub use mock::{Mock, MockOptions, MockSpace};
pub use objmock_core::{
    AccessKind, AccessRecord, Call, Construct, EmulatedPrototype, HandlerId, MockRef,
    PropertyDelete, PropertyGet, PropertyName, PropertySet, Registry, RegistryError, Report,
    ReportError, TargetKind, TypeTag, Value,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing tests with mocks
    pub use crate::{
        AccessKind, AccessRecord, Call, FactoryPolicy, Mock, MockConfig, MockError, MockOptions,
        MockSpace, Registry, Report, Target, TypeTag, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
