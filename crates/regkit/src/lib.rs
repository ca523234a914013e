//! # Regkit
//!
//! Desired-state management for a hierarchical registry of keys and typed
//! values.
//!
//! ## Core Concepts
//!
//! - **Paths**: [`KeyPath`] and [`ValuePath`] parse every accepted spelling
//!   of a location (long or short hive names, an optional `32:` view prefix,
//!   the `\\` default-value marker) into one canonical form. Names compare
//!   case-insensitively.
//! - **Values**: [`value::encode`] validates raw declared data against a
//!   [`ValueType`] and normalizes it; [`value::property_matches`] compares it
//!   the way each type requires.
//! - **Resources**: a [`Declaration`] validates into an immutable [`Resource`].
//! - **Dependencies**: [`resolve`] infers an edge from every resource to its
//!   nearest declared ancestor key.
//! - **Convergence**: [`decide`] maps desired and observed state to a single
//!   [`Action`]; [`execute`] carries the actions out through a [`Provider`]
//!   in dependency order.
//!
//! ## Example
//!
//! ```ignore
//! use regkit::{Declaration, MemoryProvider, ExecuteOptions, NoProgress, ValueType};
//!
//! let declarations = vec![
//!     Declaration::key("HKEY_LOCAL_MACHINE\\Software\\Vendor"),
//!     Declaration::value("HKLM\\Software\\Vendor\\Version", ValueType::Dword, "0x10"),
//! ];
//!
//! let validated = regkit::validate_all(&declarations);
//! let edges = regkit::resolve(&validated.resources);
//! let provider = MemoryProvider::new();
//! let summary = regkit::execute(
//!     &validated.resources,
//!     &edges,
//!     &provider,
//!     &ExecuteOptions::default(),
//!     &mut NoProgress,
//! )?;
//! assert_eq!(summary.created, 2);
//! ```

pub mod converge;
pub mod error;
pub mod executor;
pub mod hive;
pub mod path;
pub mod plan;
pub mod provider;
pub mod resolve;
pub mod resource;
pub mod value;

// Re-export main types at crate root
pub use converge::{Action, Decision, Observed, Property, PropertyChange, decide, evaluate};
pub use error::{Error, ErrorCategory, Result};
pub use executor::{
    ApplyResult, ExecuteOptions, ExecuteSummary, NoProgress, ProgressCallback, execute, levels,
};
pub use hive::Hive;
pub use path::{BitView, KeyPath, PathKind, RegistryPath, ValuePath};
pub use plan::{Plan, PlanEntry, PlanOutcome, compute_plan};
pub use provider::{MemoryProvider, Provider, Snapshot};
pub use resolve::{Edge, NoObserver, ResolveObserver, resolve, resolve_with};
pub use resource::{
    Declaration, Ensure, Failure, Resource, ResourceId, ResourceKind, Validated, find_duplicates,
    validate_all,
};
pub use value::{RawData, ValueData, ValueType};
