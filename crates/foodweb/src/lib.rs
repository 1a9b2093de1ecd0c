//! Schema validation, path-addressed error reporting, and a token-addressed
//! food-web store.
//!
//! This crate provides three engines that a request layer composes:
//!
//! - **Decoder combinators**: composable validators over untrusted
//!   `serde_json::Value` input, producing a typed value or a structured
//!   failure tree.
//! - **Error reporting**: a fold from failure trees to flat, deduplicated,
//!   path-keyed reports, plus a rich error payload codec with a
//!   client-visibility flag gating what crosses to clients.
//! - **A relational store**: two entity tables (plants and animals)
//!   addressed by opaque reversible tokens, connected by a directed,
//!   bidirectionally synchronized diet graph with referential-integrity
//!   checks.
//!
//! # Quick Start
//!
//! ```rust
//! use foodweb::store::Database;
//! use serde_json::json;
//!
//! let mut db = Database::new();
//!
//! // Create a plant, then an animal that eats it.
//! let fern = db.add_living_thing(&json!({
//!     "plant": {
//!         "name": "Fern",
//!         "lifespan": 700,
//!         "weight": 0.5,
//!         "lifecycle": "EVERGREEN",
//!         "eatenBy": [],
//!     }
//! })).unwrap();
//!
//! let deer = db.add_living_thing(&json!({
//!     "animal": {
//!         "name": "Deer",
//!         "lifespan": 4000,
//!         "weight": 150.0,
//!         "eatenBy": [],
//!         "diet": [fern.token()],
//!     }
//! })).unwrap();
//!
//! // Both directions of the edge were recorded.
//! assert_eq!(db.relations(&deer).unwrap().diet, vec![fern.clone()]);
//! assert_eq!(db.relations(&fern).unwrap().eaten_by, vec![deer]);
//! ```
//!
//! # Modules
//!
//! - [`decode`]: decoder combinators and the failure tree
//! - [`report`]: tree flattening, rich payloads, transit filtering
//! - [`model`]: global ids, row/input/patch shapes
//! - [`schema`]: the domain's input decoders
//! - [`store`]: entity tables, diet graph, composition root
//! - [`error`]: typed errors for the codec and the stores
//! - [`limits`]: safety limits for decoding untrusted input
//!
//! # Untrusted input
//!
//! Decoders never panic on input: validation failures are returned as
//! data, token decoding bounds every attacker-controlled length, and
//! server-only diagnostics are filtered before anything reaches a client.
//!
//! # Concurrency
//!
//! All operations are synchronous and every mutation takes `&mut self`.
//! The single-writer assumption is load-bearing: embed the stores behind a
//! mutex or an actor before sharing them across threads.

pub mod decode;
pub mod error;
pub mod limits;
pub mod model;
pub mod report;
pub mod schema;
pub mod store;

// Re-export commonly used types at crate root
pub use decode::{Decoder, ErrorTree};
pub use error::{DbError, GraphError, IdError, StoreError};
pub use model::{from_global_id, to_global_id, GlobalId, Relations, Table};
pub use report::payload::ErrorPayload;
pub use report::transit::{prepare_for_transit, TransitError};
pub use report::{report, ReportedError};
pub use store::{Database, DietGraph, EntityTable};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
