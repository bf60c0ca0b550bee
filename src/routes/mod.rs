// ABOUTME: Declarative routing document and its on-disk store.
// ABOUTME: The proxy watches the document; the orchestrator replaces it atomically.

mod document;
mod store;

pub use document::{Router, RouteDocument, ServiceWeight, Weighted, WeightedService};
pub use store::{RouteSnapshot, RouteStore, RouteStoreError};
