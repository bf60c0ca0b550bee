// ABOUTME: Validated domain types used across the orchestrator.
// ABOUTME: Service names, image references, and phantom-typed container ids.

mod id;
mod image_ref;
mod service_name;

pub use id::ContainerId;
pub use image_ref::{ImageRef, ParseImageRefError};
pub use service_name::{ServiceName, ServiceNameError};
