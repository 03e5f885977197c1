pub mod agents;
pub mod canvas;
pub mod chat;
pub mod memory;
pub mod rest;
pub mod router;
pub mod session;
pub mod startup;
pub mod state;
pub mod validate;

// Re-export what the binaries need to build and serve the application.
pub use rest::{ApiDoc, SuccessResponse};
pub use router::build_router;
