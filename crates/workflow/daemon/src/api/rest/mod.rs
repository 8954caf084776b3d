//! REST API over the workflow engine, mounted at `/api/v1`

pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
