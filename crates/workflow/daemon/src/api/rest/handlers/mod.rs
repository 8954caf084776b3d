//! API request handlers

mod health;
mod maintenance;
mod status_templates;
mod templates;
mod users;
mod workflows;

pub use health::*;
pub use maintenance::*;
pub use status_templates::*;
pub use templates::*;
pub use users::*;
pub use workflows::*;
