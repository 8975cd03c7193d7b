//! Data models for the Minsul API
//!
//! Request and response shapes exchanged with the backend, organized by feature
//! area. Everything the backend returns is wrapped in [`ApiResponse`].

mod admin;
mod community;
mod envelope;
mod site;
mod token;
mod upload;
mod user;

pub use admin::*;
pub use community::*;
pub use envelope::*;
pub use site::*;
pub use token::*;
pub use upload::*;
pub use user::*;
