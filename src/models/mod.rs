//! Data models

mod application;
mod instance;
mod status;

pub use application::{RegisteredApplication, Token};
pub use instance::Instance;
pub use status::{Account, Status, StatusId};
