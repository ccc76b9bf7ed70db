//! # roost
//!
//! The reusable core of a Mastodon client: typed API requests, OAuth
//! authorization, and timeline paging.
//!
//! ## Overview
//!
//! roost deliberately contains no UI. It models requests as data, decodes
//! responses through pluggable strategies, walks the OAuth out-of-band
//! authorization flow as an explicit state machine, and maintains paged
//! timeline state with bidirectional cursors. A presentation layer
//! subscribes to state changes and drives user actions; roost owns
//! everything between the user action and the wire.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  presentation layer (external)           │
//! └──────────────────────────────────────────────────────────┘
//!         │ actions                       ▲ state / pages
//!         ▼                               │
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────┐
//! │      auth       │   │    timeline     │   │   config    │
//! │ state machine + │   │ pages + cursors │   │ toml + dirs │
//! │ credential store│   │ + pager         │   │             │
//! └─────────────────┘   └─────────────────┘   └─────────────┘
//!         │                     │
//!         └──────────┬──────────┘
//!                    ▼
//!          ┌──────────────────┐
//!          │       api        │
//!          │ request as data  │
//!          │ decode strategy  │
//!          │ executor (I/O)   │
//!          └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — request model, response decoders, executor
//! - [`auth`] — OAuth authorization state machine and credential store
//! - [`timeline`] — timeline selectors, pages, bidirectional paging
//! - [`models`] — data models (Instance, Status, application, token)
//! - [`config`] — configuration management
//!
//! ## Example
//!
//! ```no_run
//! use roost::api::Executor;
//! use roost::auth::Authorizer;
//! use roost::Config;
//!
//! # async fn run() -> roost::Result<()> {
//! let config = Config::load()?;
//! let executor = Executor::new(config.timeout())?;
//! let auth = Authorizer::new(executor, config.instance.clone());
//!
//! let app = auth.register(&config.client_name, &config.website).await?;
//! println!("open {} and paste the code", auth.authorize_url(&app));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use auth::{AuthorizationState, Authorizer};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Account, Instance, RegisteredApplication, Status, StatusId, Token};
pub use timeline::{Direction, Page, Timeline, TimelinePager, TimelineSelector};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
