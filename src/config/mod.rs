//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → ServeConfig (immutable)
//!     → TimeoutConfig converted into the Timeouts policy
//!     → handed to the serve harness at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Zero timeout values defer to the transport's own defaults

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use loader::ConfigError;
pub use schema::ServeConfig;
pub use schema::TimeoutConfig;
pub use schema::Timeouts;
