//! Common utilities and shared types for terapie.
//!
//! This crate provides foundational components used across all terapie crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and tokens via [`IdGenerator`]
//! - **Secrets**: Temporary passwords and token digests
//! - **Storage**: File storage backends for uploaded images
//!
//! # Example
//!
//! ```no_run
//! use terapie_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} -> {}", config.site_url(), id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod secret;
pub mod storage;

pub use config::{
    AuthSettings, Config, DatabaseConfig, EmailProviderKind, EmailSettings, ServerConfig,
    StorageSettings,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use secret::{generate_temp_password, hash_token};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
