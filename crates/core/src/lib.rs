#![warn(clippy::all, missing_docs)]

//! Client-side data layer for the marketplace.
//!
//! This crate hosts the domain models, configuration handling, the typed
//! REST client and the session and cart stores used by the command-line
//! front-end and any future frontends.

pub mod api;
pub mod config;
pub mod models;
pub mod storage;
pub mod stores;

pub use api::{ApiClient, ApiError};
pub use config::AppConfig;
pub use models::{Article, CartItem, Order, OrderStatus, User, UserType};
pub use storage::{FileStorage, MemoryStorage, NoopStorage, Storage, StorageError};
pub use stores::{CartStore, SessionStore};
