//! Blogsite Rust Client
//!
//! A Rust client library for the Blogsite REST API: login and registration,
//! blog listing, search and authoring, and category management. Every request
//! carries the stored bearer token, and an expired token is refreshed once
//! (shared across concurrent requests) before the request is retried.

mod api;
pub mod auth_client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod navigator;
pub mod request;
pub mod single_flight;
pub mod storage;
pub mod token_store;
pub mod types;
pub mod validation;

pub use auth_client::{AuthClient, AuthClientBuilder};
pub use config::AuthClientConfig;
pub use cookies::SessionCookies;
pub use error::{ClientError, Result};
pub use navigator::{LogNavigator, Navigator};
pub use request::ApiRequest;
pub use single_flight::{Flight, RefreshCoalescer};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use token_store::TokenStore;
pub use types::{Blog, BlogSearch, BlogSummary, BlogSummaryResponse, Category, Session};
