//! Client SDK for the ServerDeck game-server management API
//!
//! Wraps the remote HTTP API in a strongly-typed client with response
//! caching for idempotent reads and a self-refreshing bearer token.
//!
//! ```no_run
//! use serverdeck_sdk::{ClientBuilder, ManagementClient, PlayerId};
//!
//! # async fn run() -> Result<(), serverdeck_sdk::Error> {
//! let client = ClientBuilder::new()
//!     .server_api_id("YOUR_SERVER_API_ID")
//!     .credentials("YOUR_APP_ID", "YOUR_SECRET")
//!     .build()?;
//!
//! let entry = client
//!     .get_priority_queue(&PlayerId::steam64("76561198012345678"))
//!     .await?;
//! println!("{:?}", entry);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

mod builder;

pub use auth::{AuthorizationProvider, CredentialExchange, Token};
pub use builder::ClientBuilder;
pub use cache::{Cache, CacheKeyBuilder, CachedOperation, InMemoryCache};
pub use client::{CachePolicy, CachingClient, ManagementClient, RestClient};
pub use error::Error;
pub use types::*;
