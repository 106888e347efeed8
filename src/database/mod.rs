//! Firebase Realtime Database module.
//!
//! The database is a single JSON tree. A [`Reference`] addresses one node in that tree by a
//! sequence of child segments and maps the usual operations onto the REST API:
//!
//! | operation  | method   | semantics                                     |
//! |------------|----------|-----------------------------------------------|
//! | `set`      | `PUT`    | replace the node                              |
//! | `push`     | `POST`   | add a child under a generated, time-ordered key |
//! | `get`      | `GET`    | read the subtree as a [`DataSnapshot`]        |
//! | `update`   | `PATCH`  | merge the given fields into the node          |
//! | `remove`   | `DELETE` | delete the node and everything below it       |
//!
//! ```rust,no_run
//! # use firebase_smoke::database::FirebaseDatabase;
//! # async fn run(db: FirebaseDatabase) -> Result<(), firebase_smoke::database::DatabaseError> {
//! let users = db.child("usuarios");
//! users.child("usuario_test_001").update(&serde_json::json!({ "saldo": 1450.5 })).await?;
//! for user in users.get().await?.each() {
//!     println!("{:?} => {}", user.key(), user.val());
//! }
//! # Ok(())
//! # }
//! ```

pub mod reference;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use self::reference::Reference;
pub use self::snapshot::DataSnapshot;

use crate::core::middleware::AuthMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use thiserror::Error;

/// Errors that can occur during Realtime Database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Realtime Database API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// The database URL cannot address child nodes.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
}

/// Client for interacting with the Realtime Database.
#[derive(Clone)]
pub struct FirebaseDatabase {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseDatabase {
    /// Creates a new `FirebaseDatabase` instance.
    ///
    /// This is typically called via `FirebaseApp::database()`. Without a middleware the requests
    /// are unauthenticated, which is what the database emulator and public rules expect.
    pub fn new(http: Client, middleware: Option<AuthMiddleware>, base_url: String) -> Self {
        let mut builder = ClientBuilder::new(http);
        if let Some(middleware) = middleware {
            builder = builder.with(middleware);
        }

        Self {
            client: builder.build(),
            base_url,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// The root of the database tree.
    pub fn root(&self) -> Reference<'_> {
        Reference::new(&self.client, &self.base_url)
    }

    /// Gets a `Reference` to the child of the root at `segment`.
    ///
    /// # Arguments
    ///
    /// * `segment` - A child key, or a slash-separated path (e.g., "usuarios/usuario_test_001").
    pub fn child(&self, segment: &str) -> Reference<'_> {
        self.root().child(segment)
    }

    /// Alias of [`FirebaseDatabase::child`] for callers that think in paths.
    pub fn reference(&self, path: &str) -> Reference<'_> {
        self.child(path)
    }
}
