//! Integration tests for Packhouse.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and the server, then:
//! cargo run -p packhouse-cli -- migrate
//! cargo run -p packhouse-server &
//!
//! # Run everything, including database-backed tests
//! cargo test -p packhouse-integration-tests -- --include-ignored
//! ```
//!
//! Tests that need a running server and database are `#[ignore]`-gated;
//! logical tests over the library surface run everywhere.
//!
//! # Environment Variables
//!
//! - `PACKHOUSE_TEST_URL` - Base URL of the running server
//!   (default: `http://127.0.0.1:3100`)
//! - `PACKHOUSE_DATABASE_URL` - `PostgreSQL` connection string used to plant
//!   test catalog rows (falls back to `DATABASE_URL`)

use secrecy::SecretString;
use sqlx::PgPool;

/// Base URL of the server under test.
#[must_use]
pub fn server_url() -> String {
    std::env::var("PACKHOUSE_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:3100".to_string())
}

/// Connect to the test database for planting catalog fixtures.
///
/// # Panics
///
/// Panics if no database URL is configured or the connection fails; the
/// callers are `#[ignore]`-gated tests that require the database.
pub async fn test_pool() -> PgPool {
    let database_url = std::env::var("PACKHOUSE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("PACKHOUSE_DATABASE_URL must be set for database-backed tests");

    packhouse_server::db::create_pool(&database_url)
        .await
        .expect("failed to connect to test database")
}
