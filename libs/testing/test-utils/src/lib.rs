//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for all domain crates:
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let login = builder.login("admin");
//!     let email = builder.email("admin");
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_register");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Login unique to this builder, valid for the login pattern
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.login("alice"), "alice-7");
    /// ```
    pub fn login(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.seed)
    }

    /// Email matching [`TestDataBuilder::login`]
    pub fn email(&self, prefix: &str) -> String {
        format!("{}@example.com", self.login(prefix))
    }
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert that a JSON object has exactly `keys`, in any order
    pub fn assert_only_keys(value: &Value, keys: &[&str], context: &str) {
        let object = value
            .as_object()
            .unwrap_or_else(|| panic!("{}: expected a JSON object, got {}", context, value));

        let mut actual: Vec<&str> = object.keys().map(String::as_str).collect();
        let mut expected = keys.to_vec();
        actual.sort_unstable();
        expected.sort_unstable();

        assert_eq!(actual, expected, "{}: unexpected keys in {}", context, value);
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
