//! # aircare
//!
//! Client-side data layer for an air-conditioning service storefront: a query
//! cache with hierarchical keys, retry and cross-resource invalidation, and the
//! validation behind the booking forms.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aircare::cache::QueryClient;
//! use aircare::config::QueryClientConfig;
//! use aircare::form::BookingForm;
//! use aircare::validation::Field;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QueryClient::new(QueryClientConfig::from_env()?);
//!
//!     let mut form = BookingForm::quick();
//!     form.set_field(Field::Name, "Ravi Kumar");
//!     form.set_field(Field::Phone, "9876543210");
//!     form.set_field(Field::Service, "ac-repair");
//!
//!     let reference = form
//!         .submit(&client, |intent| async move {
//!             // POST the intent to the booking API here.
//!             let _ = intent;
//!             Ok::<_, aircare::FetchError>("BK-1001".to_string())
//!         })
//!         .await?;
//!     println!("booked: {reference}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod keys;
pub mod promo;
pub mod retry;
pub mod validation;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{EntryStatus, MutationKind, QueryClient, QueryState, RefetchTrigger};
pub use config::{Environment, QueryClientConfig};
pub use error::{ConfigError, FetchError};
pub use keys::QueryKey;
pub use retry::{RetryPolicy, should_retry};
pub use validation::{DETAILED_QUOTE, Field, FieldValidation, QUICK_BOOKING, validate_field};
