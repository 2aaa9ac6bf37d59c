//! Protected call implementations.
//!
//! ## Available Implementations
//!
//! - [`mock`] - A scriptable mock call for tests and demos
//! - [`FnCall`](crate::core::FnCall) - Any async closure, from the core module
//!
//! ## Implementing a Custom Protected Call
//!
//! Implement the `ProtectedCall` trait:
//!
//! ```rust,ignore
//! use breakwater::core::ProtectedCall;
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct InventoryCheck {
//!     // Client configuration
//! }
//!
//! #[async_trait]
//! impl ProtectedCall for InventoryCheck {
//!     type Input = String;
//!     type Output = u32;
//!     type Error = InventoryError;
//!
//!     fn name(&self) -> &str {
//!         "inventory"
//!     }
//!
//!     async fn call(&self, sku: String) -> Result<u32, InventoryError> {
//!         todo!()
//!     }
//! }
//! ```

pub mod mock;

pub use mock::{MockCall, MockError, MockStep};
