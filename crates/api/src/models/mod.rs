//! Domain models backing the API.
//!
//! Models are plain structs produced by the repositories; wire DTOs that
//! differ from the stored shape live next to their route handlers.

pub mod address;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use address::UserAddress;
pub use order::{AddressSnapshot, Order, OrderItem, TrackingEvent};
pub use payment::Payment;
pub use product::Product;
pub use user::{AdminRecord, User};
