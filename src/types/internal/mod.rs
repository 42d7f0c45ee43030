pub mod claims;
pub mod identity;

pub use claims::{Claims, TokenPurpose};
pub use identity::{permission, Identity};
