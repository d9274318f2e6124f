//! Client-side state kept in sync with the storage port.

/// Authenticated identity and bearer token.
pub mod session;
/// Shopping cart with stock-bounded quantities.
pub mod cart;

pub use cart::CartStore;
pub use session::SessionStore;
