// Public API
pub use service::{Identity, IdentityService};
pub use token::{Claims, TokenConfig};

// Internal modules
mod service;
mod token;
