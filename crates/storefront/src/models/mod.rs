//! Domain models owned by the stores.

pub mod session;

pub use session::CurrentUser;
