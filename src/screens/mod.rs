//! In-process view models for the admin screens. Each screen owns the rows
//! it displays and rebuilds them from the database after every mutation.

pub mod router;
pub mod songs;
pub mod table;
pub mod users;

pub use router::{Router, Screen};
pub use songs::SongsScreen;
pub use users::UsersScreen;
