//! SQLite database driver implementation

mod connection;
mod decltype;
mod driver;
mod schema;

pub use connection::SqliteConnection;
pub use decltype::DeclaredType;
pub use driver::SqliteDriver;
