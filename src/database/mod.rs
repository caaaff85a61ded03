pub mod contacts;
pub mod manager;
pub mod models;
pub mod repository;
pub mod users;

pub use contacts::{ContactStore, PgContactStore};
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{Document, DocumentStore, PgDocumentStore};
pub use users::{PgUserStore, UserStore};
