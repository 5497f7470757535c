pub mod memory;
pub mod user_repo;

pub use memory::MemoryUserStore;
pub use user_repo::PgUserStore;
