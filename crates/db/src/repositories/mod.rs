pub mod memory;
pub mod redis_session_repo;
pub mod session_repo;
pub mod user_repo;

pub use memory::{MemorySessionRepo, MemoryUserRepo};
pub use redis_session_repo::RedisSessionRepo;
pub use session_repo::SessionRepo;
pub use user_repo::{PgUserRepo, UserRepo};
