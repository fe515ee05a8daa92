// TodoStore - Todo list state container with local key-value persistence

pub mod filter;
pub mod storage;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use filter::FilterMode;
pub use storage::{DARK_MODE_KEY, MemoryStorage, SqliteStorage, Storage, TODOS_KEY};
pub use store::TodoStore;
pub use todo::{CompletionStats, Todo, now_ms};
