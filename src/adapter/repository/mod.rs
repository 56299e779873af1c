pub mod completion_in_memory;
pub mod completion_postgres;

pub use completion_in_memory::InMemoryCompletionStore;
pub use completion_postgres::CompletionPostgresRepository;
