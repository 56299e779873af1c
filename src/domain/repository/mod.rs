pub mod completion_repository;
pub mod course_repository;
pub mod user_repository;

pub use completion_repository::CompletionRepository;
pub use course_repository::CourseRepository;
pub use user_repository::UserRepository;
