pub mod completion;
pub mod course;
pub mod import_row;
pub mod revert_log;
pub mod row_outcome;
pub mod run_summary;
pub mod user;
