pub mod config;
pub mod csv_reader;
pub mod database;
pub mod file_storage;
pub mod progress_tracker;
pub mod telemetry;
