pub mod record_validator;

pub use record_validator::{is_valid_timestamp, validate_import_record};
