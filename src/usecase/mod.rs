pub mod import_completions;
pub mod update_completion_date;

pub use import_completions::{
    ImportProcessor, ImportProcessorError, ProcessorState, RunReport, REQUIRED_HEADERS,
};
pub use update_completion_date::UpdateCompletionDateUseCase;
