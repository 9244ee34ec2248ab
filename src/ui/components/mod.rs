mod input;
mod key_result;
mod task_form;

pub use key_result::KeyResult;
pub use task_form::{FormEvent, TaskDraft, TaskForm};
