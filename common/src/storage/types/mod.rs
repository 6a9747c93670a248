pub mod chunk;
pub mod document;
pub mod flexible_id;
pub mod llm_fields;
pub mod payload;
pub mod progress_record;
