pub mod import;
pub mod notion;
pub mod openai;
