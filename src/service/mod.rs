pub mod email_template;
pub mod google_import;
pub mod notion_import;
