pub mod generate;
pub mod google_oauth;
pub mod meetings;
pub mod notifications;
pub mod notion;
pub mod search;
