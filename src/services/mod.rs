pub mod import;
pub mod layout;
pub mod scraper;
