mod models;
mod repository;
mod scraper;
mod scraper_error;

pub use scraper::{run_marketplace_scrape, ScrapeSummary};
pub use scraper_error::ScraperError;
