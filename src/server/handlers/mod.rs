//! HTTP request handlers for the web server.

mod cases;
mod downloads;
mod response;
mod results;
mod selectors;

// Re-export handlers for use by the router
pub use cases::{listing_today, listing_tomorrow, search_cnr, search_details};
pub use downloads::{download_causelist, download_pdf};
pub use results::{export, file, history};
pub use selectors::{captcha, courts, districts, health, selectors};
