pub mod json_loader;

pub use json_loader::{load_urls, normalize_json_filename, store_table, store_urls};
