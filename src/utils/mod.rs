pub mod logging;

pub use logging::{simplify_url, truncate_text};
