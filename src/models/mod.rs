pub mod loaders;
pub mod place;
pub mod task;

pub use loaders::{load_urls, store_table, store_urls};
pub use place::{PlaceInfo, ResultTable, ReviewKey, ReviewRecord};
pub use task::TaskDescriptor;
