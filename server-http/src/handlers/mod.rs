pub mod cache_ops;
pub mod health;

pub use cache_ops::{delete_blob, get_blob, hash_and_store, head_blob, list_keys, put_blob};
pub use health::health_check;
