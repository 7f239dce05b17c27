mod response;
mod store;

pub use response::{
    Category, Clock, ResponseCache, SystemClock, TtlConfig, UnknownCategory,
};
pub use store::{DiskStore, KvStore, MemoryStore};
