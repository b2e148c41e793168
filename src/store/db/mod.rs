mod http;
mod mem;

pub use http::HttpStore;
pub use mem::MemStore;
