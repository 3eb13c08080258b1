// src/mess/mod.rs
pub mod cache;
pub mod extract;
pub mod messit_client;
pub mod options;
pub mod source;

pub use cache::MenuPageCache;
pub use messit_client::MessitClient;
pub use options::default_mess_options;
pub use source::{ApiMenuSource, MenuFetcher, MenuSource, ScrapeMenuSource};
