pub mod fetcher;

pub use fetcher::{FetcherConfig, ReqwestFetcher};
