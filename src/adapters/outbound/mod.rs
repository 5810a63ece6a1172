mod file_fetcher;
mod gzip;
mod maxmind_dataset;
mod maxmind_fetcher;

pub use file_fetcher::FileFetcher;
pub use maxmind_dataset::{MaxMindDataset, MaxMindDecoder};
pub use maxmind_fetcher::{MaxMindFetcher, DEFAULT_UPDATE_URL};
