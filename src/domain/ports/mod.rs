mod dataset_decoder;
mod dataset_fetcher;
mod geo_dataset;

pub use dataset_decoder::DatasetDecoder;
pub use dataset_fetcher::DatasetFetcher;
pub use geo_dataset::GeoDataset;
