pub mod config;
pub mod service;

pub use config::HttpServiceConfig;
pub use service::HttpResultsService;
