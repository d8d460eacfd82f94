//! Configuration loading and validation
//!
//! Every knob has a compiled-in default mirroring the deployed crawler, so
//! a configuration file is optional.

mod parser;
mod types;
mod validation;

pub use parser::{default_config, load_config};
pub use types::{
    Config, CrawlerConfig, FetchConfig, FetchStrategy, OutputConfig, SitesConfig,
};
pub use validation::validate;
