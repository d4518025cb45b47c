pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod report;
pub mod store;
pub mod summary;
pub mod sync;
pub mod util;
