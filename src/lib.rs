// Library for tests to access modules

pub mod aggregator;
pub mod charts;
pub mod config;
pub mod csv_parser;
pub mod dashboard;
pub mod data_source;
pub mod error;
pub mod models;
pub mod routes;
pub mod sync_poller;
pub mod sync_worker;
pub mod version;
