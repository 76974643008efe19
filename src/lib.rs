//! ratebook - game-currency conversion rate catalog.
//!
//! Browses pages stored by a scraping/extraction service, shows the tables
//! found on them and curates the conversion rates derived from those pages.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod store;
