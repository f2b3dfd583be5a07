//! Daraz Nepal product listing scraper.
//!
//! Scrapes category listing pages from daraz.com.np into normalized product
//! records, either from the command line (CSV output) or through a small
//! HTTP API.

pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod scrapers;
pub mod server;
