#![doc = "vimeo-migrate-core: core logic library for vimeo-migrate."]

//! This crate contains the migration pipeline, the Vimeo API client and the data models it
//! exchanges. Command-line parsing and config-file loading live in the `vimeo-migrate` crate.
//!
//! # Usage
//! Build a [`config::MigrationConfig`], construct one [`client::VimeoClient`] per account and
//! call [`migrate::migrate`].

pub mod client;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod listing;
pub mod migrate;
pub mod resolve;
pub mod retry;
pub mod upload;
