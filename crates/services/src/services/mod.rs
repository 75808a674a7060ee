pub mod blob_store;
pub mod cleanup;
pub mod config;
pub mod gallery;
pub mod team;
pub mod upload;
