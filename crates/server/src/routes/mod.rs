pub mod admin;
pub mod gallery;
pub mod health;
pub mod team;
pub mod upload;
