#![allow(clippy::useless_conversion)]

pub mod gallery_image;
pub mod team_member;
