pub mod filesystem;
pub mod web;
