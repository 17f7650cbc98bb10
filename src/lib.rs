pub mod binding;
pub mod config;
pub mod controller;
pub mod persistence;
