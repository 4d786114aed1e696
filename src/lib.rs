// src/lib.rs

//! findaca library

pub mod catalog;
pub mod driver;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
