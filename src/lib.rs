//! Directory service for geolocated running courses.

pub mod config;
pub mod coords;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod repository;
pub mod routes;
pub mod validation;

pub use error::{Error, Result};
