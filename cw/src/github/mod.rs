//! Hosting platform client
//!
//! The [`GitHost`] trait is the seam between the poller and the platform;
//! [`GithubClient`] implements it over the GitHub REST API.

pub mod client;
mod error;
mod rest;

pub use client::GitHost;
pub use error::GitHostError;
pub use rest::GithubClient;
