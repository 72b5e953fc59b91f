//! The Things Network (TTN v3) API access
//!
//! All resources live on one cluster (e.g. `eu1.cloud.thethings.network`).
//! An end device is split across four components, each with its own
//! endpoint:
//! 1. Identity server: `/api/v3/applications/{app}/devices` (registry)
//! 2. Network server: `/api/v3/ns/...` (frequency plan, MAC settings)
//! 3. Application server: `/api/v3/as/...` (identifiers, formatters)
//! 4. Join server: `/api/v3/js/...` (root keys)

pub mod client;
pub mod error;
pub mod types;

pub use client::{Component, TtnClient};
pub use error::{ApiError, Operation};
