//! Common types for Gate processing: CRDs, derived resources, errors, and telemetry

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod policy;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// DNS suffix of in-cluster service addresses
pub const CLUSTER_LOCAL_DOMAIN: &str = "svc.cluster.local";
