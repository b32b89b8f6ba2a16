//! Shared Kubernetes helpers for Gate and derived resources
//!
//! Derived resources are addressed by a controller through the dynamic API,
//! so every kind produced here carries its apiVersion/kind as compile-time
//! constants via [`HasApiResource`].

use kube::discovery::ApiResource;

// =============================================================================
// HasApiResource Trait
// =============================================================================

/// Trait for types that have a known API group, version, and kind.
///
/// # Example
/// ```ignore
/// impl HasApiResource for VirtualService {
///     const API_VERSION: &'static str = "networking.istio.io/v1alpha3";
///     const KIND: &'static str = "VirtualService";
/// }
///
/// let ar = VirtualService::api_resource();
/// ```
pub trait HasApiResource {
    /// Full API version (e.g., "oathkeeper.ory.sh/v1alpha1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "Rule")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants.
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from an apiVersion string and kind.
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Split an apiVersion into (group, version).
///
/// Core resources have no group:
/// ```
/// use apigate_common::kube_utils::parse_api_version;
///
/// let (group, version) = parse_api_version("v1");
/// assert_eq!(group, "");
/// assert_eq!(version, "v1");
/// ```
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Pluralize a Kubernetes resource kind using the simple English rules the
/// API server applies to CRDs without an explicit plural.
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}
