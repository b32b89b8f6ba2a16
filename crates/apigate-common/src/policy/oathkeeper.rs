//! Oathkeeper access rule types
//!
//! Typed representation of `oathkeeper.ory.sh/v1alpha1` Rule resources as
//! consumed by oathkeeper-maester. Authenticators, the authorizer, and mutators
//! all inline a single [`Handler`].

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::kube_utils::HasApiResource;

/// Name of the authorizer handler that admits every authenticated request
pub const ALLOW_HANDLER: &str = "allow";

/// A named Oathkeeper pipeline handler with optional free-form config
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Handler {
    /// Handler name (e.g., "jwt", "noop", "header")
    #[serde(rename = "handler")]
    pub name: String,

    /// Handler-specific configuration, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl Handler {
    /// Handler without configuration
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
        }
    }
}

/// Verifies request credentials
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Authenticator {
    /// Inlined handler
    #[serde(flatten)]
    pub handler: Handler,
}

/// Decides whether an authenticated subject may proceed
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Authorizer {
    /// Inlined handler
    #[serde(flatten)]
    pub handler: Handler,
}

/// Rewrites the request before it reaches the upstream
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Mutator {
    /// Inlined handler
    #[serde(flatten)]
    pub handler: Handler,
}

impl Authenticator {
    /// Authenticator wrapping the named handler
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            handler: Handler::named(name),
        }
    }
}

impl Authorizer {
    /// The authorizer that admits every authenticated request
    pub fn allow() -> Self {
        Self {
            handler: Handler::named(ALLOW_HANDLER),
        }
    }
}

impl Mutator {
    /// Mutator wrapping the named handler
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            handler: Handler::named(name),
        }
    }
}

/// Where matched requests are forwarded
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    /// Upstream URL
    pub url: String,

    /// Path prefix to strip before forwarding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_path: Option<String>,

    /// Forward the original Host header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_host: Option<bool>,
}

/// Which requests the rule applies to
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Match {
    /// Oathkeeper URL pattern (regex segments in angle brackets)
    pub url: String,

    /// Allowed HTTP methods
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Validation result reported by oathkeeper-maester
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    /// Whether the rule passed validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// Validation failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

/// Status of an access rule, owned by oathkeeper-maester
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct AccessRuleStatus {
    /// Validation result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Oathkeeper access rule
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "oathkeeper.ory.sh",
    version = "v1alpha1",
    kind = "Rule",
    root = "AccessRule",
    plural = "rules",
    namespaced,
    status = "AccessRuleStatus",
    derive = "PartialEq"
)]
pub struct AccessRuleSpec {
    /// Forwarding target
    pub upstream: Upstream,

    /// Request match
    #[serde(rename = "match")]
    pub match_: Match,

    /// Authenticators, tried in order
    #[serde(default)]
    pub authenticators: Vec<Authenticator>,

    /// Authorizer
    pub authorizer: Authorizer,

    /// Mutators, applied in order
    #[serde(default)]
    pub mutators: Vec<Mutator>,
}

impl HasApiResource for AccessRule {
    const API_VERSION: &'static str = "oathkeeper.ory.sh/v1alpha1";
    const KIND: &'static str = "Rule";
}
