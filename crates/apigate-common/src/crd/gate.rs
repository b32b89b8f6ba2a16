//! Gate CRD types
//!
//! A `Gate` exposes one in-cluster service through a mesh gateway and declares
//! per-path access rules for it. The processing crate derives an Oathkeeper
//! access rule and an Istio virtual service from each Gate.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::policy::oathkeeper::{Authenticator, Mutator};
use crate::{Error, Result};

// =============================================================================
// Service
// =============================================================================

/// The in-cluster service a Gate exposes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Service name in the Gate's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Externally visible host (e.g., "orders.example.com")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Service port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

// =============================================================================
// Rule
// =============================================================================

/// One exposed path with its access requirements
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GateRule {
    /// Path pattern, substituted verbatim into the access rule match URL
    pub path: String,

    /// Allowed HTTP methods, in declaration order
    #[serde(default)]
    pub methods: Vec<String>,

    /// OAuth2 scopes required to reach the path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    /// Request mutators applied after authentication
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutators: Vec<Mutator>,

    /// Authenticators accepted for the path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_strategies: Vec<Authenticator>,
}

// =============================================================================
// Status
// =============================================================================

/// Lifecycle phase of a Gate
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub enum GatePhase {
    /// Derived resources have not been written yet
    #[default]
    Pending,
    /// Access rules and virtual service are in place
    Ready,
    /// Derivation or persistence failed
    Failed,
}

impl std::fmt::Display for GatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Ready => write!(f, "Ready"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Status written by the controller that reconciles Gates
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    /// Current phase
    #[serde(default)]
    pub phase: GatePhase,

    /// Human-readable detail for the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the spec the status describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// =============================================================================
// CRD
// =============================================================================

/// Exposes a service through a gateway with per-path access rules
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.kyma-project.io",
    version = "v2alpha1",
    kind = "Gate",
    plural = "gates",
    namespaced,
    status = "GateStatus",
    printcolumn = r#"{"name":"Host","type":"string","jsonPath":".spec.service.host"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GateSpec {
    /// Exposed service
    #[serde(default)]
    pub service: ServiceSpec,

    /// Mesh gateway the virtual service binds to (e.g., "kyma-gateway.kyma-system.svc.cluster.local")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    /// Exposed paths, in declaration order
    #[serde(default)]
    pub rules: Vec<GateRule>,
}

// =============================================================================
// Required-field accessors
// =============================================================================

impl Gate {
    /// Gate name, required for derived names and owner references
    pub fn gate_name(&self) -> Result<&str> {
        let name = self.metadata.name.as_deref();
        required(name, self, "metadata.name")
    }

    /// Gate namespace; every derived resource lives here
    pub fn gate_namespace(&self) -> Result<&str> {
        let namespace = self.metadata.namespace.as_deref();
        required(namespace, self, "metadata.namespace")
    }

    /// Name of the exposed service
    pub fn service_name(&self) -> Result<&str> {
        required(self.spec.service.name.as_deref(), self, "spec.service.name")
    }

    /// Externally visible host of the exposed service
    pub fn service_host(&self) -> Result<&str> {
        required(self.spec.service.host.as_deref(), self, "spec.service.host")
    }

    /// Port of the exposed service. Port 0 cannot be addressed and counts as unset.
    pub fn service_port(&self) -> Result<u32> {
        self.spec
            .service
            .port
            .filter(|port| *port != 0)
            .ok_or_else(|| Error::precondition(self.name_any(), "spec.service.port"))
    }

    /// Mesh gateway binding
    pub fn gateway_binding(&self) -> Result<&str> {
        required(self.spec.gateway.as_deref(), self, "spec.gateway")
    }
}

fn required<'a>(value: Option<&'a str>, gate: &Gate, field: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::precondition(gate.name_any(), field))
}
