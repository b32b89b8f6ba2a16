//! Identity of derived resources
//!
//! Every resource compiled from a Gate is named `{gate}-{service}`, lives in
//! the Gate's namespace, and carries a single controller owner reference back
//! to the Gate so the platform garbage-collects it with its owner.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;

use apigate_common::crd::Gate;

use crate::Result;

/// Controller owner reference pointing at the Gate.
///
/// Absent name or uid are copied as empty strings; the API server rejects
/// such references, not this function.
pub fn owner_reference(gate: &Gate) -> OwnerReference {
    OwnerReference {
        api_version: Gate::api_version(&()).into_owned(),
        kind: Gate::kind(&()).into_owned(),
        name: gate.metadata.name.clone().unwrap_or_default(),
        uid: gate.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Name shared by all resources derived from the Gate
pub fn derived_name(gate: &Gate) -> Result<String> {
    Ok(format!("{}-{}", gate.gate_name()?, gate.service_name()?))
}

/// Name, namespace, and owner of a derived resource
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedIdentity {
    /// `{gate}-{service}`
    pub name: String,
    /// The Gate's namespace
    pub namespace: String,
    /// Controller reference to the Gate
    pub owner_reference: OwnerReference,
}

impl DerivedIdentity {
    /// Derive the identity for resources compiled from `gate`
    pub fn for_gate(gate: &Gate) -> Result<Self> {
        Ok(Self {
            name: derived_name(gate)?,
            namespace: gate.gate_namespace()?.to_string(),
            owner_reference: owner_reference(gate),
        })
    }

    /// Overwrite name, namespace, and owner references; other metadata is kept.
    pub fn apply(self, meta: &mut ObjectMeta) {
        meta.name = Some(self.name);
        meta.namespace = Some(self.namespace);
        meta.owner_references = Some(vec![self.owner_reference]);
    }
}

/// Metadata for derived objects that need no spec
pub fn object_meta(gate: &Gate) -> Result<ObjectMeta> {
    let mut meta = ObjectMeta::default();
    DerivedIdentity::for_gate(gate)?.apply(&mut meta);
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::test_support::{orders_gate, GATE_UID};

    #[test]
    fn owner_reference_points_at_gate() {
        let oref = owner_reference(&orders_gate());

        assert_eq!(oref.api_version, "gateway.kyma-project.io/v2alpha1");
        assert_eq!(oref.kind, "Gate");
        assert_eq!(oref.name, "orders-api");
        assert_eq!(oref.uid, GATE_UID);
        assert_eq!(oref.controller, Some(true));
        assert_eq!(oref.block_owner_deletion, Some(true));
    }

    #[test]
    fn owner_reference_without_uid_is_still_a_controller() {
        let mut gate = orders_gate();
        gate.metadata.uid = None;

        let oref = owner_reference(&gate);
        assert_eq!(oref.uid, "");
        assert_eq!(oref.controller, Some(true));
    }

    #[test]
    fn derived_name_joins_gate_and_service() {
        assert_eq!(derived_name(&orders_gate()).unwrap(), "orders-api-orders");
    }

    #[test]
    fn derived_identity_is_deterministic() {
        let gate = orders_gate();

        let first = DerivedIdentity::for_gate(&gate).unwrap();
        let second = DerivedIdentity::for_gate(&gate).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.namespace, "shop");
    }

    #[test]
    fn missing_service_name_is_a_precondition_violation() {
        let mut gate = orders_gate();
        gate.spec.service.name = None;

        let err = derived_name(&gate).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(err.field(), Some("spec.service.name"));
        assert!(object_meta(&gate).is_err());
    }

    #[test]
    fn object_meta_carries_identity_only() {
        let meta = object_meta(&orders_gate()).unwrap();

        assert_eq!(meta.name.as_deref(), Some("orders-api-orders"));
        assert_eq!(meta.namespace.as_deref(), Some("shop"));
        assert_eq!(meta.owner_references.as_ref().map(Vec::len), Some(1));
        assert!(meta.labels.is_none());
        assert!(meta.annotations.is_none());
    }

    #[test]
    fn apply_replaces_owners_and_keeps_other_metadata() {
        let mut meta = ObjectMeta {
            name: Some("stale".to_string()),
            annotations: Some(BTreeMap::from([(
                "team".to_string(),
                "payments".to_string(),
            )])),
            resource_version: Some("42".to_string()),
            owner_references: Some(vec![OwnerReference::default(), OwnerReference::default()]),
            ..Default::default()
        };

        DerivedIdentity::for_gate(&orders_gate())
            .unwrap()
            .apply(&mut meta);

        assert_eq!(meta.name.as_deref(), Some("orders-api-orders"));
        assert_eq!(meta.owner_references.unwrap().len(), 1);
        assert_eq!(meta.resource_version.as_deref(), Some("42"));
        assert_eq!(meta.annotations.unwrap()["team"], "payments");
    }
}
