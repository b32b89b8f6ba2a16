//! Oathkeeper access rule compilation
//!
//! Maps one Gate rule to an Oathkeeper `Rule`:
//!
//! - upstream: the Gate's service through its cluster-local address
//! - match: `<http|https>://{host}<{path}>` plus the rule's methods
//! - authenticators: resolved by the caller from the rule's access strategies
//! - authorizer: always `allow`; denial happens in the authenticator chain
//! - mutators: the rule's mutators
//!
//! List order is preserved everywhere, since Oathkeeper evaluates handlers in order.

use tracing::{debug, warn};

use apigate_common::crd::{Gate, GateRule};
use apigate_common::policy::{
    AccessRule, AccessRuleSpec, Authenticator, Authorizer, Match, Upstream,
};
use apigate_common::CLUSTER_LOCAL_DOMAIN;

use crate::merge::Synthesized;
use crate::naming::DerivedIdentity;
use crate::{Error, Result};

/// Cluster-local URL of a service port
pub fn upstream_url(service: &str, namespace: &str, port: u32) -> String {
    format!("http://{service}.{namespace}.{CLUSTER_LOCAL_DOMAIN}:{port}")
}

/// Oathkeeper match URL accepting either scheme for `host` and `path`.
///
/// Both are substituted verbatim; `path` is interpreted by Oathkeeper as a regex.
pub fn match_url(host: &str, path: &str) -> String {
    format!("<http|https>://{host}<{path}>")
}

/// Spec of the access rule for `rule`
pub fn access_rule_spec(
    gate: &Gate,
    rule: &GateRule,
    authenticators: &[Authenticator],
) -> Result<AccessRuleSpec> {
    let service = gate.service_name()?;
    let namespace = gate.gate_namespace()?;
    let port = gate.service_port()?;
    let host = gate.service_host()?;
    if rule.path.is_empty() {
        return Err(Error::precondition(
            gate.gate_name().unwrap_or_default(),
            "spec.rules[].path",
        ));
    }

    Ok(AccessRuleSpec {
        upstream: Upstream {
            url: upstream_url(service, namespace, port),
            ..Default::default()
        },
        match_: Match {
            url: match_url(host, &rule.path),
            methods: rule.methods.clone(),
        },
        authenticators: authenticators.to_vec(),
        authorizer: Authorizer::allow(),
        mutators: rule.mutators.clone(),
    })
}

/// Identity and spec of the access rule for `rule`, validated in full
pub fn synthesize_access_rule(
    gate: &Gate,
    rule: &GateRule,
    authenticators: &[Authenticator],
) -> Result<Synthesized<AccessRuleSpec>> {
    let synthesized = DerivedIdentity::for_gate(gate).and_then(|identity| {
        Ok(Synthesized {
            identity,
            spec: access_rule_spec(gate, rule, authenticators)?,
        })
    });

    match &synthesized {
        Ok(s) => debug!(
            name = %s.identity.name,
            namespace = %s.identity.namespace,
            path = %rule.path,
            authenticators = authenticators.len(),
            "synthesized access rule"
        ),
        Err(e) => warn!(
            gate = %gate.metadata.name.as_deref().unwrap_or_default(),
            error = %e,
            "cannot synthesize access rule"
        ),
    }
    synthesized
}

/// Fresh access rule for `rule`
pub fn generate_access_rule(
    gate: &Gate,
    rule: &GateRule,
    authenticators: &[Authenticator],
) -> Result<AccessRule> {
    Ok(synthesize_access_rule(gate, rule, authenticators)?.into_resource())
}

/// Overwrite identity and spec of `existing` with the access rule for `rule`.
///
/// On error `existing` is left untouched.
pub fn prepare_access_rule(
    gate: &Gate,
    rule: &GateRule,
    authenticators: &[Authenticator],
    existing: &mut AccessRule,
) -> Result<()> {
    synthesize_access_rule(gate, rule, authenticators)?.apply_to(existing);
    Ok(())
}

/// Merge onto `existing` when present, otherwise generate
pub fn upsert_access_rule(
    gate: &Gate,
    rule: &GateRule,
    authenticators: &[Authenticator],
    existing: Option<AccessRule>,
) -> Result<AccessRule> {
    Ok(synthesize_access_rule(gate, rule, authenticators)?.upsert(existing))
}
