//! Security classification of Gate rules

use apigate_common::crd::GateRule;

/// Whether a rule needs more than pass-through access.
///
/// Only the presence of scopes or mutators matters; their content is not
/// inspected. The result is advisory for the controller choosing default
/// authenticators and is not consumed by the synthesizers.
pub fn is_secured(rule: &GateRule) -> bool {
    !rule.scopes.is_empty() || !rule.mutators.is_empty()
}
