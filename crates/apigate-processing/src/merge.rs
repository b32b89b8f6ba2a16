//! Create-or-update merging of derived resources
//!
//! Synthesis produces a [`Synthesized`] value holding the identity and spec a
//! derived resource must have. Applying it to an existing object overwrites
//! exactly those fields; labels, annotations, status, resourceVersion, and
//! finalizers stay as other actors left them.

use kube::Resource;

use apigate_common::policy::{AccessRule, AccessRuleSpec, VirtualService, VirtualServiceSpec};

use crate::naming::DerivedIdentity;

/// A resource kind whose identity and spec are owned by Gate processing
pub trait DerivedResource: Resource<DynamicType = ()> + Sized {
    /// Spec type written by synthesis
    type Spec;

    /// Construct a fresh resource with the given name and spec
    fn from_spec(name: &str, spec: Self::Spec) -> Self;

    /// Mutable access to the spec
    fn spec_mut(&mut self) -> &mut Self::Spec;
}

impl DerivedResource for AccessRule {
    type Spec = AccessRuleSpec;

    fn from_spec(name: &str, spec: AccessRuleSpec) -> Self {
        AccessRule::new(name, spec)
    }

    fn spec_mut(&mut self) -> &mut AccessRuleSpec {
        &mut self.spec
    }
}

impl DerivedResource for VirtualService {
    type Spec = VirtualServiceSpec;

    fn from_spec(name: &str, spec: VirtualServiceSpec) -> Self {
        VirtualService::new(name, spec)
    }

    fn spec_mut(&mut self) -> &mut VirtualServiceSpec {
        &mut self.spec
    }
}

/// Fully validated output of a synthesizer, not yet bound to an object
#[derive(Clone, Debug, PartialEq)]
pub struct Synthesized<S> {
    /// Name, namespace, and owner
    pub identity: DerivedIdentity,
    /// Desired spec
    pub spec: S,
}

impl<S> Synthesized<S> {
    /// Overwrite identity and spec on an existing object in place
    pub fn apply_to<K>(self, existing: &mut K)
    where
        K: DerivedResource<Spec = S>,
    {
        self.identity.apply(existing.meta_mut());
        *existing.spec_mut() = self.spec;
    }

    /// Build a fresh object
    pub fn into_resource<K>(self) -> K
    where
        K: DerivedResource<Spec = S>,
    {
        let Self { identity, spec } = self;
        let mut resource = K::from_spec(&identity.name, spec);
        identity.apply(resource.meta_mut());
        resource
    }

    /// Merge onto `existing` when present, otherwise build a fresh object
    pub fn upsert<K>(self, existing: Option<K>) -> K
    where
        K: DerivedResource<Spec = S>,
    {
        match existing {
            Some(mut resource) => {
                self.apply_to(&mut resource);
                resource
            }
            None => self.into_resource(),
        }
    }
}
