//! Gate processing for the API gateway controller
//!
//! Compiles a `Gate` into the resources that expose its service:
//!
//! - **Access rules**: Oathkeeper `Rule`s wiring authenticators, the authorizer,
//!   and mutators in front of the in-cluster upstream, one per Gate rule
//! - **Virtual services**: Istio `VirtualService`s binding the Gate host to its
//!   gateway and routing a path to the service
//!
//! Pure compilation crate — no controller logic. Every output is a function of
//! its inputs; the `prepare_*` variants merge onto an already-persisted object
//! and leave fields owned by other actors alone.

pub mod access_rule;
pub mod merge;
pub mod naming;
pub mod security;
pub mod virtual_service;

pub use access_rule::{
    access_rule_spec, generate_access_rule, match_url, prepare_access_rule, synthesize_access_rule,
    upsert_access_rule, upstream_url,
};
pub use merge::{DerivedResource, Synthesized};
pub use naming::{derived_name, object_meta, owner_reference, DerivedIdentity};
pub use security::is_secured;
pub use virtual_service::{
    generate_virtual_service, prepare_virtual_service, service_destination,
    synthesize_virtual_service, upsert_virtual_service, virtual_service_spec,
};

pub(crate) use apigate_common::{Error, Result};
