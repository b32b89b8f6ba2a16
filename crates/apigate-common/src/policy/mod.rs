//! Derived resource types
//!
//! - [`oathkeeper`]: access rules (authentication, authorization, mutation)
//! - [`istio`]: virtual services (host, gateway binding, path routing)

pub mod istio;
pub mod oathkeeper;

pub use istio::{
    Destination, HttpMatchRequest, HttpRoute, HttpRouteDestination, IstioCondition, PortSelector,
    StringMatch, VirtualService, VirtualServiceSpec, VirtualServiceStatus,
};
pub use oathkeeper::{
    AccessRule, AccessRuleSpec, AccessRuleStatus, Authenticator, Authorizer, Handler, Match,
    Mutator, Upstream, Validation, ALLOW_HANDLER,
};
