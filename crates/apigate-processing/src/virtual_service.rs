//! Istio virtual service compilation
//!
//! Binds the Gate host to its mesh gateway and routes one path regex to a
//! destination in the namespace-local service registry. Each call yields a
//! single HTTP route; callers exposing several paths of one service invoke it
//! per path and decide how to aggregate the results.

use tracing::{debug, warn};

use apigate_common::crd::Gate;
use apigate_common::policy::{
    Destination, HttpMatchRequest, HttpRoute, HttpRouteDestination, PortSelector, StringMatch,
    VirtualService, VirtualServiceSpec,
};

use crate::merge::Synthesized;
use crate::naming::DerivedIdentity;
use crate::{Error, Result};

/// Destination host and port of the Gate's own service.
///
/// Short host names resolve in the virtual service's namespace, which is the
/// Gate's namespace, so this targets the same service the access rule upstream does.
pub fn service_destination(gate: &Gate) -> Result<(&str, u32)> {
    Ok((gate.service_name()?, gate.service_port()?))
}

/// Spec of the virtual service routing `path` to `destination_host:destination_port`
pub fn virtual_service_spec(
    gate: &Gate,
    destination_host: &str,
    destination_port: u32,
    path: &str,
) -> Result<VirtualServiceSpec> {
    let host = gate.service_host()?;
    let gateway = gate.gateway_binding()?;
    let owner = || gate.metadata.name.clone().unwrap_or_default();
    if destination_host.is_empty() {
        return Err(Error::precondition(owner(), "destinationHost"));
    }
    if destination_port == 0 {
        return Err(Error::precondition(owner(), "destinationPort"));
    }
    if path.is_empty() {
        return Err(Error::precondition(owner(), "path"));
    }

    Ok(VirtualServiceSpec {
        hosts: vec![host.to_string()],
        gateways: vec![gateway.to_string()],
        http: vec![HttpRoute {
            match_: vec![HttpMatchRequest {
                uri: Some(StringMatch::regex(path)),
            }],
            route: vec![HttpRouteDestination {
                destination: Destination {
                    host: destination_host.to_string(),
                    subset: None,
                    port: Some(PortSelector {
                        number: destination_port,
                    }),
                },
                weight: None,
            }],
        }],
    })
}

/// Identity and spec of the virtual service, validated in full
pub fn synthesize_virtual_service(
    gate: &Gate,
    destination_host: &str,
    destination_port: u32,
    path: &str,
) -> Result<Synthesized<VirtualServiceSpec>> {
    let synthesized = DerivedIdentity::for_gate(gate).and_then(|identity| {
        Ok(Synthesized {
            identity,
            spec: virtual_service_spec(gate, destination_host, destination_port, path)?,
        })
    });

    match &synthesized {
        Ok(s) => debug!(
            name = %s.identity.name,
            namespace = %s.identity.namespace,
            destination = %format!("{destination_host}:{destination_port}"),
            path,
            "synthesized virtual service"
        ),
        Err(e) => warn!(
            gate = %gate.metadata.name.as_deref().unwrap_or_default(),
            error = %e,
            "cannot synthesize virtual service"
        ),
    }
    synthesized
}

/// Fresh virtual service
pub fn generate_virtual_service(
    gate: &Gate,
    destination_host: &str,
    destination_port: u32,
    path: &str,
) -> Result<VirtualService> {
    Ok(synthesize_virtual_service(gate, destination_host, destination_port, path)?.into_resource())
}

/// Overwrite identity and spec of `existing`; on error it is left untouched.
pub fn prepare_virtual_service(
    gate: &Gate,
    destination_host: &str,
    destination_port: u32,
    path: &str,
    existing: &mut VirtualService,
) -> Result<()> {
    synthesize_virtual_service(gate, destination_host, destination_port, path)?
        .apply_to(existing);
    Ok(())
}

/// Merge onto `existing` when present, otherwise generate
pub fn upsert_virtual_service(
    gate: &Gate,
    destination_host: &str,
    destination_port: u32,
    path: &str,
    existing: Option<VirtualService>,
) -> Result<VirtualService> {
    Ok(
        synthesize_virtual_service(gate, destination_host, destination_port, path)?
            .upsert(existing),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::access_rule::{generate_access_rule, upstream_url};
    use crate::test_support::{orders_gate, orders_rule, GATE_UID};
    use apigate_common::policy::VirtualServiceStatus;

    const GATEWAY: &str = "kyma-gateway.kyma-system.svc.cluster.local";

    fn existing_vs() -> VirtualService {
        let mut existing = VirtualService::new("orders-api-orders", VirtualServiceSpec::default());
        existing.metadata.annotations = Some(BTreeMap::from([(
            "sidecar.istio.io/inject".to_string(),
            "false".to_string(),
        )]));
        existing.metadata.generation = Some(4);
        existing.status = Some(VirtualServiceStatus {
            observed_generation: Some(4),
            ..Default::default()
        });
        existing
    }

    #[test]
    fn spec_binds_host_gateway_and_route() {
        let spec = virtual_service_spec(&orders_gate(), "orders", 8080, "/v1/orders").unwrap();

        assert_eq!(spec.hosts, vec!["shop.example.com"]);
        assert_eq!(spec.gateways, vec![GATEWAY]);
        assert_eq!(spec.http.len(), 1);

        let http = &spec.http[0];
        assert_eq!(
            http.match_[0].uri.as_ref().and_then(|u| u.regex.as_deref()),
            Some("/v1/orders")
        );
        assert_eq!(http.route.len(), 1);
        assert_eq!(http.route[0].destination.host, "orders");
        assert_eq!(
            http.route[0].destination.port,
            Some(PortSelector { number: 8080 })
        );
    }

    #[test]
    fn generated_virtual_service_has_identity_and_owner() {
        let vs = generate_virtual_service(&orders_gate(), "orders", 8080, "/.*").unwrap();

        assert_eq!(vs.metadata.name.as_deref(), Some("orders-api-orders"));
        assert_eq!(vs.metadata.namespace.as_deref(), Some("shop"));

        let owners = vs.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "orders-api");
        assert_eq!(owners[0].uid, GATE_UID);
        assert_eq!(owners[0].controller, Some(true));
    }

    #[test]
    fn service_destination_pairs_with_access_rule_upstream() {
        let gate = orders_gate();
        let (host, port) = service_destination(&gate).unwrap();

        let vs = generate_virtual_service(&gate, host, port, "/v1/orders").unwrap();
        let rule = generate_access_rule(&gate, &orders_rule(), &[]).unwrap();

        let destination = &vs.spec.http[0].route[0].destination;
        assert_eq!(
            rule.spec.upstream.url,
            upstream_url(&destination.host, "shop", destination.port.as_ref().unwrap().number)
        );
        assert_eq!(vs.metadata.name, rule.metadata.name);
    }

    #[test]
    fn prepare_matches_generate_and_keeps_foreign_fields() {
        let gate = orders_gate();
        let generated = generate_virtual_service(&gate, "orders", 8080, "/v1/orders").unwrap();

        let mut existing = existing_vs();
        prepare_virtual_service(&gate, "orders", 8080, "/v1/orders", &mut existing).unwrap();

        assert_eq!(existing.spec, generated.spec);
        assert_eq!(existing.metadata.name, generated.metadata.name);
        assert_eq!(existing.metadata.namespace, generated.metadata.namespace);
        assert_eq!(
            existing.metadata.owner_references,
            generated.metadata.owner_references
        );
        assert_eq!(
            existing.metadata.annotations.unwrap()["sidecar.istio.io/inject"],
            "false"
        );
        assert_eq!(existing.metadata.generation, Some(4));
        assert_eq!(existing.status.unwrap().observed_generation, Some(4));
    }

    #[test]
    fn prepare_replaces_previous_routes() {
        let gate = orders_gate();
        let mut existing = generate_virtual_service(&gate, "orders", 8080, "/v1/orders").unwrap();

        prepare_virtual_service(&gate, "orders-v2", 9090, "/v2/orders", &mut existing).unwrap();

        assert_eq!(existing.spec.http.len(), 1);
        assert_eq!(existing.spec.http[0].route[0].destination.host, "orders-v2");
    }

    #[test]
    fn upsert_degenerates_to_generate() {
        let gate = orders_gate();
        assert_eq!(
            upsert_virtual_service(&gate, "orders", 8080, "/v1/orders", None).unwrap(),
            generate_virtual_service(&gate, "orders", 8080, "/v1/orders").unwrap()
        );
    }

    #[test]
    fn missing_gate_fields_fail_without_touching_existing() {
        let clear: [fn(&mut Gate); 4] = [
            |g| g.spec.service.name = None,
            |g| g.spec.service.host = None,
            |g| g.spec.gateway = None,
            |g| g.metadata.namespace = None,
        ];

        for clear_field in clear {
            let mut gate = orders_gate();
            clear_field(&mut gate);

            let mut existing = existing_vs();
            let err = prepare_virtual_service(&gate, "orders", 8080, "/v1/orders", &mut existing)
                .unwrap_err();

            assert!(err.is_precondition());
            assert_eq!(existing, existing_vs());
        }
    }

    #[test]
    fn missing_port_fails_service_destination() {
        let mut gate = orders_gate();
        gate.spec.service.port = None;

        let err = service_destination(&gate).unwrap_err();
        assert_eq!(err.field(), Some("spec.service.port"));
    }

    #[test]
    fn invalid_destination_arguments_are_rejected() {
        let gate = orders_gate();

        let cases = [
            ("", 8080, "/v1/orders", "destinationHost"),
            ("orders", 0, "/v1/orders", "destinationPort"),
            ("orders", 8080, "", "path"),
        ];
        for (host, port, path, field) in cases {
            let err = generate_virtual_service(&gate, host, port, path).unwrap_err();
            assert_eq!(err.field(), Some(field));
        }
    }
}
