//! Requests through a running gateway to local backends.

use std::collections::HashMap;

use lb_gateway::config::{GatewayConfig, RouteConfig};

mod common;

fn lb_route(instances: String) -> RouteConfig {
    let mut route = RouteConfig::new("just-cb", "lb://my-lb", vec!["/just-cb/**".into()]);
    route.strip_prefix = 1;
    route.instances = Some(instances);
    route
}

#[tokio::test]
async fn test_first_request_registers_route_instances() {
    let b1 = common::start_backend("b1").await;
    let b2 = common::start_backend("b2").await;
    let b3 = common::start_backend("b3").await;

    let mut config = GatewayConfig::default();
    config
        .routes
        .push(lb_route(common::instance_list(&[&b1, &b2, &b3])));
    let gateway = common::start_gateway(config).await;

    assert!(gateway.registry.get_instances("my-lb").is_empty());

    let client = common::client();
    let res = client.get(gateway.url("/just-cb/hello")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let instances = gateway.registry.get_instances("my-lb");
    let ids: Vec<(&str, u16)> = instances
        .iter()
        .map(|i| (i.instance_id(), i.port()))
        .collect();
    assert_eq!(
        ids,
        vec![
            ("my-lb-1", b1.addr.port()),
            ("my-lb-2", b2.addr.port()),
            ("my-lb-3", b3.addr.port()),
        ]
    );
    assert!(instances.iter().all(|i| !i.secure()));

    for _ in 0..5 {
        client.get(gateway.url("/just-cb/hello")).send().await.unwrap();
    }
    assert_eq!(gateway.registry.get_instances("my-lb").len(), 3);
}

#[tokio::test]
async fn test_round_robin_across_healthy_instances() {
    let b1 = common::start_backend("b1").await;
    let b2 = common::start_backend("b2").await;

    let mut config = GatewayConfig::default();
    config.routes.push(lb_route(common::instance_list(&[&b1, &b2])));
    let gateway = common::start_gateway(config).await;

    let client = common::client();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for _ in 0..4 {
        let body = client
            .get(gateway.url("/just-cb/hello"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        *seen.entry(body).or_default() += 1;
    }

    assert_eq!(seen.get("b1"), Some(&2));
    assert_eq!(seen.get("b2"), Some(&2));
}

#[tokio::test]
async fn test_unhealthy_instance_is_skipped_but_stays_registered() {
    let b1 = common::start_backend("b1").await;
    let b2 = common::start_backend("b2").await;
    b2.set_up(false);

    let mut config = GatewayConfig::default();
    config.routes.push(lb_route(common::instance_list(&[&b1, &b2])));
    let gateway = common::start_gateway(config).await;

    let client = common::client();
    for _ in 0..4 {
        let body = client
            .get(gateway.url("/just-cb/hello"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "b1");
    }

    assert_eq!(b2.hits(), 0);
    assert!(b2.health_hits() >= 4, "every request probes every instance");
    assert_eq!(gateway.registry.get_instances("my-lb").len(), 2);

    // Back up: selected again on the next requests.
    b2.set_up(true);
    let mut bodies = Vec::new();
    for _ in 0..2 {
        bodies.push(
            client
                .get(gateway.url("/just-cb/hello"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap(),
        );
    }
    assert!(bodies.contains(&"b2".to_string()));
}

#[tokio::test]
async fn test_no_healthy_instance_without_breaker_is_503() {
    let b1 = common::start_backend("b1").await;
    b1.set_up(false);

    let mut config = GatewayConfig::default();
    config.routes.push(lb_route(common::instance_list(&[&b1])));
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .get(gateway.url("/just-cb/hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "no available instance for service `my-lb`");
}

#[tokio::test]
async fn test_direct_route_and_unmatched_path() {
    let backend = common::start_backend("direct").await;

    let mut config = GatewayConfig::default();
    config.routes.push(RouteConfig::new(
        "direct",
        format!("http://{}", backend.addr),
        vec!["/direct/**".into()],
    ));
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let res = client.get(gateway.url("/direct/x?y=1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "direct");
    assert_eq!(backend.health_hits(), 0);
    assert!(gateway.registry.is_empty());

    let res = client.get(gateway.url("/elsewhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_admin_lists_registered_instances() {
    let b1 = common::start_backend("b1").await;

    let mut config = GatewayConfig::default();
    config.routes.push(lb_route(common::instance_list(&[&b1])));
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let services: serde_json::Value = client
        .get(gateway.admin_url("/service-instances"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(services, serde_json::json!([]));

    client.get(gateway.url("/just-cb/hello")).send().await.unwrap();

    let instances: serde_json::Value = client
        .get(gateway.admin_url("/service-instances/my-lb"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(instances[0]["instanceId"], "my-lb-1");
    assert_eq!(instances[0]["serviceId"], "my-lb");
    assert_eq!(instances[0]["port"], b1.addr.port());
}
