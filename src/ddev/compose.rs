//! # Compose Services
//!
//! Renders `docker-compose.platformsh-services.yaml`, an alternative to
//! installing add-ons that runs the service containers directly.

use crate::constants::GENERATED_MARKER;
use crate::ddev::yaml::{render, YamlNode};
use crate::mapping::ResolvedService;
use indexmap::IndexMap;

/// Render one container per distinct service host
///
/// Returns `None` when there are no services. When two relationships share a
/// container name (for example elasticsearch and opensearch) the first wins.
#[must_use]
pub fn render_compose_services(services: &[ResolvedService]) -> Option<String> {
    let mut containers: IndexMap<&str, &ResolvedService> = IndexMap::new();
    for service in services {
        containers.entry(service.mapping.hostname).or_insert(service);
    }
    if containers.is_empty() {
        return None;
    }

    let definitions = containers
        .into_iter()
        .map(|(host, service)| (host, container_node(host, service)));

    let document = YamlNode::map([("services", YamlNode::map(definitions))]);
    Some(format!(
        "{GENERATED_MARKER}\n# Platform.sh services configuration\n{}",
        render(&document)
    ))
}

fn container_node(host: &str, service: &ResolvedService) -> YamlNode {
    let mapping = service.mapping;
    let version = service.image_version();

    let image = match mapping.platform_type {
        "redis" | "redis-persistent" | "memcached" => format!("{}:{version}-alpine", mapping.image),
        _ => format!("{}:{version}", mapping.image),
    };

    let mut expose = vec![YamlNode::Int(i64::from(mapping.port))];
    let mut pairs = vec![
        (
            "container_name".to_string(),
            YamlNode::plain(format!("ddev-${{DDEV_SITENAME}}-{host}")),
        ),
        ("image".to_string(), YamlNode::plain(image)),
        (
            "labels".to_string(),
            YamlNode::map([
                ("com.ddev.site-name", YamlNode::plain("${DDEV_SITENAME}")),
                ("com.ddev.approot", YamlNode::plain("${DDEV_APPROOT}")),
            ]),
        ),
        ("restart".to_string(), YamlNode::quoted("no")),
    ];

    if host == "elasticsearch" {
        expose.push(YamlNode::Int(9300));
        pairs.push((
            "environment".to_string(),
            YamlNode::Seq(vec![
                YamlNode::plain("discovery.type=single-node"),
                YamlNode::plain("ES_JAVA_OPTS=-Xms512m -Xmx512m"),
            ]),
        ));
    }

    pairs.push(("expose".to_string(), YamlNode::Seq(expose)));
    pairs.push((
        "volumes".to_string(),
        YamlNode::Seq(vec![YamlNode::quoted(
            "ddev-global-cache:/mnt/ddev-global-cache",
        )]),
    ));

    if mapping.platform_type == "redis-persistent" {
        pairs.push((
            "command".to_string(),
            YamlNode::plain("redis-server --appendonly yes"),
        ));
    }

    YamlNode::Map(pairs)
}
