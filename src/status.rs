//! Parsing of the daemon's `/_status?format=xml` document.

use roxmltree::{Document, Node};

use crate::errors::ClientError;
use crate::service::{Service, ServiceKind};

/// Parses a full status document into service snapshots, in document order.
///
/// Malformed XML and `<service>` elements missing `<name>` or a numeric
/// `<monitor>` are parse errors. Everything else is tolerated: unknown type
/// codes map to [`ServiceKind::Unknown`] and an absent `<pendingaction>`
/// (older daemons) counts as no pending action.
pub fn parse_status_document(xml: &str) -> Result<Vec<Service>, ClientError> {
    let document =
        Document::parse(xml).map_err(|err| ClientError::parse(format!("malformed XML: {err}")))?;

    document
        .root()
        .descendants()
        .filter(|node| node.has_tag_name("service"))
        .map(parse_service)
        .collect()
}

fn parse_service(node: Node<'_, '_>) -> Result<Service, ClientError> {
    let name = child_text(node, "name")
        .ok_or_else(|| ClientError::parse("service element has no <name>"))?
        .trim()
        .to_string();

    let kind = ServiceKind::from_code(
        node.attribute("type")
            .and_then(|value| value.trim().parse::<u32>().ok()),
    );

    let monitor_state = child_text(node, "monitor")
        .ok_or_else(|| ClientError::parse(format!("service '{name}' has no <monitor>")))?
        .trim()
        .parse::<u8>()
        .map_err(|_| ClientError::parse(format!("service '{name}' has a non-numeric <monitor>")))?;

    let pending_action = match child_text(node, "pendingaction") {
        None => false,
        Some(text) => {
            let code = text.trim().parse::<i64>().map_err(|_| {
                ClientError::parse(format!("service '{name}' has a non-numeric <pendingaction>"))
            })?;
            code != 0
        }
    };

    // A "system" resource has no running concept; for everything else the
    // daemon signals a running service by including a <pid> child.
    let running = if kind == ServiceKind::System {
        None
    } else {
        Some(node.children().any(|child| child.has_tag_name("pid")))
    };

    Ok(Service {
        name,
        kind,
        running,
        monitored: monitor_state != 0,
        monitor_state,
        pending_action,
    })
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
}
