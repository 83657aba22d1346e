//! Snapshot records describing a single monitored resource.

use std::fmt;

use serde::Serialize;

/// Raw `<monitor>` value for a resource Monit is not watching.
pub const MONITOR_NONE: u8 = 0;
/// Raw `<monitor>` value for an actively watched resource.
pub const MONITOR_ACTIVE: u8 = 1;
/// Raw `<monitor>` value while monitoring is still being established.
///
/// This is a transitional state and must never be treated as a stable
/// boolean; snapshots containing it are discarded and re-fetched.
pub const MONITOR_INITIALIZING: u8 = 2;

/// The category of a monitored resource, taken from the `type` attribute of
/// a `<service>` element. Unrecognized or missing codes map to `Unknown`
/// rather than failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Filesystem,
    Directory,
    File,
    Process,
    Connection,
    System,
    Unknown,
}

impl ServiceKind {
    pub fn from_code(code: Option<u32>) -> Self {
        match code {
            Some(0) => Self::Filesystem,
            Some(1) => Self::Directory,
            Some(2) => Self::File,
            Some(3) => Self::Process,
            Some(4) => Self::Connection,
            Some(5) => Self::System,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Process => "process",
            Self::Connection => "connection",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Immutable snapshot of one monitored service.
///
/// Records are built fresh from every fetched status document and replaced
/// wholesale on the next reconcile; nothing mutates them in place. Do not
/// retain a `Service` across a reconcile and expect it to stay current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Unique service name, the key within the client's snapshot map.
    pub name: String,
    pub kind: ServiceKind,
    /// `None` when the daemon has no running concept for this resource
    /// (always the case for [`ServiceKind::System`]).
    pub running: Option<bool>,
    /// Whether Monit is watching this resource (`monitor_state != 0`).
    pub monitored: bool,
    /// Raw `<monitor>` value; kept alongside `monitored` because the
    /// initializing value 2 signals a transitional snapshot.
    pub monitor_state: u8,
    /// True while a requested action is still being carried out.
    pub pending_action: bool,
}

impl Service {
    /// Whether this record reflects an in-flight daemon-side change.
    /// Snapshots containing transitional records are never published.
    pub fn is_transitional(&self) -> bool {
        self.pending_action || self.monitor_state == MONITOR_INITIALIZING
    }

    /// Human-readable one-line summary, e.g. `"Process, running, monitored"`.
    /// Unknown states are simply omitted; this never fails.
    pub fn summary(&self) -> String {
        let label = self.kind.label();
        let mut text = String::with_capacity(label.len() + 32);
        let mut characters = label.chars();
        if let Some(first) = characters.next() {
            text.extend(first.to_uppercase());
            text.push_str(characters.as_str());
        }
        match self.running {
            Some(true) => text.push_str(", running"),
            Some(false) => text.push_str(", stopped"),
            None => {}
        }
        if self.monitored {
            text.push_str(", monitored");
        } else {
            text.push_str(", not monitored");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(running: Option<bool>, monitor_state: u8, pending_action: bool) -> Service {
        Service {
            name: "nginx".to_string(),
            kind: ServiceKind::Process,
            running,
            monitored: monitor_state != 0,
            monitor_state,
            pending_action,
        }
    }

    #[test]
    fn summary_for_running_monitored_process() {
        let service = process(Some(true), MONITOR_ACTIVE, false);
        assert_eq!(service.summary(), "Process, running, monitored");
    }

    #[test]
    fn summary_for_stopped_unmonitored_process() {
        let service = process(Some(false), MONITOR_NONE, false);
        assert_eq!(service.summary(), "Process, stopped, not monitored");
    }

    #[test]
    fn summary_omits_running_when_unknown() {
        let service = Service {
            name: "localhost".to_string(),
            kind: ServiceKind::System,
            running: None,
            monitored: true,
            monitor_state: MONITOR_ACTIVE,
            pending_action: false,
        };
        assert_eq!(service.summary(), "System, monitored");
    }

    #[test]
    fn summary_renders_unknown_kind() {
        let service = Service {
            name: "mystery".to_string(),
            kind: ServiceKind::Unknown,
            running: Some(false),
            monitored: false,
            monitor_state: MONITOR_NONE,
            pending_action: false,
        };
        assert_eq!(service.summary(), "Unknown, stopped, not monitored");
    }

    #[test]
    fn pending_action_is_transitional() {
        assert!(process(Some(true), MONITOR_ACTIVE, true).is_transitional());
    }

    #[test]
    fn initializing_monitor_is_transitional() {
        assert!(process(Some(true), MONITOR_INITIALIZING, false).is_transitional());
    }

    #[test]
    fn stable_record_is_not_transitional() {
        assert!(!process(Some(true), MONITOR_ACTIVE, false).is_transitional());
        assert!(!process(Some(false), MONITOR_NONE, false).is_transitional());
    }

    #[test]
    fn kind_codes_map_to_variants() {
        let expected = [
            (0, ServiceKind::Filesystem),
            (1, ServiceKind::Directory),
            (2, ServiceKind::File),
            (3, ServiceKind::Process),
            (4, ServiceKind::Connection),
            (5, ServiceKind::System),
        ];
        for (code, kind) in expected {
            assert_eq!(ServiceKind::from_code(Some(code)), kind);
        }
        assert_eq!(ServiceKind::from_code(Some(42)), ServiceKind::Unknown);
        assert_eq!(ServiceKind::from_code(None), ServiceKind::Unknown);
    }

    #[test]
    fn serializes_with_lowercase_kind() {
        let service = process(Some(true), MONITOR_ACTIVE, false);
        let json = serde_json::to_value(&service).expect("serializable snapshot");
        assert_eq!(json["kind"], "process");
        assert_eq!(json["running"], true);
        assert_eq!(json["monitor_state"], 1);
    }
}
