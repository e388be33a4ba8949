use serde::{Deserialize, Serialize};

pub const SSE: &str = "sse";
pub const SSE_SETUP: &str = "sse-setup";

/// The resolved target of a request path. An aggregate address names an
/// application, an aggregate type and optionally one instance; the two
/// live-update addresses are fixed endpoints used by the fanout
/// handshake. Paths that match none of the shapes have no address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Address {
    Aggregate {
        app: String,
        type_name: String,
        id: Option<String>,
    },
    LiveUpdate,
    LiveUpdateSetup,
}

impl Address {
    /// Parses a URL path against the configured context prefix. The
    /// path must carry the full context prefix; after it, exactly one
    /// segment selects a live-update endpoint, two segments select an
    /// aggregate type and three an aggregate instance. Instance ids are
    /// lower-cased. Returns `None` for every other shape.
    pub fn parse(path: &str, context_path: &[String]) -> Option<Address> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.len() < context_path.len()
            || !segments
                .iter()
                .zip(context_path.iter())
                .all(|(seg, ctx)| *seg == ctx)
        {
            return None;
        }

        match &segments[context_path.len()..] {
            [single] if *single == SSE => Some(Address::LiveUpdate),
            [single] if *single == SSE_SETUP => Some(Address::LiveUpdateSetup),
            [app, type_segment] => Some(Address::Aggregate {
                app: (*app).to_string(),
                type_name: strip_type_prefix(type_segment).to_string(),
                id: None,
            }),
            [app, type_segment, id] => Some(Address::Aggregate {
                app: (*app).to_string(),
                type_name: strip_type_prefix(type_segment).to_string(),
                id: Some(id.to_lowercase()),
            }),
            _ => None,
        }
    }

    /// The broker-topic and collection naming key, `<app>-<type>`.
    /// Only aggregate addresses have one.
    pub fn full_type(&self) -> Option<String> {
        match self {
            Address::Aggregate { app, type_name, .. } => Some(format!("{app}-{type_name}")),
            _ => None,
        }
    }

    pub fn instance_id(&self) -> Option<&str> {
        match self {
            Address::Aggregate { id: Some(id), .. } => Some(id),
            _ => None,
        }
    }
}

/// The type segment may carry a disambiguation prefix in front of the
/// real type name, separated by a dash, so the same broker cluster can
/// host several deployments. The prefix is dropped on parse.
fn strip_type_prefix(segment: &str) -> &str {
    match segment.find('-') {
        Some(index) => &segment[index + 1..],
        None => segment,
    }
}
