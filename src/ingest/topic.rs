use crate::error::IngestError;

/// Names that collide with fixed query routes under `/sensors/`.
pub const RESERVED_NAMES: &[&str] = &["next"];

/// Matches topics of the form `<root>/<sensor name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    root: String,
}

impl TopicFilter {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    /// Wildcard filter to subscribe with, e.g. `sensors/+`
    pub fn subscription(&self) -> String {
        format!("{}/+", self.root)
    }

    /// Extract the sensor name from a concrete topic.
    ///
    /// The name is exactly one non-empty level below the root, may not
    /// contain wildcard characters and may not be one of [`RESERVED_NAMES`].
    pub fn sensor_name<'a>(&self, topic: &'a str) -> Result<&'a str, IngestError> {
        topic
            .strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '+', '#']))
            .filter(|name| !RESERVED_NAMES.iter().any(|reserved| reserved == name))
            .ok_or_else(|| IngestError::TopicMismatch {
                topic: topic.to_string(),
                filter: self.subscription(),
            })
    }
}
