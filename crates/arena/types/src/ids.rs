use serde::{Deserialize, Serialize};

/// Identifier of an execution container.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub String);

/// Identifier of a live instance inside one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl ContainerId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(format!("ctr-{}", uuid::Uuid::new_v4()))
    }

    /// Id derived from a candidate name and rank, made unique with a short
    /// random suffix.
    pub fn for_candidate(unit: &str, rank: usize) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let slug: String = unit
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        Self(format!("{}-{}-{}", slug, rank, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ContainerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
