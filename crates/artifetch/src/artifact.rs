use serde::{Deserialize, Serialize};

/// A published build artifact.
///
/// `resource_data` is the container locator, `#/{container id}/{artifact name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub name:          String,
    pub resource_data: String,
}

impl BuildArtifact {
    pub fn new(name: impl Into<String>, resource_data: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            resource_data: resource_data.into(),
        }
    }

    /// Artifact stored in `container_id` under its own name.
    pub fn in_container(container_id: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        let resource_data = format!("#/{container_id}/{name}");
        Self { name, resource_data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifetch_fetch::ResourceLocator;

    #[test]
    fn test_in_container_builds_a_parsable_locator() {
        let artifact = BuildArtifact::in_container(7029766, "tool-alpine-x64");
        assert_eq!(artifact.resource_data, "#/7029766/tool-alpine-x64");

        let locator = ResourceLocator::parse(&artifact.resource_data).unwrap();
        assert_eq!(locator.container_id(), 7029766);
        assert_eq!(locator.artifact_name(), artifact.name);
    }
}
