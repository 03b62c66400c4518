use std::fmt;
use std::str::FromStr;

use crate::error::{FetchError, Result};

/// Parsed `#/<container id>/<artifact name>` resource data.
///
/// The artifact name may itself contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    container_id:  i64,
    artifact_name: String,
}

impl ResourceLocator {
    pub fn new(container_id: i64, artifact_name: impl Into<String>) -> Self {
        Self {
            container_id,
            artifact_name: artifact_name.into(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || FetchError::InvalidLocator(raw.to_owned());

        let mut segments = raw.splitn(3, '/');
        let (Some("#"), Some(id), Some(name)) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        let container_id = id.parse::<i64>().map_err(|_| invalid())?;
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(container_id, name))
    }

    pub fn container_id(&self) -> i64 { self.container_id }

    pub fn artifact_name(&self) -> &str { &self.artifact_name }
}

impl FromStr for ResourceLocator {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#/{}/{}", self.container_id, self.artifact_name)
    }
}
