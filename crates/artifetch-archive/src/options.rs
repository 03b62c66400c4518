use serde::{Deserialize, Serialize};

/// How archives are unpacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TarBackend {
    /// `tar xf <archive> --directory <dir>`; any stderr output is fatal
    #[default]
    System,
    /// In-process unpacking with the `tar` crate
    Builtin,
}

/// Configuration for [`TarExtractor`](crate::TarExtractor).
///
/// # Example
///
/// ```
/// use artifetch_archive::{ExtractOptions, TarBackend};
///
/// let options = ExtractOptions::default().backend(TarBackend::Builtin);
/// assert_eq!(options.backend, TarBackend::Builtin);
/// assert!(options.delete_archives);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub backend:         TarBackend,
    /// Remove each archive once it has been unpacked
    pub delete_archives: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            backend:         TarBackend::default(),
            delete_archives: true,
        }
    }
}

impl ExtractOptions {
    pub fn backend(mut self, backend: TarBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn delete_archives(mut self, delete: bool) -> Self {
        self.delete_archives = delete;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_tar_tool_behaviour() {
        let options = ExtractOptions::default();
        assert_eq!(options.backend, TarBackend::System);
        assert!(options.delete_archives);
    }

    #[test]
    fn test_backend_names() {
        use serde::de::IntoDeserializer;
        use serde::de::value::Error;

        let backend = TarBackend::deserialize("builtin".into_deserializer());
        let backend: Result<TarBackend, Error> = backend;
        assert_eq!(backend.unwrap(), TarBackend::Builtin);
    }
}
