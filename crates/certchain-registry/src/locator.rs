use certchain_core::BlobRef;

/// Base path under which blobs are served.
pub const DEFAULT_PUBLIC_BASE: &str = "/uploads";

/// Builds blob download locators of the form `{base}/{ref}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorTemplate {
    base: String,
}

impl LocatorTemplate {
    /// Trailing slashes on `base` are dropped.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn locate(&self, blob: &BlobRef) -> String {
        format!("{}/{}", self.base, blob)
    }
}

impl Default for LocatorTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_BASE)
    }
}
