//! Access to a previously built image.

use crate::errors::Error;
use std::collections::HashMap;

/// The label carrying per-buildpack layer metadata on a built image.
pub const LAYER_METADATA_LABEL: &str = "io.buildpacks.lifecycle.metadata";

/// A handle to a previously built image.
///
/// The engine only ever reads identity and labels; registry and daemon
/// implementations live outside this crate.
pub trait ImageSource {
    /// The reference the image was requested by.
    fn name(&self) -> &str;

    /// Whether the image exists at all. Analysis of a missing image is not
    /// an error; it yields empty metadata.
    fn found(&self) -> bool;

    /// A stable identifier (usually a digest reference) for the image.
    fn identifier(&self) -> Result<String, Error>;

    /// The raw value of the given label, if present.
    fn label(&self, name: &str) -> Result<Option<String>, Error>;
}

/// In-memory image for tests.
#[derive(Default)]
pub struct FakeImage {
    pub name: String,
    pub identifier: Option<String>,
    pub labels: HashMap<String, String>,
}

impl FakeImage {
    /// An image that does not exist.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            labels: HashMap::new(),
        }
    }

    pub fn with_label(
        name: impl Into<String>,
        identifier: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: Some(identifier.into()),
            labels: HashMap::from([(label.into(), value.into())]),
        }
    }
}

impl ImageSource for FakeImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn found(&self) -> bool {
        self.identifier.is_some()
    }

    fn identifier(&self) -> Result<String, Error> {
        self.identifier
            .clone()
            .ok_or_else(|| Error::Image(format!("image '{}' not found", self.name)))
    }

    fn label(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self.labels.get(name).cloned())
    }
}
