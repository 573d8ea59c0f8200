//! Hooks into the host environment: file save and clipboard.

use thiserror::Error;

pub const MANIFEST_CONTENT_TYPE: &str = "text/yaml";

/// A file ready to be handed to the host's save mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub contents: String,
}

impl Download {
    pub fn manifest(file_name: String, contents: String) -> Self {
        Self { file_name, content_type: MANIFEST_CONTENT_TYPE, contents }
    }

    pub fn content_disposition(&self) -> String {
        let name: String =
            self.file_name.chars().filter(|c| *c != '"' && !c.is_control()).collect();
        format!("attachment; filename=\"{}\"", name)
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), HostError>;
}

/// The desktop clipboard of the machine running the portal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), HostError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| HostError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| HostError::Clipboard(e.to_string()))
    }
}
