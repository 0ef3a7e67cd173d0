use thiserror::Error;

/// A rendered, scannable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCode {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Error)]
#[error("Could not render code. {0}")]
pub struct CodeRenderError(pub String);

/// Renders arbitrary text into a scannable image artifact.
pub trait CodeRenderer {
    fn render(&self, content: &str) -> Result<RenderedCode, CodeRenderError>;
}
