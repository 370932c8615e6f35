use async_trait::async_trait;
use crate::application::errors::RenderError;

/// Turns a remote image into a block of text art
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}
