//! Renderer module: trait-based format dispatch over the finished model.
//!
//! Renderers only read the [`Transport`]; [`render_all`] runs them side by
//! side and reports each one's outcome on its own.

pub mod json;
pub mod markdown;

use crate::model::Transport;
use anyhow::{anyhow, Result};
use std::thread;
use thiserror::Error;

/// Trait for rendering the transport model into one artifact format.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, transport: &Transport) -> Result<String, RenderError>;
    fn file_extension(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{renderer}: {message}")]
pub struct RenderError {
    pub renderer: String,
    pub message: String,
}

impl RenderError {
    pub fn new(renderer: &str, message: impl ToString) -> Self {
        RenderError {
            renderer: renderer.to_string(),
            message: message.to_string(),
        }
    }
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use markdown or json", format)),
    }
}

/// One successfully rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub renderer: String,
    pub extension: String,
    pub content: String,
}

/// Outcome of every renderer, in renderer order.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub results: Vec<Result<Artifact, RenderError>>,
}

impl RenderReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RenderError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    /// True only if every renderer succeeded.
    pub fn is_success(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }
}

/// Run every renderer concurrently against the same model.
///
/// A failing or panicking renderer is logged and recorded; the others still
/// run to completion.
pub fn render_all(transport: &Transport, renderers: &[Box<dyn Renderer>]) -> RenderReport {
    let results = thread::scope(|scope| {
        let handles: Vec<_> = renderers
            .iter()
            .map(|renderer| scope.spawn(move || renderer.render(transport)))
            .collect();

        handles
            .into_iter()
            .zip(renderers)
            .map(|(handle, renderer)| {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(RenderError::new(renderer.name(), "renderer panicked")));
                match outcome {
                    Ok(content) => {
                        tracing::debug!(renderer = renderer.name(), bytes = content.len(), "rendered");
                        Ok(Artifact {
                            renderer: renderer.name().to_string(),
                            extension: renderer.file_extension().to_string(),
                            content,
                        })
                    }
                    Err(err) => {
                        tracing::error!(renderer = renderer.name(), error = %err, "render failed");
                        Err(err)
                    }
                }
            })
            .collect()
    });
    RenderReport { results }
}
