use thiserror::Error;

use crate::surface::ContainerId;

/// Library error type for attaching and driving slideshows.
#[derive(Debug, Error)]
pub enum Error {
    /// Attach was called with an empty slide list.
    #[error("no images were supplied")]
    NoImages,

    /// Options or slide entries violate a documented range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A method call named something the controller does not expose.
    #[error("unknown slideshow method: {0}")]
    UnknownMethod(String),

    /// No live controller is attached to the container.
    #[error("no slideshow attached to {0}")]
    Detached(ContainerId),
}

pub type Result<T> = std::result::Result<T, Error>;
