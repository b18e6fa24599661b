// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector errors.

use nodeweave_graph::ConnectionError;
use thiserror::Error;

/// Errors raised by the link connector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectorError {
    /// A drag gesture is already in progress
    #[error("Already dragging links.")]
    AlreadyDragging,

    /// Only a single input-side link can be dropped on a reroute
    #[error("Cannot connect {0} links to a reroute at once")]
    TooManyLinksForReroute(usize),

    /// A network mutation failed
    #[error(transparent)]
    Network(#[from] ConnectionError),
}

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
