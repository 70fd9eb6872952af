//! Error type shared by the graph model, the layout scheduler and the session.

/// Everything that can go wrong while loading a graph or scheduling a layout.
///
/// The force math itself never fails: coincident nodes are handled by
/// substituting a small random direction, not by returning an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An edge names a node id that is not part of the graph.
    #[error("edge {edge} references unknown node id: {node_id}")]
    InvalidReference { edge: usize, node_id: String },

    /// A simulation or placement parameter is out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A layout run is already in flight.
    #[error("a layout run is already in progress ({completed}/{total} iterations)")]
    ConcurrentRun { completed: u32, total: u32 },

    /// Random placement gave up looking for a non-colliding position.
    #[error(
        "cannot place all nodes after {attempts} attempts; increase edge_length or decrease separation"
    )]
    Placement { attempts: u32 },

    /// Malformed graph JSON.
    #[error("failed to parse graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
