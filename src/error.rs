use thiserror::Error;

/// Top-level error type for the shell boolean engine.
#[derive(Debug, Error)]
pub enum ShellboolError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Boolean(#[from] BooleanError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to topological operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to modeling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failures raised by the boolean engine.
#[derive(Debug, Error)]
pub enum BooleanError {
    /// A vertex landed on a cell boundary of the spatial index.
    ///
    /// The engine recovers from this by rebuilding the index with a new
    /// jitter; callers only see it through [`BooleanError::RetryBudgetExhausted`].
    #[error("vertex lies on a spatial partition cell boundary")]
    DegeneratePartition,

    #[error("spatial partition stayed degenerate after {attempts} attempts")]
    RetryBudgetExhausted { attempts: usize },

    #[error("ambiguous loop continuation at ({x}, {y}, {z})")]
    AmbiguousLoop { x: f64, y: f64, z: f64 },

    #[error("unsupported intersection: {0}")]
    UnsupportedIntersection(String),

    #[error("geometric inconsistency: {0}")]
    Inconsistent(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`ShellboolError`].
pub type Result<T> = std::result::Result<T, ShellboolError>;
