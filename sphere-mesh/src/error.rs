use thiserror::Error;

/// Error type for sphere generation failures
///
/// Every variant is terminal for the generation call that produced it;
/// no partial mesh is handed back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Tessellation factor must be at least 1
    #[error("tessellation factor must be >= 1 (got 0)")]
    ZeroTessellation,

    /// Vertex list was not built with the same tessellation factor
    #[error(
        "vertex list has {actual} vertices but tessellation {tessellation} requires {expected}"
    )]
    VertexCountMismatch {
        tessellation: u32,
        expected: usize,
        actual: usize,
    },

    /// Vertex count exceeds what 32-bit indices can address
    #[error(
        "tessellation {tessellation} yields {vertex_count} vertices, too many for 32-bit indices"
    )]
    IndexOverflow {
        tessellation: u32,
        vertex_count: usize,
    },

    /// Element counts do not fit in `usize`
    #[error("tessellation {tessellation} is too large to address")]
    SizeOverflow { tessellation: u32 },

    /// Allocation of the output buffer failed
    #[error("failed to allocate storage for {elements} elements")]
    Allocation { elements: usize },
}
