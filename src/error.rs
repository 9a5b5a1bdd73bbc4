//! Error types for grid editing.

use crate::node::NodeKind;
use thiserror::Error;

/// Errors returned by grid and editor operations.
///
/// Every variant is a recoverable, local condition: the operation that
/// produced it has left the grid exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GridError {
    /// Row or column outside the grid bounds.
    #[error("cell q[{row}], column {col} is outside the grid")]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// Target cell cannot host a new control or swap partner.
    #[error("cell q[{row}], column {col} is occupied by {kind}")]
    Occupied {
        /// Row of the occupied cell.
        row: usize,
        /// Column of the occupied cell.
        col: usize,
        /// Effective kind found there.
        kind: NodeKind,
    },

    /// The control of the gate at this cell cannot move in the requested direction.
    #[error("control of the gate on q[{gate_row}], column {col} cannot move there")]
    Blocked {
        /// Row of the gate owning the control.
        gate_row: usize,
        /// Column of the gate.
        col: usize,
    },

    /// The cell is a derived or filler marker with no owner to delete through.
    #[error("{kind} on q[{row}], column {col} cannot be removed on its own")]
    NotIndependentlyRemovable {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        col: usize,
        /// Effective kind of the cell.
        kind: NodeKind,
    },

    /// Rotation requested on a kind outside the rotatable set.
    #[error("{0} cannot be rotated")]
    Unrotatable(NodeKind),

    /// Control requested on a kind outside the controllable set.
    #[error("{0} cannot be controlled")]
    Uncontrollable(NodeKind),

    /// Swap partner requested on a kind other than swap.
    #[error("{0} cannot take a swap partner")]
    Unswappable(NodeKind),

    /// Kind that only the grid itself may write.
    #[error("{0} cannot be placed directly")]
    Unplaceable(NodeKind),

    /// Angle text that does not parse as a number or pi expression.
    #[error("invalid parameter '{0}': use numbers or pi expressions (e.g. pi/2, 3*pi/4)")]
    InvalidParameter(String),
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors in editor configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The grid needs at least one qubit wire.
    #[error("qubit count must be at least 1")]
    NoQubits,

    /// The grid needs at least one column.
    #[error("circuit depth must be at least 1")]
    NoColumns,

    /// Rotation step must be a finite, non-zero angle.
    #[error("rotation step {0} must be finite and non-zero")]
    InvalidRotationStep(f64),
}
