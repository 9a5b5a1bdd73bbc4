//! Circuit-grid editing model.
//!
//! A [`Grid`] holds one [`Node`] per (qubit, column) cell. Gates link to
//! control and swap rows in their own column; the grid keeps those links
//! consistent and compiles the whole board into an OpenQASM 2.0 program.
//! [`Editor`] wraps a grid with a selection cursor and the editing
//! operations a front end drives.

pub mod config;
pub mod editor;
pub mod error;
pub mod grid;
pub mod node;
pub mod palette;
pub mod params;

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{ConfigError, GridError, GridResult};
pub use grid::{Direction, Grid};
pub use node::{Axis, ControlledBase, Node, NodeKind};
