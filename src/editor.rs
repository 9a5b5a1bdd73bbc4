//! Editing session: a [`Grid`] plus a selection cursor.
//!
//! These are the only entry points a front end calls. Each edit either
//! applies fully or returns an error and leaves the grid alone; rejected
//! edits are reported through `status_msg` as well as the returned error.

use std::f64::consts::TAU;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::config::EditorConfig;
use crate::error::{ConfigError, GridError, GridResult};
use crate::grid::{Direction, Grid};
use crate::node::{Node, NodeKind};
use crate::params::parse_angles;

pub struct Editor {
    grid: Grid,
    cursor_row: usize,
    cursor_col: usize,
    rotation_step: f64,
    pub status_msg: String,
}

impl Editor {
    pub fn new(config: &EditorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Editor {
            grid: Grid::new(config.qubit_count, config.depth),
            cursor_row: 0,
            cursor_col: 0,
            rotation_step: config.rotation_step,
            status_msg: String::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rotation_step(&self) -> f64 {
        self.rotation_step
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    /// Selected `(row, col)`.
    pub fn selection(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.cursor_row = self.cursor_row.saturating_sub(1),
            Direction::Down => {
                if self.cursor_row + 1 < self.grid.qubit_count() {
                    self.cursor_row += 1;
                }
            }
            Direction::Left => self.cursor_col = self.cursor_col.saturating_sub(1),
            Direction::Right => {
                if self.cursor_col + 1 < self.grid.depth() {
                    self.cursor_col += 1;
                }
            }
        }
    }

    pub fn reset_cursor(&mut self) {
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    pub fn selected_kind(&self) -> NodeKind {
        let (row, col) = self.selection();
        self.grid.effective_kind(row, col).unwrap_or_default()
    }

    fn record<T>(&mut self, action: &str, row: usize, col: usize, result: GridResult<T>) -> GridResult<T> {
        match &result {
            Ok(_) => {
                self.status_msg.clear();
                debug!(action, row, col, "edit applied");
            }
            Err(err) => {
                self.status_msg = err.to_string();
                debug!(action, row, col, %err, "edit rejected");
            }
        }
        result
    }

    /// Other rows ordered by distance, the upper one first on ties.
    fn nearest_rows(&self, row: usize) -> Vec<usize> {
        let qubits = self.grid.qubit_count();
        let mut rows = Vec::new();
        for dist in 1..qubits {
            if let Some(up) = row.checked_sub(dist) {
                rows.push(up);
            }
            if row + dist < qubits {
                rows.push(row + dist);
            }
        }
        rows
    }

    // ── Protocol surface ──────────────────────────────────────────────────────

    pub fn effective_kind(&self, row: usize, col: usize) -> GridResult<NodeKind> {
        self.grid.effective_kind(row, col)
    }

    /// Put a new gate on an empty cell; `params` are theta, phi, lambda.
    pub fn place(&mut self, row: usize, col: usize, kind: NodeKind, params: &[f64]) -> GridResult<()> {
        let result = self.try_place(row, col, kind, params);
        self.record("place", row, col, result)
    }

    fn try_place(&mut self, row: usize, col: usize, kind: NodeKind, params: &[f64]) -> GridResult<()> {
        // Derived kinds come from angles and links, never from a direct place.
        if kind == NodeKind::Empty || kind.is_structural() || kind != kind.base() {
            return Err(GridError::Unplaceable(kind));
        }
        if let Some(bad) = params.iter().find(|value| !value.is_finite()) {
            return Err(GridError::InvalidParameter(bad.to_string()));
        }
        let current = self.grid.effective_kind(row, col)?;
        if current != NodeKind::Empty {
            return Err(GridError::Occupied {
                row,
                col,
                kind: current,
            });
        }

        let mut node = Node::new(kind);
        if let Some((&theta, rest)) = params.split_first() {
            if !kind.is_rotatable() {
                return Err(GridError::Unrotatable(kind));
            }
            if rest.len() > 2 {
                return Err(GridError::InvalidParameter(format!(
                    "{} angles given, at most 3 accepted",
                    params.len()
                )));
            }
            node = node
                .with_theta(theta.rem_euclid(TAU))
                .with_phi(rest.first().copied())
                .with_lambda(rest.get(1).copied());
        }
        self.grid.place_node(row, col, node)
    }

    /// [`Editor::place`] with the angles given as text, e.g. `"pi/2"`.
    pub fn place_with_text(&mut self, row: usize, col: usize, kind: NodeKind, params: &str) -> GridResult<()> {
        let result = parse_angles(params).and_then(|angles| self.try_place(row, col, kind, &angles));
        self.record("place", row, col, result)
    }

    /// Place `kind` on an empty cell, or delete the gate if it already is one.
    pub fn toggle_gate(&mut self, row: usize, col: usize, kind: NodeKind) -> GridResult<()> {
        let result = self.try_toggle_gate(row, col, kind);
        self.record("toggle gate", row, col, result)
    }

    fn try_toggle_gate(&mut self, row: usize, col: usize, kind: NodeKind) -> GridResult<()> {
        let current = self.grid.effective_kind(row, col)?;
        if current == NodeKind::Empty {
            return self.try_place(row, col, kind, &[]);
        }
        let physical = self.grid.node(row, col)?.kind();
        if physical != NodeKind::Empty && physical.base() == kind.base() {
            return self.grid.delete_node(row, col);
        }
        Err(GridError::Occupied {
            row,
            col,
            kind: current,
        })
    }

    /// Remove the gate's controls, or attach one on the wire above (else below).
    pub fn toggle_control(&mut self, row: usize, col: usize) -> GridResult<()> {
        let result = self.try_toggle_control(row, col);
        self.record("toggle control", row, col, result)
    }

    fn try_toggle_control(&mut self, row: usize, col: usize) -> GridResult<()> {
        let node = self.grid.node(row, col)?;
        if node.controls().next().is_some() {
            return self.grid.remove_controls(row, col);
        }

        let qubits = self.grid.qubit_count();
        let candidates = row
            .checked_sub(1)
            .into_iter()
            .chain(Some(row + 1).filter(|&below| below < qubits));

        let mut outcome = Err(GridError::Blocked { gate_row: row, col });
        for candidate in candidates {
            outcome = self.grid.place_control(row, candidate, col).map(|_| ());
            if outcome.is_ok() {
                break;
            }
        }
        outcome
    }

    /// Attach a second control on the nearest free wire (Toffoli).
    pub fn add_second_control(&mut self, row: usize, col: usize) -> GridResult<usize> {
        let result = self.try_add_second_control(row, col);
        self.record("add second control", row, col, result)
    }

    fn try_add_second_control(&mut self, row: usize, col: usize) -> GridResult<usize> {
        self.grid.node(row, col)?;
        for candidate in self.nearest_rows(row) {
            match self.grid.place_second_control(row, candidate, col) {
                Err(GridError::Occupied { .. }) => continue,
                other => return other,
            }
        }
        Err(GridError::Blocked { gate_row: row, col })
    }

    /// Unlink a swap gate, or link it to the nearest free wire.
    pub fn toggle_swap(&mut self, row: usize, col: usize) -> GridResult<()> {
        let result = self.try_toggle_swap(row, col);
        self.record("toggle swap", row, col, result)
    }

    fn try_toggle_swap(&mut self, row: usize, col: usize) -> GridResult<()> {
        let node = self.grid.node(row, col)?;
        if node.swap_partner().is_some() {
            let unlinked = node.clone().with_swap_partner(None);
            return self.grid.place_node(row, col, unlinked);
        }

        for candidate in self.nearest_rows(row) {
            match self.grid.place_swap(row, candidate, col) {
                Err(GridError::Occupied { .. }) => continue,
                other => return other.map(|_| ()),
            }
        }
        Err(GridError::Occupied {
            row,
            col,
            kind: NodeKind::Swap,
        })
    }

    pub fn move_control(&mut self, row: usize, col: usize, direction: Direction) -> GridResult<usize> {
        let result = self.grid.move_control(row, col, direction);
        self.record("move control", row, col, result)
    }

    pub fn delete(&mut self, row: usize, col: usize) -> GridResult<()> {
        let result = self.grid.delete_node(row, col);
        self.record("delete", row, col, result)
    }

    pub fn rotate(&mut self, row: usize, col: usize, delta_theta: f64) -> GridResult<()> {
        let result = self.grid.rotate(row, col, delta_theta);
        self.record("rotate", row, col, result)
    }

    /// Rotate until theta reads `text` (an angle expression).
    pub fn rotate_to(&mut self, row: usize, col: usize, text: &str) -> GridResult<()> {
        let result = self.try_rotate_to(row, col, text);
        self.record("rotate to", row, col, result)
    }

    fn try_rotate_to(&mut self, row: usize, col: usize, text: &str) -> GridResult<()> {
        let theta = match parse_angles(text)?.as_slice() {
            [theta] => *theta,
            _ => return Err(GridError::InvalidParameter(text.trim().to_string())),
        };
        let current = self.grid.node(row, col)?.theta();
        self.grid.rotate(row, col, theta - current)
    }

    pub fn compile(&self) -> String {
        self.grid.compile_program()
    }

    /// Start over with an empty grid of the same size.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.reset_cursor();
        self.status_msg.clear();
        debug!("circuit reset");
    }

    /// Write the compiled program to `path`.
    pub fn save(&self, path: &Path) -> Result<(), io::Error> {
        fs::write(path, self.compile())?;
        debug!(path = %path.display(), "program saved");
        Ok(())
    }
}
