//! The circuit grid: a qubit-count × depth matrix of [`Node`]s.
//!
//! Control and swap links are stored once, on the gate cell. Every other cell
//! that takes part in a link reads its role through [`Grid::effective_kind`],
//! which rebuilds `Control`/`Swap` from a column scan. The only physical
//! `Control` markers are the ones [`Grid::place_node`] writes, and those are
//! released again whenever their gate is overwritten.

use std::f64::consts::TAU;
use std::fmt;
use std::ops::Range;

use crate::error::{GridError, GridResult};
use crate::node::{Node, NodeKind};

/// Direction of a cursor or control move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The circuit grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    qubit_count: usize,
    depth: usize,
    /// Indexed `[row][col]`.
    cells: Vec<Vec<Node>>,
}

impl Grid {
    /// Create an all-empty grid.
    pub fn new(qubit_count: usize, depth: usize) -> Self {
        let cells = (0..qubit_count)
            .map(|row| (0..depth).map(|_| Node::empty().at_row(row)).collect())
            .collect();
        Grid {
            qubit_count,
            depth,
            cells,
        }
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn check(&self, row: usize, col: usize) -> GridResult<()> {
        if row < self.qubit_count && col < self.depth {
            Ok(())
        } else {
            Err(GridError::OutOfRange { row, col })
        }
    }

    /// Physical node stored at a cell.
    pub fn node(&self, row: usize, col: usize) -> GridResult<&Node> {
        self.check(row, col)?;
        Ok(&self.cells[row][col])
    }

    /// Physical nodes of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Node> {
        self.cells.iter().filter_map(move |row| row.get(col))
    }

    // ── Derived roles ─────────────────────────────────────────────────────────

    fn resolve(&self, row: usize, col: usize) -> NodeKind {
        let kind = self.cells[row][col].kind();
        if kind != NodeKind::Empty {
            return kind;
        }

        let mut swap = false;
        for (other, cells) in self.cells.iter().enumerate() {
            if other == row {
                continue;
            }
            let node = &cells[col];
            if node.controls_row(row) {
                return NodeKind::Control;
            }
            if node.swap_partner() == Some(row) {
                swap = true;
            }
        }

        if swap { NodeKind::Swap } else { NodeKind::Empty }
    }

    /// Kind the cell displays and compiles as, with derived markers resolved.
    pub fn effective_kind(&self, row: usize, col: usize) -> GridResult<NodeKind> {
        self.check(row, col)?;
        Ok(self.resolve(row, col))
    }

    /// Row of the gate that uses `row` as a control input in this column.
    pub fn find_controlling_gate(&self, row: usize, col: usize) -> Option<usize> {
        if col >= self.depth {
            return None;
        }
        (0..self.qubit_count).find(|&other| other != row && self.cells[other][col].controls_row(row))
    }

    /// Row of another node in the column linking to `row`, ignoring `except`.
    fn claimant(&self, row: usize, col: usize, except: &[usize]) -> Option<usize> {
        (0..self.qubit_count).find(|other| {
            *other != row && !except.contains(other) && self.cells[*other][col].claims(row)
        })
    }

    /// Whether a new control or swap partner may land on this cell.
    fn is_free(&self, row: usize, col: usize) -> bool {
        matches!(self.resolve(row, col), NodeKind::Empty | NodeKind::Trace)
    }

    fn occupied(&self, row: usize, col: usize) -> GridError {
        GridError::Occupied {
            row,
            col,
            kind: self.resolve(row, col),
        }
    }

    // ── Placement ─────────────────────────────────────────────────────────────

    /// Store `node` at a cell and write `Control` markers on its control rows.
    ///
    /// Whatever the touched cells held before is overwritten; physical
    /// `Control` markers and `Trace` fillers of the overwritten nodes are
    /// cleared with them.
    pub fn place_node(&mut self, row: usize, col: usize, node: Node) -> GridResult<()> {
        self.check(row, col)?;

        let kind = node.kind();
        let has_controls = node.controls().next().is_some();
        if (has_controls && !kind.is_controlled())
            || (node.ctrl_b().is_some() && kind != NodeKind::Toffoli)
        {
            return Err(GridError::Uncontrollable(kind));
        }

        let links: Vec<usize> = node.linked_rows().collect();
        for (i, &linked) in links.iter().enumerate() {
            self.check(linked, col)?;
            if linked == row || links[..i].contains(&linked) {
                return Err(self.occupied(linked, col));
            }
        }

        let controls: Vec<usize> = node.controls().collect();
        let mut overwritten = controls.clone();
        overwritten.push(row);
        for &linked in &links {
            if self.claimant(linked, col, &overwritten).is_some() {
                return Err(self.occupied(linked, col));
            }
        }

        for &target in &overwritten {
            let keep: &[usize] = if target == row { &links } else { &[] };
            self.release(target, col, keep);
        }
        self.cells[row][col] = node.at_row(row);
        for ctrl in controls {
            self.cells[ctrl][col] = Node::control().at_row(ctrl);
        }
        Ok(())
    }

    /// Clear what the node at this cell left in its column: physical
    /// `Control` markers on its control rows, and `Trace` fillers toward its
    /// links unless a link in `keep`, or another node's link, still spans them.
    fn release(&mut self, row: usize, col: usize, keep: &[usize]) {
        let old = &self.cells[row][col];
        let spanned = |r: usize| {
            keep.iter().any(|&link| strictly_between(row, link).contains(&r))
                || (0..self.qubit_count).filter(|&other| other != row).any(|other| {
                    self.cells[other][col]
                        .linked_rows()
                        .any(|link| strictly_between(other, link).contains(&r))
                })
        };

        let mut stale: Vec<usize> = old
            .controls()
            .filter(|&ctrl| self.cells[ctrl][col].kind() == NodeKind::Control)
            .collect();
        for link in old.linked_rows() {
            stale.extend(
                strictly_between(row, link)
                    .filter(|&r| self.cells[r][col].kind() == NodeKind::Trace && !spanned(r)),
            );
        }

        for r in stale {
            self.cells[r][col] = Node::empty().at_row(r);
        }
    }

    fn clear(&mut self, row: usize, col: usize) -> GridResult<()> {
        self.place_node(row, col, Node::empty())
    }

    /// Link `candidate_row` to the gate as its (first) control.
    pub fn place_control(
        &mut self,
        gate_row: usize,
        candidate_row: usize,
        col: usize,
    ) -> GridResult<usize> {
        self.check(gate_row, col)?;
        self.check(candidate_row, col)?;

        let gate = &self.cells[gate_row][col];
        let updated = gate.clone().with_ctrl_a(Some(candidate_row));
        if !updated.kind().is_controlled() {
            return Err(GridError::Uncontrollable(gate.kind()));
        }
        if candidate_row == gate_row || !self.is_free(candidate_row, col) {
            return Err(self.occupied(candidate_row, col));
        }

        self.place_node(gate_row, col, updated)?;
        self.clear(candidate_row, col)?;
        Ok(candidate_row)
    }

    /// Add a second control, turning a controlled X into a Toffoli.
    pub fn place_second_control(
        &mut self,
        gate_row: usize,
        candidate_row: usize,
        col: usize,
    ) -> GridResult<usize> {
        self.check(gate_row, col)?;
        self.check(candidate_row, col)?;

        let gate = &self.cells[gate_row][col];
        let updated = gate.clone().with_ctrl_b(Some(candidate_row));
        if updated.kind() != NodeKind::Toffoli {
            return Err(GridError::Uncontrollable(gate.kind()));
        }
        if candidate_row == gate_row || !self.is_free(candidate_row, col) {
            return Err(self.occupied(candidate_row, col));
        }

        self.place_node(gate_row, col, updated)?;
        self.clear(candidate_row, col)?;
        Ok(candidate_row)
    }

    /// Drop every control of the gate, along with `Trace` fillers on the way.
    pub fn remove_controls(&mut self, gate_row: usize, col: usize) -> GridResult<()> {
        self.check(gate_row, col)?;

        let gate = self.cells[gate_row][col].clone();
        if gate.controls().next().is_none() {
            return Ok(());
        }
        self.place_node(gate_row, col, gate.with_ctrl_a(None).with_ctrl_b(None))
    }

    /// Shift the gate's single control one row, hopping over the gate itself.
    pub fn move_control(
        &mut self,
        gate_row: usize,
        col: usize,
        direction: Direction,
    ) -> GridResult<usize> {
        self.check(gate_row, col)?;
        let blocked = || GridError::Blocked { gate_row, col };

        let gate = self.cells[gate_row][col].clone();
        let (Some(ctrl), None) = (gate.ctrl_a(), gate.ctrl_b()) else {
            return Err(blocked());
        };

        let qubit_count = self.qubit_count;
        let step = |row: usize| match direction {
            Direction::Up => row.checked_sub(1),
            Direction::Down => Some(row + 1).filter(|&next| next < qubit_count),
            Direction::Left | Direction::Right => None,
        };

        let mut candidate = step(ctrl).ok_or_else(blocked)?;
        if candidate == gate_row {
            candidate = step(candidate).ok_or_else(blocked)?;
        }
        if !self.is_free(candidate, col) {
            return Err(blocked());
        }

        self.place_node(gate_row, col, gate.with_ctrl_a(Some(candidate)))?;
        self.clear(candidate, col)?;

        let gap = match direction {
            Direction::Up if candidate < gate_row => Some(candidate + 1),
            Direction::Down if candidate > gate_row => Some(candidate - 1),
            _ => None,
        };
        if let Some(row) = gap.filter(|&row| row != gate_row) {
            if self.resolve(row, col) == NodeKind::Empty {
                self.place_node(row, col, Node::trace())?;
            }
        }
        Ok(candidate)
    }

    /// Link a swap gate to its partner row.
    pub fn place_swap(&mut self, row: usize, partner_row: usize, col: usize) -> GridResult<usize> {
        self.check(row, col)?;
        self.check(partner_row, col)?;

        let node = &self.cells[row][col];
        if node.kind().base() != NodeKind::Swap {
            return Err(GridError::Unswappable(node.kind()));
        }
        if partner_row == row || !self.is_free(partner_row, col) {
            return Err(self.occupied(partner_row, col));
        }

        let updated = node.clone().with_swap_partner(Some(partner_row));
        self.place_node(row, col, updated)?;
        self.clear(partner_row, col)?;
        Ok(partner_row)
    }

    // ── Removal ───────────────────────────────────────────────────────────────

    /// Delete the gate at a cell together with its control links.
    ///
    /// A `Control` cell deletes its owning gate. Derived swap partners and
    /// `Trace` fillers have no owner of their own and are rejected.
    pub fn delete_node(&mut self, row: usize, col: usize) -> GridResult<()> {
        self.check(row, col)?;

        let kind = self.resolve(row, col);
        let not_removable = GridError::NotIndependentlyRemovable { row, col, kind };
        match kind {
            NodeKind::Empty => Ok(()),
            NodeKind::Control => match self.find_controlling_gate(row, col) {
                Some(gate_row) => self.delete_gate(gate_row, col),
                None => Err(not_removable),
            },
            NodeKind::Trace => Err(not_removable),
            NodeKind::Swap if self.cells[row][col].kind() == NodeKind::Empty => Err(not_removable),
            _ => self.delete_gate(row, col),
        }
    }

    fn delete_gate(&mut self, gate_row: usize, col: usize) -> GridResult<()> {
        let gate = self.cells[gate_row][col].clone();

        // Farther control wins; equal distance prefers the higher row.
        let end = gate
            .controls()
            .max_by_key(|&ctrl| (ctrl.abs_diff(gate_row), ctrl))
            .or(gate.swap_partner())
            .unwrap_or(gate_row);
        let (lo, hi) = (gate_row.min(end), gate_row.max(end));

        // Clearing a row releases its node, so fillers outside the range go too.
        for row in lo..=hi {
            self.clear(row, col)?;
        }
        Ok(())
    }

    // ── Rotation ──────────────────────────────────────────────────────────────

    /// Add `delta_theta` to the gate's angle, modulo a full turn.
    pub fn rotate(&mut self, row: usize, col: usize, delta_theta: f64) -> GridResult<()> {
        self.check(row, col)?;

        let node = &self.cells[row][col];
        let kind = self.resolve(row, col);
        if !node.kind().is_rotatable() {
            return Err(GridError::Unrotatable(kind));
        }

        let theta = (node.theta() + delta_theta).rem_euclid(TAU);
        let updated = node.clone().with_theta(theta);
        if updated.controls().next().is_some() && !updated.kind().is_controlled() {
            return Err(GridError::Unrotatable(kind));
        }

        self.place_node(row, col, updated)
    }

    // ── Compilation ───────────────────────────────────────────────────────────

    /// Linearize the grid into a line-delimited instruction stream.
    ///
    /// Columns run left to right and rows top to bottom; only physical nodes
    /// emit, so derived markers never produce duplicate instructions.
    pub fn compile_program(&self) -> String {
        let mut sb = String::new();
        sb.push_str("OPENQASM 2.0;\n");
        sb.push_str("include \"qelib1.inc\";\n");
        sb.push_str(&format!("qreg q[{}];\n", self.qubit_count));
        sb.push_str(&format!("creg c[{}];\n", self.qubit_count));
        // Some backends reject a program with no gates.
        sb.push_str("id q;\n");

        for col in 0..self.depth {
            for row in 0..self.qubit_count {
                if let Some(fragment) = self.cells[row][col].emit() {
                    sb.push_str(&fragment);
                    sb.push('\n');
                }
            }
        }
        sb
    }

    /// Reallocate an all-empty matrix of the same dimensions.
    pub fn reset(&mut self) {
        *self = Grid::new(self.qubit_count, self.depth);
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CircuitGrid:")?;
        for row in 0..self.qubit_count {
            writeln!(f)?;
            let kinds: Vec<String> = (0..self.depth)
                .map(|col| self.resolve(row, col).to_string())
                .collect();
            write!(f, "{}", kinds.join(", "))?;
        }
        Ok(())
    }
}

/// Rows strictly between `a` and `b`, in either order.
fn strictly_between(a: usize, b: usize) -> Range<usize> {
    (a.min(b) + 1)..a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Axis, ControlledBase};
    use std::f64::consts::PI;

    const CX: NodeKind = NodeKind::Controlled(ControlledBase::PauliX);

    fn kinds(grid: &Grid, col: usize) -> Vec<NodeKind> {
        (0..grid.qubit_count())
            .map(|row| grid.effective_kind(row, col).unwrap())
            .collect()
    }

    fn with_gate(qubits: usize, row: usize, kind: NodeKind) -> Grid {
        let mut grid = Grid::new(qubits, 2);
        grid.place_node(row, 0, Node::new(kind)).unwrap();
        grid
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(3, 4);
        assert_eq!(grid.qubit_count(), 3);
        assert_eq!(grid.depth(), 4);
        for col in 0..4 {
            assert_eq!(kinds(&grid, col), vec![NodeKind::Empty; 3]);
        }
        assert_eq!(grid.node(2, 3).unwrap().qubit_index(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut grid = Grid::new(2, 2);
        assert_eq!(
            grid.effective_kind(2, 0),
            Err(GridError::OutOfRange { row: 2, col: 0 })
        );
        assert!(matches!(
            grid.place_node(0, 5, Node::new(NodeKind::Hadamard)),
            Err(GridError::OutOfRange { .. })
        ));
        assert!(matches!(
            grid.place_node(0, 0, Node::new(NodeKind::PauliX).with_ctrl_a(Some(7))),
            Err(GridError::OutOfRange { row: 7, .. })
        ));
        assert_eq!(grid, Grid::new(2, 2));
    }

    #[test]
    fn test_place_node_sets_row_and_writes_control_markers() {
        let mut grid = Grid::new(3, 1);
        let node = Node::new(NodeKind::PauliX).with_ctrl_a(Some(0)).at_row(9);
        grid.place_node(2, 0, node).unwrap();

        assert_eq!(grid.node(2, 0).unwrap().qubit_index(), 2);
        assert_eq!(grid.node(0, 0).unwrap().kind(), NodeKind::Control);
        assert_eq!(kinds(&grid, 0), vec![NodeKind::Control, NodeKind::Empty, CX]);
    }

    #[test]
    fn test_place_node_releases_overwritten_markers() {
        let mut grid = Grid::new(3, 1);
        grid.place_node(2, 0, Node::new(NodeKind::PauliX).with_ctrl_a(Some(0)))
            .unwrap();
        grid.place_node(2, 0, Node::new(NodeKind::Hadamard)).unwrap();

        assert_eq!(
            kinds(&grid, 0),
            vec![NodeKind::Empty, NodeKind::Empty, NodeKind::Hadamard]
        );
    }

    #[test]
    fn test_place_node_rejects_claimed_row() {
        let mut grid = Grid::new(4, 1);
        grid.place_node(0, 0, Node::new(NodeKind::PauliX).with_ctrl_a(Some(1)))
            .unwrap();
        let before = grid.clone();

        let err = grid
            .place_node(3, 0, Node::new(NodeKind::PauliZ).with_ctrl_a(Some(1)))
            .unwrap_err();
        assert!(matches!(err, GridError::Occupied { row: 1, .. }));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_place_node_rejects_self_link() {
        let mut grid = Grid::new(2, 1);
        let err = grid
            .place_node(1, 0, Node::new(NodeKind::PauliX).with_ctrl_a(Some(1)))
            .unwrap_err();
        assert!(matches!(err, GridError::Occupied { row: 1, .. }));
    }

    #[test]
    fn test_effective_kind_derives_swap() {
        let mut grid = with_gate(3, 0, NodeKind::Swap);
        grid.place_swap(0, 2, 0).unwrap();
        assert_eq!(
            kinds(&grid, 0),
            vec![NodeKind::Swap, NodeKind::Empty, NodeKind::Swap]
        );
        assert_eq!(grid.node(2, 0).unwrap().kind(), NodeKind::Empty);
    }

    #[test]
    fn test_find_controlling_gate() {
        let mut grid = with_gate(3, 1, NodeKind::Hadamard);
        assert_eq!(grid.find_controlling_gate(0, 0), None);
        grid.place_control(1, 0, 0).unwrap();
        assert_eq!(grid.find_controlling_gate(0, 0), Some(1));
        assert_eq!(grid.find_controlling_gate(0, 1), None);
        assert_eq!(grid.find_controlling_gate(0, 9), None);
    }

    #[test]
    fn test_place_control_clears_candidate() {
        let mut grid = with_gate(3, 1, NodeKind::PauliX);
        assert_eq!(grid.place_control(1, 0, 0), Ok(0));
        assert_eq!(grid.node(0, 0).unwrap().kind(), NodeKind::Empty);
        assert_eq!(kinds(&grid, 0)[0], NodeKind::Control);
        assert_eq!(grid.node(1, 0).unwrap().kind(), CX);
    }

    #[test]
    fn test_place_control_occupied() {
        let mut grid = with_gate(3, 1, NodeKind::PauliX);
        grid.place_node(0, 0, Node::new(NodeKind::Hadamard)).unwrap();
        let before = grid.clone();

        assert!(matches!(
            grid.place_control(1, 0, 0),
            Err(GridError::Occupied {
                row: 0,
                kind: NodeKind::Hadamard,
                ..
            })
        ));
        assert!(matches!(
            grid.place_control(1, 1, 0),
            Err(GridError::Occupied { row: 1, .. })
        ));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_place_control_uncontrollable() {
        let mut grid = with_gate(3, 1, NodeKind::Measure);
        assert_eq!(
            grid.place_control(1, 0, 0),
            Err(GridError::Uncontrollable(NodeKind::Measure))
        );

        let mut empty = Grid::new(2, 1);
        assert_eq!(
            empty.place_control(1, 0, 0),
            Err(GridError::Uncontrollable(NodeKind::Empty))
        );
    }

    #[test]
    fn test_place_control_on_trace() {
        let mut grid = with_gate(4, 3, NodeKind::PauliX);
        grid.place_control(3, 2, 0).unwrap();
        grid.move_control(3, 0, Direction::Up).unwrap();
        assert_eq!(grid.effective_kind(2, 0), Ok(NodeKind::Trace));

        grid.place_control(3, 2, 0).unwrap();
        assert_eq!(kinds(&grid, 0)[1..], [NodeKind::Empty, NodeKind::Control, CX]);
    }

    #[test]
    fn test_second_control_makes_toffoli() {
        let mut grid = with_gate(5, 2, NodeKind::PauliX);
        grid.place_control(2, 0, 0).unwrap();
        grid.place_second_control(2, 4, 0).unwrap();

        assert_eq!(grid.node(2, 0).unwrap().kind(), NodeKind::Toffoli);
        assert_eq!(kinds(&grid, 0)[4], NodeKind::Control);
        assert!(grid.compile_program().contains("ccx q[0],q[4],q[2];\n"));
    }

    #[test]
    fn test_second_control_requires_controlled_x() {
        let mut grid = with_gate(3, 1, NodeKind::PauliX);
        assert_eq!(
            grid.place_second_control(1, 0, 0),
            Err(GridError::Uncontrollable(NodeKind::PauliX))
        );

        let mut grid = with_gate(3, 1, NodeKind::Hadamard);
        grid.place_control(1, 0, 0).unwrap();
        assert!(matches!(
            grid.place_second_control(1, 2, 0),
            Err(GridError::Uncontrollable(_))
        ));
    }

    #[test]
    fn test_remove_controls_clears_traces() {
        let mut grid = with_gate(4, 3, NodeKind::PauliX);
        grid.place_control(3, 2, 0).unwrap();
        grid.move_control(3, 0, Direction::Up).unwrap();
        grid.move_control(3, 0, Direction::Up).unwrap();
        assert_eq!(
            kinds(&grid, 0),
            vec![NodeKind::Control, NodeKind::Trace, NodeKind::Trace, CX]
        );

        grid.remove_controls(3, 0).unwrap();
        assert_eq!(
            kinds(&grid, 0),
            vec![
                NodeKind::Empty,
                NodeKind::Empty,
                NodeKind::Empty,
                NodeKind::PauliX
            ]
        );
    }

    #[test]
    fn test_moving_control_back_keeps_spanned_traces() {
        let mut grid = with_gate(6, 1, NodeKind::PauliX);
        grid.place_control(1, 2, 0).unwrap();
        for _ in 0..3 {
            grid.move_control(1, 0, Direction::Down).unwrap();
        }
        assert_eq!(grid.effective_kind(4, 0), Ok(NodeKind::Trace));

        assert_eq!(grid.move_control(1, 0, Direction::Up), Ok(4));
        assert_eq!(
            kinds(&grid, 0),
            vec![
                NodeKind::Empty,
                CX,
                NodeKind::Trace,
                NodeKind::Trace,
                NodeKind::Control,
                NodeKind::Empty
            ]
        );
    }

    #[test]
    fn test_clearing_gate_outside_range_drops_its_traces() {
        let mut grid = with_gate(6, 2, NodeKind::PauliX);
        grid.place_control(2, 1, 0).unwrap();
        for _ in 0..3 {
            grid.move_control(2, 0, Direction::Down).unwrap();
        }
        assert_eq!(grid.move_control(2, 0, Direction::Down).ok(), None);
        assert_eq!(grid.effective_kind(3, 0), Ok(NodeKind::Trace));
        assert_eq!(grid.effective_kind(4, 0), Ok(NodeKind::Trace));

        grid.place_node(1, 0, Node::new(NodeKind::PauliX)).unwrap();
        grid.place_control(1, 0, 0).unwrap();
        grid.place_second_control(1, 3, 0).unwrap();
        assert_eq!(grid.effective_kind(1, 0), Ok(NodeKind::Toffoli));

        grid.delete_node(1, 0).unwrap();
        assert_eq!(grid, Grid::new(6, 2));
    }

    #[test]
    fn test_traces_spanned_by_another_gate_survive() {
        let mut grid = with_gate(6, 0, NodeKind::PauliX);
        grid.place_control(0, 1, 0).unwrap();
        for _ in 0..3 {
            grid.move_control(0, 0, Direction::Down).unwrap();
        }
        grid.place_node(5, 0, Node::new(NodeKind::PauliZ)).unwrap();
        assert_eq!(grid.place_control(5, 2, 0), Ok(2));

        grid.remove_controls(5, 0).unwrap();
        assert_eq!(grid.effective_kind(1, 0), Ok(NodeKind::Trace));
        assert_eq!(grid.effective_kind(3, 0), Ok(NodeKind::Trace));
        assert_eq!(grid.effective_kind(4, 0), Ok(NodeKind::Control));
    }

    #[test]
    fn test_place_node_rejects_control_on_uncontrollable_kind() {
        let mut grid = Grid::new(3, 1);
        let before = grid.clone();

        let err = grid
            .place_node(1, 0, Node::new(NodeKind::S).with_ctrl_a(Some(0)))
            .unwrap_err();
        assert_eq!(err, GridError::Uncontrollable(NodeKind::S));

        let err = grid
            .place_node(
                1,
                0,
                Node::new(NodeKind::PauliZ).with_ctrl_a(Some(0)).with_ctrl_b(Some(2)),
            )
            .unwrap_err();
        assert!(matches!(err, GridError::Uncontrollable(_)));
        assert_eq!(grid, before);
        assert!(!grid.compile_program().contains("q[0],q[1]"));
    }

    #[test]
    fn test_move_control_skips_gate_row() {
        let mut grid = with_gate(3, 1, NodeKind::PauliZ);
        grid.place_control(1, 0, 0).unwrap();

        assert_eq!(grid.move_control(1, 0, Direction::Down), Ok(2));
        assert_eq!(
            kinds(&grid, 0),
            vec![
                NodeKind::Empty,
                NodeKind::Controlled(ControlledBase::PauliZ),
                NodeKind::Control
            ]
        );
    }

    #[test]
    fn test_move_control_blocked() {
        let mut grid = with_gate(3, 1, NodeKind::PauliX);
        assert_eq!(
            grid.move_control(1, 0, Direction::Up),
            Err(GridError::Blocked { gate_row: 1, col: 0 })
        );

        grid.place_control(1, 0, 0).unwrap();
        let before = grid.clone();
        assert!(grid.move_control(1, 0, Direction::Up).is_err());
        assert!(grid.move_control(1, 0, Direction::Left).is_err());
        assert_eq!(grid, before);

        grid.place_node(2, 0, Node::new(NodeKind::Hadamard)).unwrap();
        let before = grid.clone();
        assert_eq!(
            grid.move_control(1, 0, Direction::Down),
            Err(GridError::Blocked { gate_row: 1, col: 0 })
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_move_control_stamps_trace() {
        let mut grid = with_gate(4, 3, NodeKind::PauliX);
        grid.place_control(3, 2, 0).unwrap();
        assert_eq!(grid.move_control(3, 0, Direction::Up), Ok(1));
        assert_eq!(grid.node(2, 0).unwrap().kind(), NodeKind::Trace);
        assert_eq!(
            grid.compile_program().lines().last(),
            Some("cx q[1],q[3];")
        );

        // Moving back toward the gate consumes the filler.
        assert_eq!(grid.move_control(3, 0, Direction::Down), Ok(2));
        assert_eq!(
            kinds(&grid, 0),
            vec![NodeKind::Empty, NodeKind::Empty, NodeKind::Control, CX]
        );
    }

    #[test]
    fn test_move_control_rejects_toffoli() {
        let mut grid = with_gate(5, 2, NodeKind::PauliX);
        grid.place_control(2, 1, 0).unwrap();
        grid.place_second_control(2, 3, 0).unwrap();
        assert!(matches!(
            grid.move_control(2, 0, Direction::Up),
            Err(GridError::Blocked { .. })
        ));
    }

    #[test]
    fn test_delete_plain_gate() {
        let mut grid = with_gate(2, 0, NodeKind::Hadamard);
        grid.delete_node(0, 0).unwrap();
        assert_eq!(grid, Grid::new(2, 2));
        assert_eq!(grid.delete_node(0, 0), Ok(()));
    }

    #[test]
    fn test_delete_controlled_gate_clears_range() {
        let mut grid = with_gate(4, 3, NodeKind::PauliX);
        grid.place_control(3, 2, 0).unwrap();
        grid.move_control(3, 0, Direction::Up).unwrap();
        grid.delete_node(3, 0).unwrap();
        assert_eq!(grid, Grid::new(4, 2));
    }

    #[test]
    fn test_delete_from_control_cell() {
        let mut grid = with_gate(3, 2, NodeKind::Hadamard);
        grid.place_control(2, 0, 0).unwrap();
        grid.delete_node(0, 0).unwrap();
        assert_eq!(grid, Grid::new(3, 2));
    }

    #[test]
    fn test_delete_from_physical_control_marker() {
        let mut grid = Grid::new(3, 1);
        grid.place_node(2, 0, Node::new(NodeKind::PauliX).with_ctrl_a(Some(1)))
            .unwrap();
        grid.delete_node(1, 0).unwrap();
        assert_eq!(grid, Grid::new(3, 1));
    }

    #[test]
    fn test_delete_rejects_derived_and_filler_cells() {
        let mut grid = with_gate(4, 3, NodeKind::Swap);
        grid.place_swap(3, 0, 0).unwrap();
        let before = grid.clone();
        assert!(matches!(
            grid.delete_node(0, 0),
            Err(GridError::NotIndependentlyRemovable {
                kind: NodeKind::Swap,
                ..
            })
        ));
        assert_eq!(grid, before);

        let mut grid = with_gate(4, 3, NodeKind::PauliX);
        grid.place_control(3, 2, 0).unwrap();
        grid.move_control(3, 0, Direction::Up).unwrap();
        assert!(matches!(
            grid.delete_node(2, 0),
            Err(GridError::NotIndependentlyRemovable {
                kind: NodeKind::Trace,
                ..
            })
        ));
    }

    #[test]
    fn test_delete_swap_gate_clears_partner_range() {
        let mut grid = with_gate(3, 0, NodeKind::Swap);
        grid.place_swap(0, 2, 0).unwrap();
        grid.delete_node(0, 0).unwrap();
        assert_eq!(grid, Grid::new(3, 2));
    }

    #[test]
    fn test_delete_toffoli_prefers_farther_control() {
        let mut grid = with_gate(5, 1, NodeKind::PauliX);
        grid.place_control(1, 0, 0).unwrap();
        grid.place_second_control(1, 4, 0).unwrap();
        grid.place_node(3, 1, Node::new(NodeKind::Hadamard)).unwrap();

        grid.delete_node(1, 0).unwrap();
        assert_eq!(kinds(&grid, 0), vec![NodeKind::Empty; 5]);
        assert_eq!(grid.effective_kind(3, 1), Ok(NodeKind::Hadamard));
    }

    #[test]
    fn test_swap_requires_swap_gate() {
        let mut grid = with_gate(3, 0, NodeKind::Hadamard);
        assert_eq!(
            grid.place_swap(0, 1, 0),
            Err(GridError::Unswappable(NodeKind::Hadamard))
        );
    }

    #[test]
    fn test_rotate() {
        let mut grid = with_gate(1, 0, NodeKind::PauliY);
        grid.rotate(0, 0, PI / 4.0).unwrap();
        assert_eq!(grid.node(0, 0).unwrap().kind(), NodeKind::Rotated(Axis::Y));

        grid.rotate(0, 0, -PI / 4.0).unwrap();
        assert_eq!(grid.node(0, 0).unwrap().kind(), NodeKind::PauliY);

        grid.rotate(0, 0, TAU).unwrap();
        assert_eq!(grid.node(0, 0).unwrap().kind(), NodeKind::PauliY);
    }

    #[test]
    fn test_rotate_wraps_full_turn() {
        let mut grid = with_gate(1, 0, NodeKind::PauliX);
        grid.rotate(0, 0, 3.0 * PI / 2.0).unwrap();
        let theta = grid.node(0, 0).unwrap().theta();
        assert!((theta - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_rejects_non_rotatable() {
        let mut grid = with_gate(3, 1, NodeKind::Hadamard);
        assert_eq!(
            grid.rotate(1, 0, 0.5),
            Err(GridError::Unrotatable(NodeKind::Hadamard))
        );
        assert_eq!(
            grid.rotate(0, 0, 0.5),
            Err(GridError::Unrotatable(NodeKind::Empty))
        );
    }

    #[test]
    fn test_rotate_controlled() {
        let mut grid = with_gate(2, 1, NodeKind::PauliZ);
        grid.place_control(1, 0, 0).unwrap();
        grid.rotate(1, 0, 0.5).unwrap();
        assert_eq!(
            grid.node(1, 0).unwrap().kind(),
            NodeKind::Controlled(ControlledBase::RotatedZ)
        );

        let mut grid = with_gate(2, 1, NodeKind::PauliX);
        grid.place_control(1, 0, 0).unwrap();
        let before = grid.clone();
        assert_eq!(grid.rotate(1, 0, 0.5), Err(GridError::Unrotatable(CX)));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_compile_empty_grid() {
        let grid = Grid::new(2, 3);
        assert_eq!(
            grid.compile_program(),
            "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\nid q;\n"
        );
    }

    #[test]
    fn test_compile_column_major_order() {
        let mut grid = Grid::new(2, 2);
        grid.place_node(1, 0, Node::new(NodeKind::Hadamard)).unwrap();
        grid.place_node(0, 1, Node::new(NodeKind::Measure)).unwrap();
        grid.place_node(0, 0, Node::new(NodeKind::T)).unwrap();
        grid.place_node(1, 1, Node::new(NodeKind::SDagger)).unwrap();

        let program = grid.compile_program();
        let body: Vec<&str> = program.lines().skip(5).collect();
        assert_eq!(
            body,
            vec!["t q[0];", "h q[1];", "measure q[0] -> c[0];", "sdg q[1];"]
        );
    }

    #[test]
    fn test_reset() {
        let mut grid = with_gate(3, 1, NodeKind::PauliX);
        grid.place_control(1, 0, 0).unwrap();
        grid.reset();
        assert_eq!(grid, Grid::new(3, 2));
        grid.reset();
        assert_eq!(grid, Grid::new(3, 2));
    }

    #[test]
    fn test_display() {
        let mut grid = with_gate(2, 1, NodeKind::PauliX);
        grid.place_control(1, 0, 0).unwrap();
        assert_eq!(
            grid.to_string(),
            "CircuitGrid:\ncontrol, empty\ncx, empty"
        );
    }

    #[test]
    fn test_grid_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Grid>();
    }
}
