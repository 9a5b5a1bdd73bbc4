//! Grid cell values and their gate-kind lattice.
//!
//! A [`Node`] never stores its kind independently of its fields: every
//! constructor and builder re-derives [`NodeKind`] from the stripped base
//! identity plus the presence of controls and a non-trivial rotation.

use std::f64::consts::PI;
use std::fmt;
use std::iter;

/// Rotation angle at which a rotatable gate reads as its plain form.
pub const FIXED_POINT: f64 = PI;

/// Distance from [`FIXED_POINT`] below which an angle counts as unrotated.
pub const ROTATION_TOLERANCE: f64 = 1e-4;

/// Whether `theta` reads as the unrotated fixed point.
#[inline]
pub fn is_fixed_point(theta: f64) -> bool {
    (theta - FIXED_POINT).abs() <= ROTATION_TOLERANCE
}

/// Axis of a rotated Pauli gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The plain Pauli kind this axis rotates.
    pub fn plain(self) -> NodeKind {
        match self {
            Axis::X => NodeKind::PauliX,
            Axis::Y => NodeKind::PauliY,
            Axis::Z => NodeKind::PauliZ,
        }
    }
}

/// Target of a singly-controlled gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlledBase {
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    Swap,
    RotatedZ,
}

impl ControlledBase {
    /// The uncontrolled kind, with rotation still applied.
    pub fn uncontrolled(self) -> NodeKind {
        match self {
            ControlledBase::PauliX => NodeKind::PauliX,
            ControlledBase::PauliY => NodeKind::PauliY,
            ControlledBase::PauliZ => NodeKind::PauliZ,
            ControlledBase::Hadamard => NodeKind::Hadamard,
            ControlledBase::Swap => NodeKind::Swap,
            ControlledBase::RotatedZ => NodeKind::Rotated(Axis::Z),
        }
    }
}

/// Identity of a grid cell, including the derived rotated/controlled forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    #[default]
    Empty,
    Identity,
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    S,
    SDagger,
    T,
    TDagger,
    Swap,
    Measure,
    /// Control input for a gate elsewhere in the column.
    Control,
    /// Pass-through wire between a gate and a non-adjacent partner.
    Trace,
    Rotated(Axis),
    Controlled(ControlledBase),
    /// Doubly-controlled X.
    Toffoli,
}

impl NodeKind {
    /// Strip every rotation and control layer.
    pub fn base(self) -> NodeKind {
        match self {
            NodeKind::Rotated(axis) => axis.plain(),
            NodeKind::Controlled(target) => target.uncontrolled().base(),
            NodeKind::Toffoli => NodeKind::PauliX,
            other => other,
        }
    }

    /// Kinds that never emit an instruction.
    pub fn is_null(self) -> bool {
        matches!(self, NodeKind::Empty | NodeKind::Control | NodeKind::Trace)
    }

    /// Markers the grid writes itself; never placed by a user.
    pub fn is_structural(self) -> bool {
        matches!(self, NodeKind::Control | NodeKind::Trace)
    }

    /// Whether the base identity accepts a rotation angle.
    pub fn is_rotatable(self) -> bool {
        matches!(
            self.base(),
            NodeKind::PauliX | NodeKind::PauliY | NodeKind::PauliZ
        )
    }

    /// Rotated form of a plain Pauli kind.
    pub fn rotated(self) -> Option<NodeKind> {
        match self {
            NodeKind::PauliX => Some(NodeKind::Rotated(Axis::X)),
            NodeKind::PauliY => Some(NodeKind::Rotated(Axis::Y)),
            NodeKind::PauliZ => Some(NodeKind::Rotated(Axis::Z)),
            _ => None,
        }
    }

    /// Singly-controlled form of this kind, if it has one.
    pub fn controlled(self) -> Option<NodeKind> {
        let target = match self {
            NodeKind::PauliX => ControlledBase::PauliX,
            NodeKind::PauliY => ControlledBase::PauliY,
            NodeKind::PauliZ => ControlledBase::PauliZ,
            NodeKind::Hadamard => ControlledBase::Hadamard,
            NodeKind::Swap => ControlledBase::Swap,
            NodeKind::Rotated(Axis::Z) => ControlledBase::RotatedZ,
            _ => return None,
        };
        Some(NodeKind::Controlled(target))
    }

    /// Whether the kind carries at least one control link.
    pub fn is_controlled(self) -> bool {
        matches!(self, NodeKind::Controlled(_) | NodeKind::Toffoli)
    }

    /// Instruction name; `None` for kinds that never emit.
    pub fn qasm_name(self) -> Option<&'static str> {
        let name = match self {
            NodeKind::Empty | NodeKind::Control | NodeKind::Trace => return None,
            NodeKind::Identity => "id",
            NodeKind::PauliX => "x",
            NodeKind::PauliY => "y",
            NodeKind::PauliZ => "z",
            NodeKind::Hadamard => "h",
            NodeKind::S => "s",
            NodeKind::SDagger => "sdg",
            NodeKind::T => "t",
            NodeKind::TDagger => "tdg",
            NodeKind::Swap => "swap",
            NodeKind::Measure => "measure",
            NodeKind::Rotated(Axis::X) => "rx",
            NodeKind::Rotated(Axis::Y) => "ry",
            NodeKind::Rotated(Axis::Z) => "rz",
            NodeKind::Controlled(ControlledBase::PauliX) => "cx",
            NodeKind::Controlled(ControlledBase::PauliY) => "cy",
            NodeKind::Controlled(ControlledBase::PauliZ) => "cz",
            NodeKind::Controlled(ControlledBase::Hadamard) => "ch",
            NodeKind::Controlled(ControlledBase::Swap) => "cswap",
            NodeKind::Controlled(ControlledBase::RotatedZ) => "crz",
            NodeKind::Toffoli => "ccx",
        };
        Some(name)
    }

    /// Short label for drawing the cell's own (target) glyph.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Empty => "",
            NodeKind::Identity => "I",
            NodeKind::PauliX => "X",
            NodeKind::PauliY => "Y",
            NodeKind::PauliZ => "Z",
            NodeKind::Hadamard => "H",
            NodeKind::S => "S",
            NodeKind::SDagger => "S†",
            NodeKind::T => "T",
            NodeKind::TDagger => "T†",
            NodeKind::Swap => "×",
            NodeKind::Measure => "M",
            NodeKind::Control => "●",
            NodeKind::Trace => "┼",
            NodeKind::Rotated(Axis::X) => "RX",
            NodeKind::Rotated(Axis::Y) => "RY",
            NodeKind::Rotated(Axis::Z) => "RZ",
            NodeKind::Controlled(ControlledBase::PauliX) | NodeKind::Toffoli => "⊕",
            NodeKind::Controlled(ControlledBase::PauliY) => "Y",
            NodeKind::Controlled(ControlledBase::PauliZ) => "●",
            NodeKind::Controlled(ControlledBase::Hadamard) => "H",
            NodeKind::Controlled(ControlledBase::Swap) => "×",
            NodeKind::Controlled(ControlledBase::RotatedZ) => "RZ",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Empty => f.write_str("empty"),
            NodeKind::Control => f.write_str("control"),
            NodeKind::Trace => f.write_str("trace"),
            other => f.write_str(other.qasm_name().unwrap_or("?")),
        }
    }
}

/// One cell of the circuit grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    kind: NodeKind,
    qubit_index: usize,
    theta: f64,
    phi: Option<f64>,
    lambda: Option<f64>,
    ctrl_a: Option<usize>,
    ctrl_b: Option<usize>,
    swap_partner: Option<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Node::empty()
    }
}

impl Node {
    /// Build a node of `kind`, normalized against default fields.
    pub fn new(kind: NodeKind) -> Self {
        let mut node = Node {
            kind,
            qubit_index: 0,
            theta: FIXED_POINT,
            phi: None,
            lambda: None,
            ctrl_a: None,
            ctrl_b: None,
            swap_partner: None,
        };
        node.normalize();
        node
    }

    pub fn empty() -> Self {
        Node::new(NodeKind::Empty)
    }

    pub fn control() -> Self {
        Node::new(NodeKind::Control)
    }

    pub fn trace() -> Self {
        Node::new(NodeKind::Trace)
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self.normalize();
        self
    }

    pub fn with_phi(mut self, phi: Option<f64>) -> Self {
        self.phi = phi;
        self
    }

    pub fn with_lambda(mut self, lambda: Option<f64>) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_ctrl_a(mut self, ctrl_a: Option<usize>) -> Self {
        self.ctrl_a = ctrl_a;
        self.normalize();
        self
    }

    pub fn with_ctrl_b(mut self, ctrl_b: Option<usize>) -> Self {
        self.ctrl_b = ctrl_b;
        self.normalize();
        self
    }

    pub fn with_swap_partner(mut self, swap_partner: Option<usize>) -> Self {
        self.swap_partner = swap_partner;
        self
    }

    /// Row index is owned by the grid and rewritten on every placement.
    pub(crate) fn at_row(mut self, row: usize) -> Self {
        self.qubit_index = row;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn qubit_index(&self) -> usize {
        self.qubit_index
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> Option<f64> {
        self.phi
    }

    pub fn lambda(&self) -> Option<f64> {
        self.lambda
    }

    pub fn ctrl_a(&self) -> Option<usize> {
        self.ctrl_a
    }

    pub fn ctrl_b(&self) -> Option<usize> {
        self.ctrl_b
    }

    pub fn swap_partner(&self) -> Option<usize> {
        self.swap_partner
    }

    /// Control rows, `ctrl_a` first.
    pub fn controls(&self) -> impl Iterator<Item = usize> {
        self.ctrl_a.into_iter().chain(self.ctrl_b)
    }

    /// Every other row this node links to in its column.
    pub fn linked_rows(&self) -> impl Iterator<Item = usize> {
        self.controls().chain(self.swap_partner)
    }

    /// Whether this node names `row` as a control input.
    pub fn controls_row(&self, row: usize) -> bool {
        self.ctrl_a == Some(row) || self.ctrl_b == Some(row)
    }

    /// Whether this node names `row` as a control input or swap partner.
    pub fn claims(&self, row: usize) -> bool {
        self.controls_row(row) || self.swap_partner == Some(row)
    }

    // Rules run in a fixed order; each starts from the previous result.
    fn normalize(&mut self) {
        let mut kind = self.kind.base();

        if !is_fixed_point(self.theta) {
            if let Some(rotated) = kind.rotated() {
                kind = rotated;
            }
        }

        if self.ctrl_a.is_some() {
            if let Some(controlled) = kind.controlled() {
                kind = controlled;
            }
        }

        if self.ctrl_a.is_some()
            && self.ctrl_b.is_some()
            && matches!(
                kind,
                NodeKind::PauliX | NodeKind::Controlled(ControlledBase::PauliX)
            )
        {
            kind = NodeKind::Toffoli;
        }

        self.kind = kind;
    }

    /// Instruction fragment for this node, without a trailing newline.
    pub fn emit(&self) -> Option<String> {
        if self.kind.is_null() {
            return None;
        }

        if self.kind == NodeKind::Measure {
            let q = self.qubit_index;
            return Some(format!("measure q[{q}] -> c[{q}];"));
        }

        let mut out = String::from(self.kind.qasm_name()?);

        if !is_fixed_point(self.theta) {
            let params: Vec<String> = iter::once(self.theta)
                .chain(self.phi)
                .chain(self.lambda)
                .map(|p| p.to_string())
                .collect();
            out.push_str(&format!("({})", params.join(",")));
        }

        let operands: Vec<String> = self
            .linked_rows()
            .chain(iter::once(self.qubit_index))
            .map(|q| format!("q[{q}]"))
            .collect();
        out.push(' ');
        out.push_str(&operands.join(","));
        out.push(';');

        Some(out)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type: {}, qubit index: {}", self.kind, self.qubit_index)?;
        if !is_fixed_point(self.theta) {
            write!(f, ", theta: {}", self.theta)?;
        }
        if let Some(phi) = self.phi {
            write!(f, ", phi: {phi}")?;
        }
        if let Some(lambda) = self.lambda {
            write!(f, ", lambda: {lambda}")?;
        }
        if let Some(ctrl_a) = self.ctrl_a {
            write!(f, ", ctrl_a: {ctrl_a}")?;
        }
        if let Some(ctrl_b) = self.ctrl_b {
            write!(f, ", ctrl_b: {ctrl_b}")?;
        }
        if let Some(swap) = self.swap_partner {
            write!(f, ", swap: {swap}")?;
        }
        Ok(())
    }
}
