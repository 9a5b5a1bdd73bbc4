use crate::node::NodeKind;

#[derive(Clone, Debug)]
pub struct PaletteEntry {
    pub key: char,
    pub name: &'static str,
    pub kind: NodeKind,
}

/// Gates a user can drop onto an empty cell, one key each.
pub static PALETTE: &[PaletteEntry] = &[
    PaletteEntry { key: 'x', name: "Pauli-X (NOT)",     kind: NodeKind::PauliX },
    PaletteEntry { key: 'y', name: "Pauli-Y",           kind: NodeKind::PauliY },
    PaletteEntry { key: 'z', name: "Pauli-Z",           kind: NodeKind::PauliZ },
    PaletteEntry { key: 'h', name: "Hadamard",          kind: NodeKind::Hadamard },
    PaletteEntry { key: 's', name: "Phase (S)",         kind: NodeKind::S },
    PaletteEntry { key: 'S', name: "Phase Dagger (S†)", kind: NodeKind::SDagger },
    PaletteEntry { key: 't', name: "T Gate",            kind: NodeKind::T },
    PaletteEntry { key: 'T', name: "T Dagger (T†)",     kind: NodeKind::TDagger },
    PaletteEntry { key: 'i', name: "Identity",          kind: NodeKind::Identity },
    PaletteEntry { key: 'w', name: "SWAP",              kind: NodeKind::Swap },
    PaletteEntry { key: 'm', name: "Measure",           kind: NodeKind::Measure },
];

impl PaletteEntry {
    /// Whether the gate accepts a rotation angle.
    pub fn takes_angles(&self) -> bool {
        self.kind.is_rotatable()
    }
}

pub fn entry_for_key(key: char) -> Option<&'static PaletteEntry> {
    PALETTE.iter().find(|entry| entry.key == key)
}
