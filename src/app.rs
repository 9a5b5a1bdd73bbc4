use std::path::PathBuf;

use q_grid::grid::Direction;
use q_grid::node::NodeKind;
use q_grid::palette::entry_for_key;
use q_grid::params::format_angle;
use q_grid::Editor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    Circuit,
    Qasm,
    InputAngle,
}

pub struct App {
    pub editor: Editor,
    pub output_path: PathBuf,
    pub focus: Focus,

    // Read-only program view
    pub qasm_scroll: u16,

    // Angle prompt
    pub angle_input: String,

    pub show_help: bool,
}

impl App {
    pub fn new(editor: Editor, output_path: PathBuf) -> Self {
        App {
            editor,
            output_path,
            focus: Focus::Circuit,
            qasm_scroll: 0,
            angle_input: String::new(),
            show_help: false,
        }
    }

    pub fn status_msg(&self) -> &str {
        &self.editor.status_msg
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.editor.status_msg = msg.into();
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.editor.move_cursor(direction);
    }

    /// Palette key on the selected cell. Returns false if the key is not a gate.
    pub fn toggle_palette_gate(&mut self, key: char) -> bool {
        let Some(entry) = entry_for_key(key) else {
            return false;
        };
        let (row, col) = self.editor.selection();
        // Failures land in the status line.
        let _ = self.editor.toggle_gate(row, col, entry.kind);
        true
    }

    pub fn toggle_control(&mut self) {
        let (row, col) = self.editor.selection();
        let _ = self.editor.toggle_control(row, col);
    }

    pub fn add_second_control(&mut self) {
        let (row, col) = self.editor.selection();
        let _ = self.editor.add_second_control(row, col);
    }

    pub fn toggle_swap(&mut self) {
        let (row, col) = self.editor.selection();
        let _ = self.editor.toggle_swap(row, col);
    }

    pub fn move_control(&mut self, direction: Direction) {
        let (row, col) = self.editor.selection();
        let _ = self.editor.move_control(row, col, direction);
    }

    pub fn delete_selected(&mut self) {
        let (row, col) = self.editor.selection();
        let _ = self.editor.delete(row, col);
    }

    /// Rotate the selected gate by `steps` rotation steps.
    pub fn rotate_selected(&mut self, steps: f64) {
        let (row, col) = self.editor.selection();
        let delta = steps * self.editor.rotation_step();
        if self.editor.rotate(row, col, delta).is_ok() {
            if let Ok(node) = self.editor.grid().node(row, col) {
                let theta = format_angle(node.theta());
                self.set_status(format!("theta = {theta}"));
            }
        }
    }

    /// Open the angle prompt if the selected gate can take one.
    pub fn begin_angle_input(&mut self) {
        let (row, col) = self.editor.selection();
        let Ok(node) = self.editor.grid().node(row, col) else {
            return;
        };
        if !node.kind().is_rotatable() {
            let kind = self.editor.selected_kind();
            let msg = if kind == NodeKind::Empty {
                "Select a gate to set its angle".to_string()
            } else {
                format!("{kind} cannot be rotated")
            };
            self.set_status(msg);
            return;
        }
        self.angle_input = format_angle(node.theta());
        self.focus = Focus::InputAngle;
    }

    pub fn handle_char_input(&mut self, ch: char) {
        if matches!(ch, '0'..='9' | '.' | '-' | 'e' | 'E' | '+' | 'p' | 'P' | 'i' | 'I' | '*' | '/' | ' ') {
            self.angle_input.push(ch);
        }
    }

    pub fn submit_angle(&mut self) {
        let (row, col) = self.editor.selection();
        let input = std::mem::take(&mut self.angle_input);
        if self.editor.rotate_to(row, col, &input).is_ok() {
            self.set_status(format!("theta = {}", input.trim()));
        }
        self.focus = Focus::Circuit;
    }

    pub fn cancel_angle_input(&mut self) {
        self.angle_input.clear();
        self.focus = Focus::Circuit;
    }

    pub fn toggle_qasm_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Qasm => Focus::Circuit,
            _ => Focus::Qasm,
        };
    }

    pub fn scroll_qasm(&mut self, down: bool) {
        let lines = self.editor.compile().lines().count() as u16;
        self.qasm_scroll = if down {
            (self.qasm_scroll + 1).min(lines.saturating_sub(1))
        } else {
            self.qasm_scroll.saturating_sub(1)
        };
    }

    pub fn reset(&mut self) {
        self.editor.reset();
        self.qasm_scroll = 0;
        self.set_status("Circuit cleared");
    }

    pub fn save_circuit(&mut self) -> Result<(), std::io::Error> {
        self.editor.save(&self.output_path)
    }
}
