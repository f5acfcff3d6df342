//! The macro table: name to ordered body lines.
//!
//! Tables stay tiny (a handful of macros per file), so lookup is a
//! linear scan over the definition order.

#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Open a new definition. Body lines arrive through
    /// [`MacroTable::append_line`] until the definition is closed.
    pub fn define(&mut self, name: impl Into<String>) {
        self.macros.push(Macro {
            name: name.into(),
            lines: Vec::new(),
        });
    }

    /// Append a body line to the most recently defined macro.
    pub fn append_line(&mut self, line: impl Into<String>) {
        if let Some(last) = self.macros.last_mut() {
            last.lines.push(line.into());
        }
    }
}
