//! Symbol tables owned by the assembly session: defined labels, entry
//! requests, extern declarations, and the pending references the second
//! pass patches.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub const LABEL_MAX_LENGTH: usize = 31;

static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z][A-Za-z0-9]*$").expect("invalid label regex"));

/// Whether `name` has label shape: leading letter, alphanumerics after,
/// and not a reserved word. Length is checked separately so the
/// too-long diagnostic wins over the format one.
pub fn is_valid_name(name: &str) -> bool {
    !crate::op::is_reserved(name) && LABEL_REGEX.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Defined in front of `.data`/`.string`; address is a DC offset
    /// until the end-of-pass shift.
    Data,
    /// Defined in front of an instruction; address is an IC value.
    Code,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub name: String,
    pub line: usize,
    pub kind: LabelKind,
    pub address: usize,
}

#[derive(Debug, Default)]
pub struct Labels {
    labels: HashMap<String, Label>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) {
        self.labels.insert(label.name.clone(), label);
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    /// Move every data-bearing label after the code image. Called once,
    /// when the first pass has the final IC.
    pub fn shift_data(&mut self, final_ic: usize) {
        for label in self.labels.values_mut() {
            if label.kind == LabelKind::Data {
                label.address += final_ic;
            }
        }
    }
}

/// A `.entry NAME` request, resolved during the second pass.
#[derive(Debug, Clone)]
pub struct EntryRequest {
    pub name: String,
    pub line: usize,
}

/// A `.extern NAME` declaration.
#[derive(Debug, Clone)]
pub struct ExternDecl {
    pub name: String,
    pub line: usize,
}

/// A direct operand whose label address was unknown at first-pass time.
/// `address` is the word address of the operand slot.
#[derive(Debug, Clone)]
pub struct PendingRef {
    pub name: String,
    pub line: usize,
    pub address: usize,
}
