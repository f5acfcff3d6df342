//! Second pass: resolve labels, patch operand words, and render the
//! three output artifacts.

use std::fmt::Write;
use std::mem;

use itertools::Itertools;

use crate::diagnostics::{Diagnostics, ErrorKind};
use crate::pass_one::{PassOne, IC_BASE};
use crate::word::{Are, Word};

/// Total words the target can address; the code image must fit below.
pub const MEMORY_SIZE: usize = 4096;

/// The rendered output files. `entries`/`externals` are `None` when
/// they would be empty; the driver then writes nothing.
#[derive(Debug)]
pub struct Artifacts {
    pub object: String,
    pub entries: Option<String>,
    pub externals: Option<String>,
}

pub fn pass_two(mut pass: PassOne, diags: &mut Diagnostics) -> Artifacts {
    check_extern_definitions(&pass, diags);
    let entries = resolve_entries(&pass, diags);
    let externals = patch_references(&mut pass, diags);

    if pass.ic > MEMORY_SIZE {
        // The original reports this against the memory bound itself,
        // there being no single offending line.
        diags.report(ErrorKind::NotEnoughMemory, MEMORY_SIZE);
    }

    Artifacts {
        object: render_object(&pass),
        entries,
        externals,
    }
}

/// A name cannot be both declared extern and defined here.
fn check_extern_definitions(pass: &PassOne, diags: &mut Diagnostics) {
    for ext in &pass.externs {
        if pass.labels.contains(&ext.name) {
            diags.report(ErrorKind::ExternAlsoDefined, ext.line);
        }
    }
}

fn resolve_entries(pass: &PassOne, diags: &mut Diagnostics) -> Option<String> {
    let mut lines = Vec::new();
    for entry in &pass.entries {
        match pass.labels.get(&entry.name) {
            Some(label) => lines.push(format!("{} {:04}", entry.name, label.address)),
            None => diags.report(ErrorKind::EntryNotDefined, entry.line),
        }
    }
    (!lines.is_empty()).then(|| lines.iter().join("\n") + "\n")
}

/// Patch every pending reference. Defined labels become relocatable
/// addresses; externs become zero-valued external words and a `.ext`
/// line per reference site.
fn patch_references(pass: &mut PassOne, diags: &mut Diagnostics) -> Option<String> {
    let mut lines = Vec::new();
    let refs = mem::take(&mut pass.refs);

    for pending in &refs {
        let slot = pending.address - IC_BASE;
        if let Some(label) = pass.labels.get(&pending.name) {
            patch(&mut pass.words, slot, Are::Relocatable, label.address as i16);
        } else if pass.externs.iter().any(|e| e.name == pending.name) {
            patch(&mut pass.words, slot, Are::External, 0);
            lines.push(format!("{} {:04}", pending.name, pending.address));
        } else {
            diags.report(ErrorKind::UndefinedLabel, pending.line);
        }
    }

    (!lines.is_empty()).then(|| lines.iter().join("\n") + "\n")
}

fn patch(words: &mut [Word], slot: usize, new_are: Are, new_value: i16) {
    // Reference slots are always operand words; the tag makes a
    // misdirected patch impossible rather than silent.
    if let Some(Word::Operand { value, are }) = words.get_mut(slot) {
        *value = new_value;
        *are = new_are;
    }
}

fn render_object(pass: &PassOne) -> String {
    let mut out = format!("   {}  {}\n", pass.ic - IC_BASE, pass.data.len());

    for (address, word) in (IC_BASE..).zip(&pass.words) {
        let _ = writeln!(out, "{:04} {:05o}", address, word.pack());
    }
    for (address, value) in (pass.ic..).zip(pass.data.words()) {
        let _ = writeln!(out, "{:04} {:05o}", address, value);
    }

    out
}
