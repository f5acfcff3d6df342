//! Two-pass assembler for a 15-bit-word machine.
//!
//! `BASE.as` goes in; out come `BASE.am` (the macro-expanded source),
//! `BASE.ob` (the object listing in octal), and, when non-empty,
//! `BASE.ent` / `BASE.ext` (exported symbols and extern reference
//! sites). Any diagnostic suppresses the output files but never stops
//! the scan, so one run reports everything wrong with a file.

use std::fs;

use anyhow::{Context, Result};

pub mod data;
pub mod diagnostics;
pub mod encode;
pub mod labels;
pub mod macros;
pub mod op;
pub mod pass_one;
pub mod pass_two;
pub mod preprocess;
pub mod text;
pub mod word;

use diagnostics::Diagnostics;
use pass_two::Artifacts;

/// The result of assembling one source text.
#[derive(Debug)]
pub struct Assembly {
    /// Macro-expanded text; `None` when pre-processing failed.
    pub expanded: Option<String>,
    /// Rendered outputs; only meaningful when the session is clean.
    pub artifacts: Option<Artifacts>,
    pub diagnostics: Diagnostics,
}

impl Assembly {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_clean()
    }
}

/// Assemble one source text. `file_name` only labels diagnostics.
///
/// Both passes run even when the first reported problems, matching the
/// always-collect-everything error policy; the artifacts of a dirty
/// session are discarded by the caller.
pub fn assemble_source(source: &str, file_name: &str) -> Assembly {
    let mut diags = Diagnostics::new(file_name);

    let Some(expanded) = preprocess::preprocess(source, &mut diags) else {
        return Assembly {
            expanded: None,
            artifacts: None,
            diagnostics: diags,
        };
    };

    let pass = pass_one::pass_one(&expanded, &mut diags);
    let artifacts = pass_two::pass_two(pass, &mut diags);

    Assembly {
        expanded: Some(expanded),
        artifacts: Some(artifacts),
        diagnostics: diags,
    }
}

/// Assemble `BASE.as` and write whichever artifacts the session earned.
/// Returns whether the file assembled without diagnostics.
///
/// # Errors
///
/// If the input cannot be read or an output cannot be written.
pub fn process_file(base: &str) -> Result<bool> {
    let input = format!("{base}.as");
    let source =
        fs::read_to_string(&input).with_context(|| format!("opening input file: {input}"))?;

    let assembly = assemble_source(&source, base);

    for diagnostic in assembly.diagnostics.iter() {
        eprintln!("{diagnostic}");
    }

    if let Some(expanded) = &assembly.expanded {
        let path = format!("{base}.am");
        fs::write(&path, expanded).with_context(|| format!("writing {path}"))?;
    }

    if !assembly.is_clean() {
        return Ok(false);
    }

    if let Some(artifacts) = &assembly.artifacts {
        let path = format!("{base}.ob");
        fs::write(&path, &artifacts.object).with_context(|| format!("writing {path}"))?;

        if let Some(entries) = &artifacts.entries {
            let path = format!("{base}.ent");
            fs::write(&path, entries).with_context(|| format!("writing {path}"))?;
        }
        if let Some(externals) = &artifacts.externals {
            let path = format!("{base}.ext");
            fs::write(&path, externals).with_context(|| format!("writing {path}"))?;
        }
    }

    Ok(true)
}
