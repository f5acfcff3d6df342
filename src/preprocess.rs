//! Macro pre-processor: expands `macr NAME .. endmacr` definitions in
//! place, producing the text both passes actually see.
//!
//! Works in two phases like the rest of the pipeline expects: phase one
//! strips definitions out of the source while collecting their bodies,
//! phase two substitutes calls. If phase one diagnosed anything, phase
//! two never runs and no expanded text is produced.

use crate::diagnostics::{Diagnostics, ErrorKind};
use crate::macros::MacroTable;
use crate::op;
use crate::text::split_first_word;

/// Longest accepted source line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 80;

const MACRO_START: &str = "macr";
const MACRO_END: &str = "endmacr";

/// Run both phases over `source`. Returns the expanded text, or `None`
/// when extraction reported problems.
pub fn preprocess(source: &str, diags: &mut Diagnostics) -> Option<String> {
    let before = diags.len();
    let (table, intermediate) = extract_macros(source, diags);

    if diags.len() > before {
        return None;
    }

    Some(expand(&table, &intermediate))
}

/// Phase one: collect macro definitions, echo every other meaningful
/// line. Comment and blank lines vanish here, including inside bodies.
fn extract_macros(source: &str, diags: &mut Diagnostics) -> (MacroTable, Vec<String>) {
    let mut table = MacroTable::new();
    let mut intermediate = Vec::new();
    let mut in_macro = false;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;

        if raw.len() > MAX_LINE_LENGTH {
            diags.report(ErrorKind::LineTooLong, line_no);
            continue;
        }

        let line = raw.trim_start();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let (first, rest) = match split_first_word(line) {
            Some(parts) => parts,
            None => continue,
        };

        if first == MACRO_START {
            if open_definition(rest, &mut table, line_no, diags) {
                in_macro = true;
            }
            continue;
        }

        if in_macro {
            if first == MACRO_END {
                if !rest.is_empty() {
                    diags.report(ErrorKind::ExtraTextAfterEndmacr, line_no);
                }
                in_macro = false;
            } else {
                table.append_line(line.trim_end());
            }
            continue;
        }

        if first == MACRO_END {
            // Stray endmacr shares the extra-text diagnostic.
            diags.report(ErrorKind::ExtraTextAfterEndmacr, line_no);
            continue;
        }

        intermediate.push(line.trim_end().to_owned());
    }

    (table, intermediate)
}

/// Validate a `macr` line and open the definition it introduces.
/// Returns false when the line was rejected; body lines that follow are
/// then treated as ordinary text, as the diagnostics will sink the file
/// anyway.
fn open_definition(
    rest: &str,
    table: &mut MacroTable,
    line_no: usize,
    diags: &mut Diagnostics,
) -> bool {
    let Some((name, after_name)) = split_first_word(rest) else {
        diags.report(ErrorKind::InvalidMacroName, line_no);
        return false;
    };

    if op::is_reserved(name) {
        diags.report(ErrorKind::InvalidMacroName, line_no);
        return false;
    }
    if !after_name.is_empty() {
        diags.report(ErrorKind::ExtraTextAfterMacro, line_no);
        return false;
    }
    if table.contains(name) {
        diags.report(ErrorKind::MacroAlreadyExists, line_no);
        return false;
    }

    table.define(name);
    true
}

/// Phase two: a line that (trimmed) equals a macro name becomes that
/// macro's body; everything else passes through.
fn expand(table: &MacroTable, intermediate: &[String]) -> String {
    let mut out = String::new();

    for line in intermediate {
        match table.find(line.trim()) {
            Some(m) => {
                for body_line in &m.lines {
                    out.push_str(body_line);
                    out.push('\n');
                }
            }
            None => {
                out.push_str(line.trim());
                out.push('\n');
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (Option<String>, Diagnostics) {
        let mut diags = Diagnostics::new("test");
        let expanded = preprocess(source, &mut diags);
        (expanded, diags)
    }

    #[test]
    fn expands_calls_in_place() {
        let source = "macr m\ninc r1\nendmacr\nm\nm\nstop\n";
        let (expanded, diags) = run(source);
        assert!(diags.is_clean());
        assert_eq!(expanded.unwrap(), "inc r1\ninc r1\nstop\n");
    }

    #[test]
    fn without_macros_is_identity_modulo_trimming() {
        let source = "; header comment\n   mov r1, r2\n\n  stop\n";
        let (expanded, diags) = run(source);
        assert!(diags.is_clean());
        assert_eq!(expanded.unwrap(), "mov r1, r2\nstop\n");
    }

    #[test]
    fn empty_body_expands_to_nothing() {
        let (expanded, diags) = run("macr nop\nendmacr\nnop\nstop\n");
        assert!(diags.is_clean());
        assert_eq!(expanded.unwrap(), "stop\n");
    }

    #[test]
    fn rejects_reserved_macro_name() {
        let (expanded, diags) = run("macr mov\nendmacr\n");
        assert!(expanded.is_none());
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::InvalidMacroName
        );
    }

    #[test]
    fn rejects_directive_macro_name() {
        let (expanded, _) = run("macr .data\nendmacr\n");
        assert!(expanded.is_none());
    }

    #[test]
    fn rejects_missing_macro_name() {
        let (expanded, diags) = run("macr\nendmacr\n");
        assert!(expanded.is_none());
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::InvalidMacroName
        );
    }

    #[test]
    fn rejects_duplicate_definition() {
        let source = "macr m\ninc r1\nendmacr\nmacr m\ndec r1\nendmacr\n";
        let (expanded, diags) = run(source);
        assert!(expanded.is_none());
        assert!(diags
            .iter()
            .any(|d| d.kind == ErrorKind::MacroAlreadyExists));
    }

    #[test]
    fn rejects_trailing_text_on_definition_lines() {
        let (_, diags) = run("macr m extra\nendmacr\n");
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::ExtraTextAfterMacro
        );

        let (_, diags) = run("macr m\ninc r1\nendmacr extra\n");
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::ExtraTextAfterEndmacr
        );
    }

    #[test]
    fn stray_endmacr_reuses_the_extra_text_diagnostic() {
        let (expanded, diags) = run("endmacr\nstop\n");
        assert!(expanded.is_none());
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::ExtraTextAfterEndmacr
        );
    }

    #[test]
    fn long_lines_are_reported_and_skipped() {
        let long = "a".repeat(MAX_LINE_LENGTH + 1);
        let (expanded, diags) = run(&format!("{long}\nstop\n"));
        assert!(expanded.is_none());
        let d = diags.iter().next().unwrap();
        assert_eq!(d.kind, ErrorKind::LineTooLong);
        assert_eq!(d.line, 1);
    }

    #[test]
    fn boundary_line_length_is_accepted() {
        let line = format!("; {}", "x".repeat(MAX_LINE_LENGTH - 2));
        assert_eq!(line.len(), MAX_LINE_LENGTH);
        let (expanded, diags) = run(&format!("{line}\nstop\n"));
        assert!(diags.is_clean());
        assert_eq!(expanded.unwrap(), "stop\n");
    }

    #[test]
    fn comments_inside_bodies_are_dropped() {
        let source = "macr m\n; note\ninc r1\nendmacr\nm\n";
        let (expanded, diags) = run(source);
        assert!(diags.is_clean());
        assert_eq!(expanded.unwrap(), "inc r1\n");
    }

    #[test]
    fn expansion_matches_trimmed_lines() {
        // Substitution is textual: whitespace around the call is fine.
        let source = "macr m\nstop\nendmacr\n   m   \n";
        let (expanded, _) = run(source);
        assert_eq!(expanded.unwrap(), "stop\n");
    }
}
