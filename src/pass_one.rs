//! First pass: walk the expanded text line by line, define labels,
//! collect data and symbol directives, encode instructions, and keep
//! the IC/DC bookkeeping straight.

use std::str::FromStr;

use strum_macros::EnumString;

use crate::data::{self, DataImage, MAX_NUMBER, MIN_NUMBER};
use crate::diagnostics::{Diagnostics, ErrorKind};
use crate::encode;
use crate::labels::{
    self, EntryRequest, ExternDecl, Label, LabelKind, Labels, PendingRef, LABEL_MAX_LENGTH,
};
use crate::op;
use crate::text::{first_word, split_first_word};
use crate::word::Word;

/// Instruction words live at addresses starting here.
pub const IC_BASE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum Directive {
    #[strum(serialize = ".data")]
    Data,
    #[strum(serialize = ".string")]
    String,
    #[strum(serialize = ".entry")]
    Entry,
    #[strum(serialize = ".extern")]
    Extern,
}

/// Everything the first pass hands to the second.
#[derive(Debug)]
pub struct PassOne {
    pub words: Vec<Word>,
    pub data: DataImage,
    pub labels: Labels,
    pub entries: Vec<EntryRequest>,
    pub externs: Vec<ExternDecl>,
    pub refs: Vec<PendingRef>,
    /// Final IC: the first address past the code image.
    pub ic: usize,
}

struct FirstPass {
    words: Vec<Word>,
    data: DataImage,
    labels: Labels,
    entries: Vec<EntryRequest>,
    externs: Vec<ExternDecl>,
    refs: Vec<PendingRef>,
    ic: usize,
}

/// Run the first pass over the macro-expanded text. Diagnostics are
/// collected, never fatal; the caller decides what survives.
pub fn pass_one(expanded: &str, diags: &mut Diagnostics) -> PassOne {
    let mut pass = FirstPass::new();

    for (idx, line) in expanded.lines().enumerate() {
        pass.parse_line(line, idx + 1, diags);
    }

    // Data sits after code in the final image; shift happens exactly
    // once, now that the final IC is known.
    let final_ic = pass.ic;
    pass.labels.shift_data(final_ic);

    PassOne {
        words: pass.words,
        data: pass.data,
        labels: pass.labels,
        entries: pass.entries,
        externs: pass.externs,
        refs: pass.refs,
        ic: pass.ic,
    }
}

impl FirstPass {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            data: DataImage::new(),
            labels: Labels::new(),
            entries: Vec::new(),
            externs: Vec::new(),
            refs: Vec::new(),
            ic: IC_BASE,
        }
    }

    fn parse_line(&mut self, line: &str, line_no: usize, diags: &mut Diagnostics) {
        let Some((first, rest)) = split_first_word(line) else {
            return;
        };

        let (first, rest) = if first.ends_with(':') && first.len() > 1 {
            if !self.define_label(first, rest, line_no, diags) {
                return;
            }
            match split_first_word(rest) {
                Some(parts) => parts,
                None => return,
            }
        } else {
            (first, rest)
        };

        self.dispatch(first, rest, line_no, diags);
    }

    /// Handle a `NAME:` prefix. Returns whether the rest of the line
    /// should still be processed.
    fn define_label(
        &mut self,
        token: &str,
        rest: &str,
        line_no: usize,
        diags: &mut Diagnostics,
    ) -> bool {
        // The token still carries its colon here.
        if token.len() > LABEL_MAX_LENGTH + 1 {
            diags.report(ErrorKind::LabelTooLong, line_no);
            return false;
        }
        let name = &token[..token.len() - 1];

        if self.labels.contains(name) {
            diags.report(ErrorKind::LabelExists, line_no);
            return false;
        }
        if !labels::is_valid_name(name) {
            diags.report(ErrorKind::InvalidLabelFormat, line_no);
            return false;
        }

        // The next word decides what kind of label this is.
        let Some(next) = first_word(rest) else {
            diags.report(ErrorKind::MissingInstruction, line_no);
            return false;
        };

        let kind = if matches!(
            Directive::from_str(next),
            Ok(Directive::Data | Directive::String)
        ) {
            LabelKind::Data
        } else if op::is_mnemonic(next) {
            LabelKind::Code
        } else {
            diags.report(ErrorKind::InvalidLabelFormat, line_no);
            return false;
        };

        let address = match kind {
            LabelKind::Data => self.data.len(),
            LabelKind::Code => self.ic,
        };
        self.labels.add(Label {
            name: name.to_owned(),
            line: line_no,
            kind,
            address,
        });
        true
    }

    fn dispatch(&mut self, first: &str, rest: &str, line_no: usize, diags: &mut Diagnostics) {
        if let Ok(directive) = Directive::from_str(first) {
            match directive {
                Directive::Data => self.handle_data(rest, line_no, diags),
                Directive::String => self.handle_string(rest, line_no, diags),
                Directive::Entry => {
                    if let Some(name) = single_name(
                        rest,
                        line_no,
                        ErrorKind::NoLabelAfterEntry,
                        ErrorKind::ExtraWordAfterEntry,
                        diags,
                    ) {
                        self.entries.push(EntryRequest {
                            name,
                            line: line_no,
                        });
                    }
                }
                Directive::Extern => {
                    if let Some(name) = single_name(
                        rest,
                        line_no,
                        ErrorKind::NoLabelAfterExtern,
                        ErrorKind::ExtraWordAfterExtern,
                        diags,
                    ) {
                        self.externs.push(ExternDecl {
                            name,
                            line: line_no,
                        });
                    }
                }
            }
            return;
        }

        match op::lookup(first) {
            Some(operation) => match encode::encode(operation, rest) {
                Ok(encoded) => {
                    for (name, slot) in encoded.refs {
                        self.refs.push(PendingRef {
                            name,
                            line: line_no,
                            address: self.ic + slot,
                        });
                    }
                    self.ic += encoded.words.len();
                    self.words.extend(encoded.words);
                }
                Err(kind) => diags.report(kind, line_no),
            },
            None => diags.report(ErrorKind::NotAnInstruction, line_no),
        }
    }

    fn handle_data(&mut self, rest: &str, line_no: usize, diags: &mut Diagnostics) {
        if rest.trim().is_empty() {
            diags.report(ErrorKind::NoNumberAfterData, line_no);
            return;
        }
        match data::parse_number_list(rest) {
            Ok(numbers) => {
                for number in numbers {
                    if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
                        diags.report(ErrorKind::NumberNotValid, line_no);
                        break;
                    }
                    self.data.push_number(number);
                }
            }
            Err(kind) => diags.report(kind, line_no),
        }
    }

    fn handle_string(&mut self, rest: &str, line_no: usize, diags: &mut Diagnostics) {
        if rest.trim().is_empty() {
            diags.report(ErrorKind::NoCharsAfterString, line_no);
            return;
        }
        match data::parse_string(rest) {
            Ok(contents) => self.data.push_string(contents),
            Err(kind) => diags.report(kind, line_no),
        }
    }
}

/// `.entry`/`.extern` take exactly one name.
fn single_name(
    rest: &str,
    line_no: usize,
    missing: ErrorKind,
    extra: ErrorKind,
    diags: &mut Diagnostics,
) -> Option<String> {
    let Some((name, after)) = split_first_word(rest) else {
        diags.report(missing, line_no);
        return None;
    };
    if !after.is_empty() {
        diags.report(extra, line_no);
        return None;
    }
    Some(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (PassOne, Diagnostics) {
        let mut diags = Diagnostics::new("test");
        let pass = pass_one(source, &mut diags);
        (pass, diags)
    }

    fn kinds(diags: &Diagnostics) -> Vec<ErrorKind> {
        diags.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn counts_words_per_form() {
        let (pass, diags) = run("stop\ninc r1\nmov r3, r5\nmov X, r1\n.extern X\n");
        assert!(diags.is_clean());
        // 1 + 2 + 2 + 3 words.
        assert_eq!(pass.ic, 108);
        assert_eq!(pass.words.len(), 8);
    }

    #[test]
    fn code_and_data_label_addresses() {
        let source = "MAIN: mov X, r1\nstop\nX: .data 7\nS: .string \"ab\"\n";
        let (pass, diags) = run(source);
        assert!(diags.is_clean());

        assert_eq!(pass.ic, 104);
        assert_eq!(pass.data.len(), 4);

        let main = pass.labels.get("MAIN").unwrap();
        assert_eq!((main.kind, main.address), (LabelKind::Code, 100));

        // Data labels were shifted by the final IC.
        let x = pass.labels.get("X").unwrap();
        assert_eq!((x.kind, x.address), (LabelKind::Data, 104));
        let s = pass.labels.get("S").unwrap();
        assert_eq!((s.kind, s.address), (LabelKind::Data, 105));
    }

    #[test]
    fn pending_refs_point_at_operand_slots() {
        let (pass, _) = run("mov X, r1\njmp K\nmov A, B\n");
        let slots: Vec<(&str, usize)> = pass
            .refs
            .iter()
            .map(|r| (r.name.as_str(), r.address))
            .collect();
        assert_eq!(
            slots,
            [("X", 101), ("K", 104), ("A", 106), ("B", 107)]
        );
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let (_, diags) = run("A: stop\nA: stop\n");
        assert_eq!(kinds(&diags), [ErrorKind::LabelExists]);
    }

    #[test]
    fn label_length_boundary() {
        let ok = format!("{}: stop\n", "A".repeat(31));
        let (pass, diags) = run(&ok);
        assert!(diags.is_clean());
        assert!(pass.labels.contains(&"A".repeat(31)));

        let too_long = format!("{}: stop\n", "A".repeat(32));
        let (_, diags) = run(&too_long);
        assert_eq!(kinds(&diags), [ErrorKind::LabelTooLong]);
    }

    #[test]
    fn label_format_is_checked() {
        let (_, diags) = run("1A: stop\n");
        assert_eq!(kinds(&diags), [ErrorKind::InvalidLabelFormat]);

        // A label cannot shadow a mnemonic.
        let (_, diags) = run("mov: stop\n");
        assert_eq!(kinds(&diags), [ErrorKind::InvalidLabelFormat]);
    }

    #[test]
    fn label_needs_something_after_it() {
        let (_, diags) = run("A:\n");
        assert_eq!(kinds(&diags), [ErrorKind::MissingInstruction]);

        let (_, diags) = run("A: .entry B\n");
        assert_eq!(kinds(&diags), [ErrorKind::InvalidLabelFormat]);

        let (_, diags) = run("A: bogus\n");
        assert_eq!(kinds(&diags), [ErrorKind::InvalidLabelFormat]);
    }

    #[test]
    fn data_bounds() {
        let (pass, diags) = run(".data 16383, -16384\n");
        assert!(diags.is_clean());
        assert_eq!(pass.data.words(), [0x3FFF, 0x4000]);

        let (_, diags) = run(".data 16384\n");
        assert_eq!(kinds(&diags), [ErrorKind::NumberNotValid]);

        let (_, diags) = run(".data\n");
        assert_eq!(kinds(&diags), [ErrorKind::NoNumberAfterData]);
    }

    #[test]
    fn string_directive() {
        let (pass, diags) = run(".string \"hi\"\n");
        assert!(diags.is_clean());
        assert_eq!(pass.data.words(), [104, 105, 0]);

        let (_, diags) = run(".string\n");
        assert_eq!(kinds(&diags), [ErrorKind::NoCharsAfterString]);

        let (_, diags) = run(".string hi\n");
        assert_eq!(kinds(&diags), [ErrorKind::MissingDoubleQuotes]);
    }

    #[test]
    fn entry_and_extern_take_one_name() {
        let (pass, diags) = run(".entry A\n.extern B\n");
        assert!(diags.is_clean());
        assert_eq!(pass.entries[0].name, "A");
        assert_eq!(pass.externs[0].name, "B");

        let (_, diags) = run(".entry\n");
        assert_eq!(kinds(&diags), [ErrorKind::NoLabelAfterEntry]);

        let (_, diags) = run(".entry A B\n");
        assert_eq!(kinds(&diags), [ErrorKind::ExtraWordAfterEntry]);

        let (_, diags) = run(".extern\n");
        assert_eq!(kinds(&diags), [ErrorKind::NoLabelAfterExtern]);

        let (_, diags) = run(".extern A B\n");
        assert_eq!(kinds(&diags), [ErrorKind::ExtraWordAfterExtern]);
    }

    #[test]
    fn unknown_mnemonic() {
        let (_, diags) = run("frobnicate r1\n");
        assert_eq!(kinds(&diags), [ErrorKind::NotAnInstruction]);
    }

    #[test]
    fn scan_continues_past_errors() {
        let (pass, diags) = run("bogus\nstop\nalso bad\n");
        assert_eq!(diags.len(), 2);
        // The good line was still assembled.
        assert_eq!(pass.ic, 101);
    }
}
