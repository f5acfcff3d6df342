use std::fmt::{self, Display};

use thiserror::Error;

/// Everything the assembler can complain about. The wording is stable;
/// tests assert on the rendered text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("not a valid instruction name")]
    NotAnInstruction,
    #[error("Invalid operand")]
    InvalidOperand,
    #[error("Missing an operand")]
    MissingOperand,
    #[error("Invalid operand type")]
    InvalidOperandType,
    #[error("Too many operands")]
    TooManyOperands,
    #[error("Invalid register")]
    InvalidRegister,
    #[error("Invalid macro name")]
    InvalidMacroName,
    #[error("Extra text after end macro")]
    ExtraTextAfterEndmacr,
    #[error("Extra text after macro")]
    ExtraTextAfterMacro,
    #[error("Macro already exists")]
    MacroAlreadyExists,
    #[error("Line exceeds the maximum allowed length of 81 characters")]
    LineTooLong,
    #[error("Comma missing between operands")]
    MissingCommaBetweenOperands,
    #[error("Extra text after operands")]
    ExtraTextAfterOperands,
    #[error("Extra text after command")]
    ExtraTextAfterCommand,
    #[error("Missing destination operand")]
    MissingDestOperand,
    #[error("Illegal comma before the first operand")]
    CommaBeforeOperand,
    #[error("There is a duplicate comma")]
    DuplicateComma,
    #[error("There is an extra comma after the last operand")]
    CommaAfterLastOperand,
    #[error("The immediate number is out of range")]
    OutOfRange,
    #[error("Not a valid label name")]
    InvalidLabelFormat,
    #[error("Missing instruction")]
    MissingInstruction,
    #[error("Name of label too long")]
    LabelTooLong,
    #[error("Number not valid")]
    NumberNotValid,
    #[error("Name of label exists already")]
    LabelExists,
    #[error("Missing double quotes at the beginning of the sentence")]
    MissingBeginningQuote,
    #[error("Missing double quotes at the end of the sentence")]
    MissingEndQuote,
    #[error("Missing double quotes")]
    MissingDoubleQuotes,
    #[error("String is too short")]
    StringTooShort,
    #[error("No characters after .string")]
    NoCharsAfterString,
    #[error("When entering data of the data type, only numbers are allowed")]
    NotANumber,
    #[error("Consecutive commas between 2 numbers")]
    ConsecutiveCommas,
    #[error("There is a comma at the end of the data")]
    TrailingComma,
    #[error("There is a comma at the beginning of the data")]
    LeadingComma,
    #[error("No numbers after data")]
    NoNumberAfterData,
    #[error("No label after .entry")]
    NoLabelAfterEntry,
    #[error("More than one word after .entry")]
    ExtraWordAfterEntry,
    #[error("More than one word after .extern")]
    ExtraWordAfterExtern,
    #[error("No label after .extern")]
    NoLabelAfterExtern,
    #[error("A label that is external has been defined in the file")]
    ExternAlsoDefined,
    #[error("A label that is entry was not defined in the file")]
    EntryNotDefined,
    #[error("Label used but not defined")]
    UndefinedLabel,
    #[error("Not enough memory space")]
    NotEnoughMemory,
}

/// One reported problem, tied to the source line it fired on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub line: usize,
    pub file: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: {} at line {} in file {}",
            self.kind, self.line, self.file
        )
    }
}

/// Per-file diagnostic collector. Reporting never aborts the scan; the
/// driver keeps going so one run surfaces every problem in the file.
#[derive(Debug)]
pub struct Diagnostics {
    file: String,
    reported: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reported: Vec::new(),
        }
    }

    pub fn report(&mut self, kind: ErrorKind, line: usize) {
        self.reported.push(Diagnostic {
            kind,
            line,
            file: self.file.clone(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reported.iter()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}
