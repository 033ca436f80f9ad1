// Definitions for the compiled code data structures
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::error_handling::{ScriptLocation, runtime_error};
use crate::fast_regex::{Captures, Regex};
use crate::named_writer::WriterRegistry;
use crate::script_char_provider::ScriptCharProvider;
use crate::script_line_provider::ScriptLineProvider;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use uucore::error::UResult;

/// Default wrapping width of the `l` command output
pub const DEFAULT_LINE_LENGTH: usize = 60;

#[derive(Debug)]
/// Compilation and processing options provided mostly through the
/// command-line interface, together with the state they govern
pub struct ProcessingContext {
    // Command-line flags with corresponding names
    pub quiet: bool,
    pub regex_extended: bool,
    pub unbuffered: bool,
    pub length: usize,

    // Compilation state
    /// Nesting of { } at compile time
    pub parsed_block_nesting: usize,

    // Processing state
    /// Current input line number
    pub line_number: usize,
    /// True if the line read is the last line of the last input
    pub last_line: bool,
    /// Hold space
    pub hold: StringSpace,
    /// True if a substitution was made since the last line read or t
    pub substitution_made: bool,
    /// Last RE applied, reused when specifying an empty RE
    pub saved_regex: Option<Rc<Regex>>,
    /// Elements to append at the end of each processing cycle
    pub append_elements: Vec<AppendElement>,
    /// Files written by w and s///w
    pub writers: WriterRegistry,
}

impl Default for ProcessingContext {
    fn default() -> Self {
        ProcessingContext {
            quiet: false,
            regex_extended: false,
            unbuffered: false,
            length: DEFAULT_LINE_LENGTH,
            parsed_block_nesting: 0,
            line_number: 0,
            last_line: false,
            hold: StringSpace::default(),
            substitution_made: false,
            saved_regex: None,
            append_elements: Vec::new(),
            writers: WriterRegistry::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Elements that shall be appended at the end of each processing cycle
pub enum AppendElement {
    Text(String),  // The specified text string
    Path(PathBuf), // The contents of the specified file path
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// A pattern or hold space
pub struct StringSpace {
    pub content: Vec<u8>,  // Content without the line's newline
    pub has_newline: bool, // True if the line read was \n-terminated
}

impl StringSpace {
    pub fn new(content: &[u8]) -> Self {
        StringSpace {
            content: content.to_vec(),
            has_newline: true,
        }
    }

    /// Append a newline and the other space's content (G, H, N).
    pub fn append_line(&mut self, other: &[u8]) {
        self.content.push(b'\n');
        self.content.extend_from_slice(other);
    }
}

#[derive(Debug)]
/// Types of address specifications that precede commands
pub enum Address {
    Re(Option<Rc<Regex>>), // Line that matches the RE, or the last RE used
    Line(usize),           // Specific line
    Last,                  // Last line
}

#[derive(Debug)]
/// A single part of an RE replacement
pub enum ReplacementPart {
    Literal(String), // Normal text
    WholeMatch,      // & or \0
    Group(u32),      // \1 to \9
}

#[derive(Debug, Default)]
/// All specified replacements for an RE
pub struct ReplacementTemplate {
    pub parts: Vec<ReplacementPart>,
    pub max_group_number: usize, // Highest used group number (e.g. 8 for \8)
}

impl ReplacementTemplate {
    /// Construct from the parts
    pub fn new(parts: Vec<ReplacementPart>) -> Self {
        let max_group_number = parts
            .iter()
            .filter_map(|part| match part {
                ReplacementPart::Group(n) => Some(*n as usize),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            parts,
            max_group_number,
        }
    }

    /// Expand the template for the given RE captures.
    /// Groups that did not participate in the match expand to nothing.
    /// Fail if the template refers to a group the RE lacks, which can
    /// only happen through a reused empty RE.
    pub fn apply_captures(&self, caps: &Captures, location: &ScriptLocation) -> UResult<Vec<u8>> {
        if self.max_group_number >= caps.len() {
            return runtime_error(
                location,
                format!(
                    "invalid reference \\{} on `s' command's RHS",
                    self.max_group_number
                ),
            );
        }

        let mut result = Vec::new();
        for part in &self.parts {
            match part {
                ReplacementPart::Literal(s) => result.extend_from_slice(s.as_bytes()),
                ReplacementPart::WholeMatch => {
                    if let Some(m) = caps.get(0) {
                        result.extend_from_slice(m.as_bytes());
                    }
                }
                ReplacementPart::Group(n) => {
                    if let Some(m) = caps.get(*n as usize) {
                        result.extend_from_slice(m.as_bytes());
                    }
                }
            }
        }
        Ok(result)
    }
}

#[derive(Debug, Default)]
/// Substitution command
pub struct Substitution {
    pub regex: Option<Rc<Regex>>,         // None reuses the last RE
    pub replacement: ReplacementTemplate, // Broken-down replacement
    pub occurrence: usize,                // Occurrence to substitute; 0 if unspecified
    pub global: bool,                     // True if 'g' flag
    pub print_flag: bool,                 // True if 'p' flag
    pub write_file: Option<PathBuf>,      // File to append to if 'w' flag
}

#[derive(Debug, Default, PartialEq, Eq)]
/// Transliteration command (y)
pub struct Transliteration {
    map: BTreeMap<char, char>,
}

impl Transliteration {
    /// Map each character of `source` to the one at the same position
    /// in `target`. The first mapping of a repeated character wins.
    pub fn from_strings(source: &str, target: &str) -> Self {
        let mut map = BTreeMap::new();
        for (from, to) in source.chars().zip(target.chars()) {
            map.entry(from).or_insert(to);
        }
        Transliteration { map }
    }

    pub fn lookup(&self, ch: char) -> char {
        self.map.get(&ch).copied().unwrap_or(ch)
    }

    /// Return text with every character transliterated.
    /// Bytes that are not valid UTF-8 are kept unchanged.
    pub fn apply(&self, text: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(text.len());
        let mut buf = [0; 4];
        for chunk in text.utf8_chunks() {
            for c in chunk.valid().chars() {
                result.extend_from_slice(self.lookup(c).encode_utf8(&mut buf).as_bytes());
            }
            result.extend_from_slice(chunk.invalid());
        }
        result
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
/// Destination of a b or t command.
pub struct Jump {
    pub label: Option<String>, // None branches to the end of the script
    pub target: Option<usize>, // Index of the labeled command, once resolved
}

#[derive(Debug, Default)]
/// What a command does when its address selects the pattern space
pub enum Action {
    Block(usize), // {: index past the block's last command
    Append(String),
    Branch(Jump),
    Change(String),
    #[default]
    Comment,
    Delete,
    DeleteFirstLine,
    ReplaceWithHold,
    AppendHold,
    HoldPattern,
    AppendToHold,
    Insert(String),
    List,
    Next,
    AppendNext,
    Print,
    PrintFirstLine,
    Quit,
    ReadFile(PathBuf),
    Substitute(Box<Substitution>),
    Test(Jump),
    WriteFile(PathBuf),
    Exchange,
    Transliterate(Box<Transliteration>),
    Label(String),
    LineNumber,
}

#[derive(Debug, Default)]
/// An internally compiled command.
pub struct Command {
    pub code: char,                // Command code
    pub addr1: Option<Address>,    // Start address
    pub addr2: Option<Address>,    // End address
    pub non_select: bool,          // True if '!'
    pub start_line: Option<usize>, // Line that opened the range (or None if closed)
    pub action: Action,            // Command-specific behavior and data
    pub location: ScriptLocation,  // Command's definition location
}

impl Command {
    /// Construct with position information from the given providers.
    pub fn at_position(lines: &ScriptLineProvider, line: &ScriptCharProvider) -> Self {
        Command {
            location: ScriptLocation::at_position(lines, line),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
/// A compiled script.
/// Commands are stored in order; the commands of a block immediately
/// follow its `Action::Block` command.
pub struct Script {
    pub commands: Vec<Command>,
}
