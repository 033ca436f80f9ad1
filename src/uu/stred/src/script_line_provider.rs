// Provide the script contents line by line
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::PathBuf;

use uucore::display::Quotable;
use uucore::error::{FromIo, UResult};

#[derive(Debug, Clone, PartialEq, Eq)]
/// The specification of a script piece: through a string or a file
pub enum ScriptValue {
    StringVal(String),
    PathVal(PathBuf),
}

/// Concatenation of all script pieces, in the order specified.
/// Every piece ends a line, so `-e a -e b` reads as two lines.
pub struct ScriptLineProvider {
    sources: Vec<ScriptValue>,
    state: State,
}

enum State {
    NotStarted,
    Active {
        index: usize,
        reader: Box<dyn BufRead>,
        input_name: String,
        line_number: usize,
    },
    Done,
}

impl ScriptLineProvider {
    pub fn new(sources: Vec<ScriptValue>) -> Self {
        Self {
            sources,
            state: State::NotStarted,
        }
    }

    pub fn get_line_number(&self) -> usize {
        match &self.state {
            State::Active { line_number, .. } => *line_number,
            _ => 0,
        }
    }

    pub fn get_input_name(&self) -> &str {
        match &self.state {
            State::Active { input_name, .. } => input_name.as_str(),
            _ => "",
        }
    }

    /// Return true while on the very first line of the whole script.
    pub fn at_script_start(&self) -> bool {
        matches!(
            self.state,
            State::Active {
                index: 0,
                line_number: 1,
                ..
            }
        )
    }

    /// Return the next script line without its newline, or None at the end.
    pub fn next_line(&mut self) -> UResult<Option<String>> {
        let mut line = String::new();

        loop {
            let next_index = match &mut self.state {
                State::NotStarted => 0,
                State::Active {
                    index,
                    reader,
                    input_name,
                    line_number,
                } => {
                    line.clear();
                    let bytes = reader
                        .read_line(&mut line)
                        .map_err_context(|| format!("reading script {}", input_name.quote()))?;
                    if bytes == 0 {
                        *index + 1
                    } else {
                        *line_number += 1;
                        if line.ends_with('\n') {
                            line.pop();
                        }
                        return Ok(Some(line));
                    }
                }
                State::Done => return Ok(None),
            };

            self.advance_source(next_index)?;
        }
    }

    fn advance_source(&mut self, next_index: usize) -> UResult<()> {
        if next_index >= self.sources.len() {
            self.state = State::Done;
            return Ok(());
        }

        fn truncate_with_ellipsis(input: &str) -> String {
            const MAX_LEN: usize = 20;
            let first_line = input.lines().next().unwrap_or("");
            if first_line.chars().count() <= MAX_LEN && first_line.len() == input.len() {
                input.to_string()
            } else {
                first_line.chars().take(MAX_LEN).collect::<String>() + "..."
            }
        }

        let (reader, input_name): (Box<dyn BufRead>, String) = match &self.sources[next_index] {
            ScriptValue::StringVal(s) => (
                Box::new(Cursor::new(s.clone().into_bytes())),
                truncate_with_ellipsis(s),
            ),
            ScriptValue::PathVal(p) if p.as_os_str() == "-" => {
                (Box::new(BufReader::new(io::stdin())), "<stdin>".to_string())
            }
            ScriptValue::PathVal(p) => {
                let file = File::open(p)
                    .map_err_context(|| format!("couldn't open file {}", p.quote()))?;
                (
                    Box::new(BufReader::new(file)),
                    p.to_string_lossy().to_string(),
                )
            }
        };

        self.state = State::Active {
            index: next_index,
            reader,
            input_name,
            line_number: 0,
        };
        Ok(())
    }
}

#[cfg(test)]
impl ScriptLineProvider {
    /// Construct a provider that reports the given position and has no lines.
    pub fn with_active_state(input_name: &str, line_number: usize) -> Self {
        Self {
            sources: vec![],
            state: State::Active {
                index: 1,
                reader: Box::new(Cursor::new(Vec::new())),
                input_name: input_name.to_string(),
                line_number,
            },
        }
    }
}
