// Provide a script line character by character
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

/// Cursor over a single script line, which never contains its newline.
pub struct ScriptCharProvider {
    line: Vec<char>,
    pos: usize,
}

impl ScriptCharProvider {
    pub fn new(line_string: &str) -> Self {
        Self {
            line: line_string.chars().collect(),
            pos: 0,
        }
    }

    /// Advances to the next character, if not at end of line.
    pub fn advance(&mut self) {
        if self.pos < self.line.len() {
            self.pos += 1;
        }
    }

    /// Returns the current character. Panics if at end of line.
    pub fn current(&self) -> char {
        self.line[self.pos]
    }

    /// Returns the character after the current one, if any.
    pub fn peek(&self) -> Option<char> {
        self.line.get(self.pos + 1).copied()
    }

    /// Returns true if at the end of the line.
    pub fn eol(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Advances the position past any blank characters.
    pub fn eat_spaces(&mut self) {
        while self.pos < self.line.len() && self.line[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    /// Consume and return the rest of the line.
    pub fn take_rest(&mut self) -> String {
        let rest: String = self.line[self.pos..].iter().collect();
        self.pos = self.line.len();
        rest
    }

    pub fn get_pos(&self) -> usize {
        self.pos
    }
}
