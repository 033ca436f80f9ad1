// A unified interface to literal, regex, and fancy Regex matching
//
// This allows using plain string search or the regex crate when possible,
// resorting to the slower fancy_regex crate for back-references.
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use fancy_regex::Regex as FancyRegex;
use memchr::memmem;
use once_cell::sync::Lazy;
use regex::Regex as RustRegex;
use regex::bytes::Regex as ByteRegex;
use std::error::Error;
use std::str;
use uucore::error::{UResult, USimpleError};

use crate::error_handling::FATAL_EXIT_CODE;

/// REs containing back-references, which only fancy_regex supports.
static NEEDS_FANCY_RE: Lazy<RustRegex> = Lazy::new(|| {
    RustRegex::new(
        r"(?x)
          ( ^                     # At the beginning
            | ^[^\\]              # or after a BOL non \
            | [^\\] {2}           # or after two non \ characters
            | \\.                 # or after a consumed or escaped \
          )
          \\[1-9]                 # A back-reference
        ",
    )
    .expect("valid fancy detection RE")
});

/// Patterns with a character that must be handled by an RE rather than
/// by plain string matching.
// The ^$ anchors are excluded; the literal matcher handles them.
static NEEDS_RE: Lazy<RustRegex> = Lazy::new(|| {
    RustRegex::new(
        r"(?x)
          ( ^
            | ^[^\\]
            | [^\\] {2}
            | \\.
          )
          (
            [.?|+(\[{*]           # Any magic RE character
            | \\[[:alnum:]]       # Classes, anchors, and back-references
          )
          | [\^$].                # Anchors away from the pattern ends
        ",
    )
    .expect("valid RE detection RE")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Types of literal string anchored matches
enum AnchoredMatch {
    Begin, // ^...
    End,   // ...$
    Both,  // ^...$
    Free,  // ...
}

#[derive(Clone, Debug)]
/// A fast Regex-like matcher for literal strings using memchr::memmem
pub struct LiteralMatcher {
    needle: Vec<u8>,
    match_type: AnchoredMatch,
}

impl LiteralMatcher {
    /// Construct a matcher from an escaped needle possibly with anchors.
    pub fn new(pattern: &str) -> Self {
        let begin = pattern.starts_with('^');
        let body = if begin { &pattern[1..] } else { pattern };
        let end = body.ends_with('$') && !body.ends_with("\\$");
        let body = if end { &body[..body.len() - 1] } else { body };

        let match_type = match (begin, end) {
            (true, true) => AnchoredMatch::Both,
            (true, false) => AnchoredMatch::Begin,
            (false, true) => AnchoredMatch::End,
            (false, false) => AnchoredMatch::Free,
        };
        LiteralMatcher {
            needle: remove_escapes(body).into_bytes(),
            match_type,
        }
    }

    /// Return the start of the first match at or after pos.
    fn find_at(&self, bytes: &[u8], pos: usize) -> Option<usize> {
        let needle = self.needle.as_slice();
        let nlen = needle.len();
        let hlen = bytes.len();

        match self.match_type {
            AnchoredMatch::Both => (pos == 0 && bytes == needle).then_some(0),
            AnchoredMatch::Begin => (pos == 0 && bytes.starts_with(needle)).then_some(0),
            AnchoredMatch::End => {
                (hlen >= nlen + pos && bytes.ends_with(needle)).then_some(hlen - nlen)
            }
            AnchoredMatch::Free => memmem::find(&bytes[pos..], needle).map(|start| start + pos),
        }
    }
}

/// Return the passed pattern without any backslash escapes.
fn remove_escapes(pattern: &str) -> String {
    let mut chars = pattern.chars();
    let mut result = String::with_capacity(pattern.len());

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[derive(Clone, Debug)]
/// A regular expression that can be implemented in diverse efficient ways
pub enum Regex {
    Literal(LiteralMatcher), // Fastest: literal bytes
    Byte(ByteRegex),         // Slower: byte-based finite automaton RE
    Fancy(FancyRegex),       // Slowest: RE supporting back-references
}

/// The location of a matched group within the searched text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match<'t> {
    start: usize,
    end: usize,
    text: &'t [u8],
}

impl<'t> Match<'t> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }
}

/// The groups captured by a single match; group 0 is the whole match.
#[derive(Clone, Debug)]
pub struct Captures<'t> {
    text: &'t [u8],
    spans: Vec<Option<(usize, usize)>>,
}

impl<'t> Captures<'t> {
    /// Return group i, or None if it did not participate in the match.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        self.spans
            .get(i)
            .copied()
            .flatten()
            .map(|(start, end)| Match {
                start,
                end,
                text: self.text,
            })
    }

    /// Return the number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Always false: a match has at least group 0.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

fn fancy_error(e: fancy_regex::Error) -> Box<dyn uucore::error::UError> {
    USimpleError::new(FATAL_EXIT_CODE, format!("regex matching failed: {e}"))
}

/// Return the text as a string for the fancy engine, which can't match
/// bytes that are not valid UTF-8.
fn as_utf8(text: &[u8]) -> UResult<&str> {
    str::from_utf8(text).map_err(|e| {
        USimpleError::new(
            FATAL_EXIT_CODE,
            format!("back-reference matching requires valid UTF-8 input: {e}"),
        )
    })
}

impl Regex {
    /// Construct the most efficient RE-like matching engine possible.
    /// The `.` of the byte and fancy engines also matches newlines,
    /// which can appear in a multi-line pattern space.
    pub fn new(pattern: &str) -> Result<Self, Box<dyn Error>> {
        if NEEDS_FANCY_RE.is_match(pattern) {
            Ok(Self::Fancy(FancyRegex::new(&format!("(?s){pattern}"))?))
        } else if NEEDS_RE.is_match(pattern) || pattern.ends_with("\\$") {
            Ok(Self::Byte(ByteRegex::new(&format!("(?s){pattern}"))?))
        } else {
            Ok(Self::Literal(LiteralMatcher::new(pattern)))
        }
    }

    /// Return true if the RE matches somewhere in text.
    pub fn is_match(&self, text: &[u8]) -> UResult<bool> {
        match self {
            Regex::Literal(m) => Ok(m.find_at(text, 0).is_some()),
            Regex::Byte(re) => Ok(re.is_match(text)),
            Regex::Fancy(re) => re.is_match(as_utf8(text)?).map_err(fancy_error),
        }
    }

    /// Return the captures of the first match starting at or after pos.
    /// Anchors and look-arounds still consider the text before pos.
    pub fn captures_at<'t>(&self, text: &'t [u8], pos: usize) -> UResult<Option<Captures<'t>>> {
        let spans = match self {
            Regex::Literal(m) => m
                .find_at(text, pos)
                .map(|start| vec![Some((start, start + m.needle.len()))]),
            Regex::Byte(re) => re.captures_at(text, pos).map(|caps| {
                caps.iter()
                    .map(|g| g.map(|m| (m.start(), m.end())))
                    .collect()
            }),
            Regex::Fancy(re) => re
                .captures_from_pos(as_utf8(text)?, pos)
                .map_err(fancy_error)?
                .map(|caps| {
                    caps.iter()
                        .map(|g| g.map(|m| (m.start(), m.end())))
                        .collect()
                }),
        };
        Ok(spans.map(|spans| Captures { text, spans }))
    }

    /// Return the number of capture groups, including group 0.
    pub fn captures_len(&self) -> usize {
        match self {
            Regex::Literal(_) => 1,
            Regex::Byte(re) => re.captures_len(),
            Regex::Fancy(re) => re.captures_len(),
        }
    }
}
