// Parse delimited character sequences
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::error_handling::compilation_error;
use crate::script_char_provider::ScriptCharProvider;
use crate::script_line_provider::ScriptLineProvider;

use uucore::error::UResult;

/// Decode a character escape valid in text, regular expressions,
/// replacements, and transliterations.
/// At entry line.current() is the character after the `\`.
/// On success advance past the escape; return `None` on an
/// unrecognized escape, leaving the position unchanged.
pub fn parse_char_escape(line: &mut ScriptCharProvider) -> Option<char> {
    let decoded = match line.current() {
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        _ => return None,
    };
    line.advance();
    Some(decoded)
}

/// Parse a bracket expression returning it verbatim as a string.
/// This is needed so that a delimiter appearing inside a class,
/// as in `s/[/]/x/`, does not end the delimited sequence.
fn parse_character_class(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
) -> UResult<String> {
    let mut result = String::from('[');
    line.advance();

    if !line.eol() && line.current() == '^' {
        result.push('^');
        line.advance();
    }

    // A leading ']' is a class member.
    if !line.eol() && line.current() == ']' {
        result.push(']');
        line.advance();
    }

    while !line.eol() {
        let ch = line.current();
        line.advance();

        match ch {
            ']' => {
                result.push(']');
                return Ok(result);
            }
            '[' if !line.eol() && matches!(line.current(), ':' | '.' | '=') => {
                // [:alpha:], [.x.], [=e=]
                let marker = line.current();
                line.advance();
                result.push('[');
                result.push(marker);

                loop {
                    if line.eol() {
                        return compilation_error(
                            lines,
                            line,
                            "unterminated POSIX character class",
                        );
                    }
                    let c = line.current();
                    line.advance();
                    result.push(c);
                    if c == marker && !line.eol() && line.current() == ']' {
                        line.advance();
                        result.push(']');
                        break;
                    }
                }
            }
            '\\' if !line.eol() => match parse_char_escape(line) {
                Some(decoded) => result.push(decoded),
                None => result.push('\\'),
            },
            c => result.push(c),
        }
    }

    compilation_error(lines, line, "unterminated address regex")
}

/// Scan and return the opening delimiter of a delimited string.
/// Advance the line past the opening delimiter.
pub fn scan_delimiter(lines: &ScriptLineProvider, line: &mut ScriptCharProvider) -> UResult<char> {
    if line.eol() {
        return compilation_error(lines, line, "unexpected end of line, delimiter expected");
    }

    let delimiter = line.current();
    if delimiter == '\\' {
        return compilation_error(lines, line, "\\ cannot be used as a string delimiter");
    }
    line.advance();
    Ok(delimiter)
}

/// Parse the regular expression that follows the given, already consumed,
/// delimiter and return it as a string.
/// An escaped delimiter becomes the bare delimiter character; other
/// escapes are decoded or passed through for the RE engine.
/// On return the line is past the closing delimiter.
pub fn parse_regex(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    delimiter: char,
) -> UResult<String> {
    let mut result = String::new();

    while !line.eol() {
        match line.current() {
            '[' if delimiter != '[' => {
                result.push_str(&parse_character_class(lines, line)?);
            }
            '\\' => {
                line.advance();
                if line.eol() {
                    break;
                }
                if line.current() == delimiter {
                    result.push(delimiter);
                    line.advance();
                } else if let Some(decoded) = parse_char_escape(line) {
                    result.push(decoded);
                } else {
                    result.push('\\');
                    result.push(line.current());
                    line.advance();
                }
            }
            c if c == delimiter => {
                line.advance();
                return Ok(result);
            }
            c => {
                result.push(c);
                line.advance();
            }
        }
    }
    compilation_error(lines, line, "unterminated address regex")
}

/// Parse a transliteration string that follows the given, already consumed,
/// delimiter and return it decoded.
/// `\\` stands for a backslash, an escaped delimiter for the delimiter,
/// and any other unrecognized escape for the escaped character.
/// On return the line is past the closing delimiter.
pub fn parse_transliteration(
    lines: &ScriptLineProvider,
    line: &mut ScriptCharProvider,
    delimiter: char,
) -> UResult<String> {
    let mut result = String::new();

    while !line.eol() {
        match line.current() {
            '\\' => {
                line.advance();
                if line.eol() {
                    break;
                }
                match parse_char_escape(line) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push(line.current());
                        line.advance();
                    }
                }
            }
            c if c == delimiter => {
                line.advance();
                return Ok(result);
            }
            c => {
                result.push(c);
                line.advance();
            }
        }
    }
    compilation_error(lines, line, "unterminated `y' command")
}
