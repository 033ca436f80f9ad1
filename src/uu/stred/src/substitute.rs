// Regular expression substitution on the pattern space
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::command::Substitution;
use crate::error_handling::ScriptLocation;
use crate::fast_regex::Regex;

use uucore::error::UResult;

/// Return the length of the character starting at pos, or None at the end.
/// A byte that doesn't start a valid UTF-8 sequence counts as one character.
fn char_len_at(text: &[u8], pos: usize) -> Option<usize> {
    let chunk = text[pos..].utf8_chunks().next()?;
    Some(chunk.valid().chars().next().map_or(1, char::len_utf8))
}

/// Replace in text the matches of regex selected by the substitution's
/// occurrence and global flag with its expanded replacement.
/// Return true if a replacement was made.
///
/// Matching always continues on the original text, so anchors keep
/// their meaning and replaced text is never rescanned.
/// An empty match adjacent to the previous match is not a new match.
pub fn substitute(
    text: &mut Vec<u8>,
    regex: &Regex,
    subst: &Substitution,
    location: &ScriptLocation,
) -> UResult<bool> {
    let wanted = subst.occurrence.max(1);
    let mut result = Vec::new();
    let mut copied = 0; // End of the text already copied to result
    let mut count = 0; // Number of matches found
    let mut prev_end = None;
    let mut replaced = false;
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = regex.captures_at(text, pos)? else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let (start, end) = (whole.start(), whole.end());

        if start == end && prev_end == Some(start) {
            match char_len_at(text, start) {
                Some(len) => pos = start + len,
                None => break,
            }
            continue;
        }

        count += 1;
        if count >= wanted {
            result.extend_from_slice(&text[copied..start]);
            result.extend_from_slice(&subst.replacement.apply_captures(&caps, location)?);
            copied = end;
            replaced = true;
            if !subst.global {
                break;
            }
        }

        prev_end = Some(end);
        pos = if start == end {
            match char_len_at(text, end) {
                Some(len) => end + len,
                None => break,
            }
        } else {
            end
        };
    }

    if replaced {
        result.extend_from_slice(&text[copied..]);
        *text = result;
    }
    Ok(replaced)
}
