// Line-based I/O from multiple input files to the standard output
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::command::StringSpace;

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use uucore::display::Quotable;
use uucore::error::{FromIo, UResult};
use uucore::show_error;

/// A source of input lines with one line of look-ahead
pub trait LineSource {
    /// Return the next line without its newline, and whether the
    /// newline was present, or None at the end of all input.
    fn next_line(&mut self) -> UResult<Option<(Vec<u8>, bool)>>;

    /// Return true if the line last returned was the last one.
    fn is_last_line(&mut self) -> UResult<bool>;
}

/// An input specified on the command line or supplied by a test
pub enum InputSource {
    Path(PathBuf), // "-" is the standard input
    Reader(Box<dyn BufRead>),
}

/// Buffered line reader over a single input.
struct ReadLineCursor {
    reader: Box<dyn BufRead>,
    name: String,
    buffer: Vec<u8>,
}

impl ReadLineCursor {
    fn new(reader: Box<dyn BufRead>, name: String) -> Self {
        Self {
            reader,
            name,
            buffer: Vec::new(),
        }
    }

    /// Return the next line and its \n termination, if available, or None.
    /// The line's bytes are returned as read, whatever their encoding.
    fn get_line(&mut self) -> UResult<Option<(Vec<u8>, bool)>> {
        self.buffer.clear();
        let bytes_read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .map_err_context(|| format!("read error on {}", self.name.quote()))?;
        if bytes_read == 0 {
            return Ok(None);
        }

        let has_newline = self.buffer.ends_with(b"\n");
        if has_newline {
            self.buffer.pop();
        }
        Ok(Some((self.buffer.clone(), has_newline)))
    }
}

/// The concatenation of all input sources, read in order
pub struct InputFiles {
    sources: VecDeque<InputSource>,
    current: Option<ReadLineCursor>,
    lookahead: Option<(Vec<u8>, bool)>,
}

impl InputFiles {
    pub fn new(sources: Vec<InputSource>) -> Self {
        Self {
            sources: sources.into(),
            current: None,
            lookahead: None,
        }
    }

    /// Construct from the specified paths; "-" is the standard input.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self::new(paths.into_iter().map(InputSource::Path).collect())
    }

    /// Open the specified source, reporting and skipping the ones
    /// that cannot be opened.
    fn open(source: InputSource) -> Option<ReadLineCursor> {
        match source {
            InputSource::Reader(reader) => Some(ReadLineCursor::new(reader, "-".to_string())),
            InputSource::Path(path) if path.as_os_str() == "-" => Some(ReadLineCursor::new(
                Box::new(BufReader::new(io::stdin())),
                "-".to_string(),
            )),
            InputSource::Path(path) => match File::open(&path) {
                Ok(file) => Some(ReadLineCursor::new(
                    Box::new(BufReader::new(file)),
                    path.to_string_lossy().to_string(),
                )),
                Err(e) => {
                    show_error!(
                        "{}",
                        e.map_err_context(|| format!("can't read {}", path.maybe_quote()))
                    );
                    None
                }
            },
        }
    }

    /// Return the following line from the current or the next inputs.
    fn read_ahead(&mut self) -> UResult<Option<(Vec<u8>, bool)>> {
        loop {
            if let Some(cursor) = &mut self.current {
                if let Some(line) = cursor.get_line()? {
                    return Ok(Some(line));
                }
                self.current = None;
            }

            match self.sources.pop_front() {
                Some(source) => self.current = Self::open(source),
                None => return Ok(None),
            }
        }
    }
}

impl LineSource for InputFiles {
    fn next_line(&mut self) -> UResult<Option<(Vec<u8>, bool)>> {
        match self.lookahead.take() {
            Some(line) => Ok(Some(line)),
            None => self.read_ahead(),
        }
    }

    fn is_last_line(&mut self) -> UResult<bool> {
        if self.lookahead.is_none() {
            self.lookahead = self.read_ahead()?;
        }
        Ok(self.lookahead.is_none())
    }
}

/// Buffered output of pattern spaces and other text.
/// A space read from a line without a newline is output without one,
/// unless more output follows it.
pub struct OutputBuffer {
    out: BufWriter<Box<dyn Write>>,
    missing_newline: bool, // Last space output lacked its newline
    unbuffered: bool,      // Flush at the end of every cycle
}

impl OutputBuffer {
    pub fn new(w: Box<dyn Write>, unbuffered: bool) -> Self {
        Self {
            out: BufWriter::new(w),
            missing_newline: false,
            unbuffered,
        }
    }

    pub fn is_unbuffered(&self) -> bool {
        self.unbuffered
    }

    // Terminate a previously output unterminated space.
    fn complete_line(&mut self) -> UResult<()> {
        if self.missing_newline {
            self.missing_newline = false;
            self.write_raw(b"\n")?;
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> UResult<()> {
        self.out
            .write_all(bytes)
            .map_err_context(|| "couldn't write to standard output".to_string())
    }

    /// Output the space and its newline, if it had one.
    pub fn write_space(&mut self, space: &StringSpace) -> UResult<()> {
        self.complete_line()?;
        self.write_raw(&space.content)?;
        if space.has_newline {
            self.write_raw(b"\n")
        } else {
            self.missing_newline = true;
            Ok(())
        }
    }

    /// Output the specified string verbatim.
    pub fn write_str(&mut self, s: &str) -> UResult<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Output the specified bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> UResult<()> {
        self.complete_line()?;
        self.write_raw(bytes)
    }

    /// Copy the specified file to the output.
    /// Per POSIX, a file that can't be read is treated as empty.
    pub fn copy_file(&mut self, path: &Path) -> UResult<()> {
        let Ok(contents) = fs::read(path) else {
            return Ok(());
        };

        if !contents.is_empty() {
            self.complete_line()?;
            self.write_raw(&contents)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> UResult<()> {
        self.out
            .flush()
            .map_err_context(|| "couldn't flush standard output".to_string())
    }
}
