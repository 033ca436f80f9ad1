// Output files opened on first use and flushed on exit
//
// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Diomidis Spinellis
//
// This file is part of the stred package.
// It is licensed under the MIT License.
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::error_handling::{ScriptLocation, runtime_error};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use uucore::display::Quotable;
use uucore::error::UResult;

#[derive(Debug)]
/// Writer that tracks its file name for better error messages
pub struct NamedWriter {
    pub path: PathBuf,
    writer: BufWriter<File>,
    location: ScriptLocation,
}

impl NamedWriter {
    /// Open the file for appending, creating it if needed.
    pub fn new(path: PathBuf, location: ScriptLocation) -> UResult<Self> {
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(e) => {
                return runtime_error(&location, format!("couldn't open file {}: {e}", path.quote()));
            }
        };

        Ok(NamedWriter {
            path,
            writer: BufWriter::new(file),
            location,
        })
    }

    /// Write a line to the file with a newline, returning descriptive errors.
    pub fn write_line(&mut self, line: &[u8]) -> UResult<()> {
        if let Err(e) = self
            .writer
            .write_all(line)
            .and_then(|()| self.writer.write_all(b"\n"))
        {
            return runtime_error(
                &self.location,
                format!("couldn't write to file {}: {e}", self.path.quote()),
            );
        }
        Ok(())
    }

    /// Flush the writer, returning a descriptive error.
    pub fn flush(&mut self) -> UResult<()> {
        if let Err(e) = self.writer.flush() {
            return runtime_error(
                &self.location,
                format!("couldn't flush file {}: {e}", self.path.quote()),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
/// All files written by the script, each opened once for the whole run
pub struct WriterRegistry {
    writers: HashMap<PathBuf, NamedWriter>,
}

impl WriterRegistry {
    /// Append line to the file at path, opening it on first use.
    /// Errors are reported against the command at location.
    pub fn write_line(
        &mut self,
        path: &Path,
        location: &ScriptLocation,
        line: &[u8],
    ) -> UResult<()> {
        let writer = match self.writers.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(NamedWriter::new(path.to_path_buf(), location.clone())?)
            }
        };
        writer.write_line(line)
    }

    /// Flush buffered content of all files, returning descriptive errors.
    pub fn flush_all(&mut self) -> UResult<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
