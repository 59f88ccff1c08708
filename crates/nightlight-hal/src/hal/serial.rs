// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

/// Longest line the console reads or writes; longer input is truncated.
pub const MAX_LINE_LENGTH: usize = 80;

/// Line-oriented serial console
pub trait SerialIO {
    /// Check if a complete line is waiting to be read
    fn is_line_available(&self) -> bool;

    /// Read one newline-delimited line (non-blocking)
    ///
    /// # Returns
    /// The line without its terminator, at most [`MAX_LINE_LENGTH`] characters,
    /// or `None` when nothing is pending
    fn read_line(&mut self) -> Option<String>;

    /// Write a diagnostic/status line
    fn write_line(&mut self, line: &str);
}

/// Cut a line to [`MAX_LINE_LENGTH`] characters without splitting a char.
pub(crate) fn truncate_line(mut line: String) -> String {
    if let Some((index, _)) = line.char_indices().nth(MAX_LINE_LENGTH) {
        line.truncate(index);
    }
    line
}
