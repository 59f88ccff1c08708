// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Desktop host platform: wall-clock time, stdin/stdout console, OS entropy.

use crate::hal::serial::truncate_line;
use crate::hal::{EntropySource, SerialIO, TimeProvider};
use crossbeam::channel::{unbounded, Receiver};
use rand::RngCore;
use std::io::BufRead;
use std::time::{Duration, Instant};
use tracing::debug;

/// Monotonic clock counting from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Clock reading 0 now
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Console on the process's stdin/stdout
///
/// A background thread reads stdin so `read_line` never blocks the node loop.
#[derive(Debug)]
pub struct StdioSerial {
    lines: Receiver<String>,
}

impl StdioSerial {
    /// Start the stdin reader thread
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        std::thread::Builder::new()
            .name("nightlight-stdin".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("stdin closed: {}", e);
                            break;
                        }
                    }
                }
            })?;
        Ok(Self { lines: rx })
    }
}

impl SerialIO for StdioSerial {
    fn is_line_available(&self) -> bool {
        !self.lines.is_empty()
    }

    fn read_line(&mut self) -> Option<String> {
        self.lines
            .try_recv()
            .ok()
            .map(|line| truncate_line(line.trim_end_matches('\r').to_string()))
    }

    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Seed from the operating system's random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn seed(&mut self) -> u64 {
        rand::rngs::OsRng.next_u64()
    }
}
