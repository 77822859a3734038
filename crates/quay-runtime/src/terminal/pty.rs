//! Pseudo-terminal abstraction and the native `portable-pty` spawner.
//!
//! The manager never talks to the OS directly: it spawns through
//! [`PtySpawner`] and drives the returned [`PtyHandle`]. Output and exit
//! arrive as [`PtyEvent`]s on a channel — message passing, no polling —
//! so tests can script a terminal without creating a real PTY.

use std::io::{Read, Write};

use bytes::Bytes;
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tracing::debug;

/// Events pushed by a pseudo-terminal implementation.
#[derive(Clone, Debug)]
pub enum PtyEvent {
    /// A chunk of shell output.
    Output(Bytes),
    /// The shell process exited on its own.
    Exited,
}

/// A live pseudo-terminal attached to a shell process.
pub trait PtyHandle: Send {
    /// Write input bytes to the shell.
    fn write(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Resize the terminal.
    fn resize(&mut self, cols: u16, rows: u16) -> std::io::Result<()>;

    /// Kill the shell process. May fail if it already exited.
    fn kill(&mut self) -> std::io::Result<()>;
}

/// Factory for pseudo-terminals running an interactive shell.
pub trait PtySpawner: Send + Sync {
    /// Spawn a shell attached to a fresh PTY of the given size.
    ///
    /// Returns the handle plus the event channel carrying output chunks
    /// and the eventual exit notification.
    fn spawn_shell(
        &self,
        cols: u16,
        rows: u16,
    ) -> std::io::Result<(Box<dyn PtyHandle>, mpsc::Receiver<PtyEvent>)>;
}

/// Buffered PTY reads per channel message.
const READ_BUF_SIZE: usize = 8192;

/// Channel depth between the blocking reader thread and the monitor task.
const EVENT_CHANNEL_DEPTH: usize = 256;

/// [`PtySpawner`] backed by the OS PTY via `portable-pty`.
pub struct NativePtySpawner {
    shell: Option<String>,
    term: String,
}

impl NativePtySpawner {
    /// Build a spawner from terminal settings.
    pub fn new(settings: &quay_settings::TerminalSettings) -> Self {
        Self {
            shell: settings.shell.clone(),
            term: settings.term.clone(),
        }
    }

    /// Resolve the shell program: configured value, then `$SHELL`, then
    /// `/bin/bash`.
    fn shell_program(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "/bin/bash".to_string())
    }
}

impl PtySpawner for NativePtySpawner {
    fn spawn_shell(
        &self,
        cols: u16,
        rows: u16,
    ) -> std::io::Result<(Box<dyn PtyHandle>, mpsc::Receiver<PtyEvent>)> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let program = self.shell_program();
        let mut cmd = CommandBuilder::new(&program);
        cmd.env("TERM", &self.term);
        if let Ok(home) = std::env::var("HOME") {
            cmd.cwd(home);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        debug!(program, cols, rows, "spawned interactive shell");

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        // Blocking reads happen on a dedicated thread; EOF means the
        // shell side of the PTY is gone.
        let _ = std::thread::spawn(move || {
            let mut buf = [0u8; READ_BUF_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let chunk = Bytes::copy_from_slice(&buf[..n]);
                        if tx.blocking_send(PtyEvent::Output(chunk)).is_err() {
                            return;
                        }
                    }
                }
            }
            let _ = tx.blocking_send(PtyEvent::Exited);
        });

        let handle = NativePtyHandle {
            master: pair.master,
            child,
            writer,
        };
        Ok((Box::new(handle), rx))
    }
}

struct NativePtyHandle {
    master: Box<dyn portable_pty::MasterPty + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
}

impl PtyHandle for NativePtyHandle {
    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    fn resize(&mut self, cols: u16, rows: u16) -> std::io::Result<()> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill()
    }
}
