use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};

use log::warn;
use nix::fcntl::OFlag;
use nix::unistd::{execvp, pipe2};

use crate::ast::{CommandNode, OutputRedirect};
use crate::executor::ExecError;

pub fn open_input(path: &str) -> io::Result<File> {
    File::open(path)
}

/// Opens an output target, creating it with mode 0644.
pub fn open_output(target: &OutputRedirect) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).mode(0o644);
    if target.append {
        opts.append(true);
    } else {
        opts.truncate(true);
    }
    opts.open(&target.file)
}

/// Makes `target` refer to the same open file as `fd`.
pub fn dup_onto(fd: RawFd, target: RawFd) -> io::Result<()> {
    // SAFETY: dup2 only manipulates the descriptor table.
    if unsafe { libc::dup2(fd, target) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we own.
    if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Which step of preparing a child failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OpenInput = 1,
    OpenOutput = 2,
    DupInput = 3,
    DupOutput = 4,
    Exec = 5,
}

impl Stage {
    fn from_byte(b: u8) -> Option<Stage> {
        match b {
            1 => Some(Stage::OpenInput),
            2 => Some(Stage::OpenOutput),
            3 => Some(Stage::DupInput),
            4 => Some(Stage::DupOutput),
            5 => Some(Stage::Exec),
            _ => None,
        }
    }
}

/// A failure inside a forked child, between fork and a successful exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildFailure {
    pub stage: Stage,
    pub errno: i32,
}

impl ChildFailure {
    const WIRE_LEN: usize = 5;

    fn from_io(stage: Stage, err: &io::Error) -> Self {
        ChildFailure {
            stage,
            errno: err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    fn encode(&self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0] = self.stage as u8;
        buf[1..].copy_from_slice(&self.errno.to_le_bytes());
        buf
    }

    fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::WIRE_LEN {
            return None;
        }
        let stage = Stage::from_byte(buf[0])?;
        let errno = i32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        Some(ChildFailure { stage, errno })
    }

    /// Exit status the child leaves with.
    pub fn status(&self) -> i32 {
        match self.stage {
            Stage::Exec if self.errno == libc::ENOENT => 127,
            Stage::Exec => 126,
            _ => 1,
        }
    }

    pub fn into_error(self, cmd: &CommandNode) -> ExecError {
        let source = io::Error::from_raw_os_error(self.errno);
        match self.stage {
            Stage::OpenInput => ExecError::FileOpenFailed {
                path: cmd.input.clone().unwrap_or_default(),
                source,
            },
            Stage::OpenOutput => ExecError::FileOpenFailed {
                path: cmd
                    .output
                    .as_ref()
                    .map(|o| o.file.clone())
                    .unwrap_or_default(),
                source,
            },
            Stage::DupInput => ExecError::DescriptorDupFailed {
                stream: "stdin",
                source,
            },
            Stage::DupOutput => ExecError::DescriptorDupFailed {
                stream: "stdout",
                source,
            },
            Stage::Exec => ExecError::ImageReplaceFailed {
                program: cmd.name.clone(),
                source: if self.errno == libc::ENOENT {
                    io::Error::new(io::ErrorKind::NotFound, "command not found")
                } else {
                    source
                },
            },
        }
    }
}

/// Close-on-exec pipe a child uses to report why it could not exec.
/// A successful exec closes the write end, so the reader sees EOF.
pub struct ErrorChannel {
    reader: File,
    writer: File,
}

impl ErrorChannel {
    pub fn open() -> Result<Self, ExecError> {
        // close-on-exec from creation, never set after the fact
        let (read_end, write_end) =
            pipe2(OFlag::O_CLOEXEC).map_err(ExecError::PipeCreateFailed)?;
        Ok(ErrorChannel {
            reader: File::from(read_end),
            writer: File::from(write_end),
        })
    }

    /// Child side.
    pub fn into_sender(self) -> File {
        self.writer
    }

    /// Parent side: blocks until the child has exec'd or exited.
    pub fn receive(self) -> Option<ChildFailure> {
        let ErrorChannel { mut reader, writer } = self;
        drop(writer);
        let mut buf = Vec::with_capacity(ChildFailure::WIRE_LEN);
        if let Err(e) = reader.read_to_end(&mut buf) {
            warn!("reading child error channel failed: {}", e);
            return None;
        }
        ChildFailure::decode(&buf)
    }
}

pub fn send_failure(mut sender: File, failure: ChildFailure) {
    let _ = sender.write_all(&failure.encode());
}

/// Child side: points stdin/stdout at the redirect targets.
pub fn apply_redirects(cmd: &CommandNode) -> Result<(), ChildFailure> {
    if let Some(path) = &cmd.input {
        let file = open_input(path).map_err(|e| ChildFailure::from_io(Stage::OpenInput, &e))?;
        dup_onto(file.as_raw_fd(), libc::STDIN_FILENO)
            .map_err(|e| ChildFailure::from_io(Stage::DupInput, &e))?;
    }
    if let Some(target) = &cmd.output {
        let file = open_output(target).map_err(|e| ChildFailure::from_io(Stage::OpenOutput, &e))?;
        dup_onto(file.as_raw_fd(), libc::STDOUT_FILENO)
            .map_err(|e| ChildFailure::from_io(Stage::DupOutput, &e))?;
    }
    Ok(())
}

/// Child side: applies redirects and execs the program, searching PATH.
/// Only returns on failure.
pub fn replace_image(cmd: &CommandNode) -> ChildFailure {
    if let Err(failure) = apply_redirects(cmd) {
        return failure;
    }
    let argv: Result<Vec<CString>, _> = cmd.argv().map(CString::new).collect();
    let argv = match argv {
        Ok(argv) => argv,
        Err(_) => {
            return ChildFailure {
                stage: Stage::Exec,
                errno: libc::EINVAL,
            };
        }
    };
    let errno = match execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(e) => e as i32,
    };
    ChildFailure {
        stage: Stage::Exec,
        errno,
    }
}

/// Redirects applied to the interpreter itself while a builtin runs.
/// The original descriptors come back when the guard drops.
pub struct ScopedRedirect {
    saved: Vec<(RawFd, File)>,
}

impl ScopedRedirect {
    pub fn apply(cmd: &CommandNode) -> Result<Self, ExecError> {
        let mut scope = ScopedRedirect { saved: Vec::new() };
        if let Some(path) = &cmd.input {
            let file = open_input(path).map_err(|source| ExecError::FileOpenFailed {
                path: path.clone(),
                source,
            })?;
            scope.redirect(&file, libc::STDIN_FILENO, "stdin")?;
        }
        if let Some(target) = &cmd.output {
            let file = open_output(target).map_err(|source| ExecError::FileOpenFailed {
                path: target.file.clone(),
                source,
            })?;
            scope.redirect(&file, libc::STDOUT_FILENO, "stdout")?;
        }
        Ok(scope)
    }

    fn redirect(&mut self, file: &File, target: RawFd, stream: &'static str) -> Result<(), ExecError> {
        let _ = io::stdout().flush();
        // SAFETY: dup on one of the standard descriptors.
        let copy = unsafe { libc::dup(target) };
        if copy == -1 {
            return Err(ExecError::DescriptorDupFailed {
                stream,
                source: io::Error::last_os_error(),
            });
        }
        // SAFETY: `copy` is a fresh descriptor owned by nobody else.
        let saved = unsafe { File::from_raw_fd(copy) };
        let _ = set_cloexec(saved.as_raw_fd());
        self.saved.push((target, saved));
        dup_onto(file.as_raw_fd(), target)
            .map_err(|source| ExecError::DescriptorDupFailed { stream, source })
    }
}

impl Drop for ScopedRedirect {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        while let Some((target, saved)) = self.saved.pop() {
            let fd = saved.into_raw_fd();
            if let Err(e) = dup_onto(fd, target) {
                warn!("cannot restore fd {}: {}", target, e);
            }
            // SAFETY: `fd` came from into_raw_fd above and is closed once.
            unsafe { libc::close(fd) };
        }
    }
}
