//! Scoped OS-level stdout/stderr suppression.
//!
//! Engaged only around in-process setup calls in progress mode, where any
//! stray console write would interleave with the live progress display. The
//! guard saves the real descriptors, points 1 and 2 at /dev/null, and
//! restores them on drop — including when the wrapped call errors or panics.

/// Serializes tests that swap the process-wide descriptors.
#[cfg(test)]
pub(crate) static TEST_FD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(unix)]
pub use unix::SuppressedOutput;

#[cfg(not(unix))]
pub use fallback::SuppressedOutput;

#[cfg(unix)]
mod unix {
    use std::fs::OpenOptions;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub struct SuppressedOutput {
        saved_stdout: libc::c_int,
        saved_stderr: libc::c_int,
    }

    impl SuppressedOutput {
        pub fn engage() -> io::Result<Self> {
            let devnull = OpenOptions::new().write(true).open("/dev/null")?;
            let null_fd = devnull.as_raw_fd();
            unsafe {
                let saved_stdout = libc::dup(1);
                if saved_stdout < 0 {
                    return Err(io::Error::last_os_error());
                }
                let saved_stderr = libc::dup(2);
                if saved_stderr < 0 {
                    let err = io::Error::last_os_error();
                    libc::close(saved_stdout);
                    return Err(err);
                }
                if libc::dup2(null_fd, 1) < 0 || libc::dup2(null_fd, 2) < 0 {
                    let err = io::Error::last_os_error();
                    libc::dup2(saved_stdout, 1);
                    libc::dup2(saved_stderr, 2);
                    libc::close(saved_stdout);
                    libc::close(saved_stderr);
                    return Err(err);
                }
                Ok(Self {
                    saved_stdout,
                    saved_stderr,
                })
            }
            // devnull closes here; fds 1/2 hold their own duplicates.
        }
    }

    impl Drop for SuppressedOutput {
        fn drop(&mut self) {
            unsafe {
                libc::dup2(self.saved_stdout, 1);
                libc::dup2(self.saved_stderr, 2);
                libc::close(self.saved_stdout);
                libc::close(self.saved_stderr);
            }
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    /// Descriptor juggling is unix-only; elsewhere the guard does nothing.
    pub struct SuppressedOutput;

    impl SuppressedOutput {
        pub fn engage() -> std::io::Result<Self> {
            Ok(Self)
        }
    }
}
