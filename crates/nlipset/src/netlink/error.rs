//! Error types for netlink and ipset operations.

use std::io;

use crate::ipset::errno;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}

impl Error {
    /// Create a kernel error from an errno value.
    ///
    /// The kernel reports errors as negative values; both signs are accepted.
    /// Codes in the ipset private range get the ipset description instead of
    /// the OS one.
    pub fn from_errno(errno: i32) -> Self {
        let errno = errno.abs();
        Self::Kernel {
            errno,
            message: describe(errno),
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT).
    ///
    /// The kernel answers with ENOENT for any command naming a set that does
    /// not exist.
    pub fn is_not_found(&self) -> bool {
        self.errno() == Some(libc::ENOENT)
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if this is an "already exists" error.
    ///
    /// Covers EEXIST (set name taken on create) and the rename/swap
    /// destination clash.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self.errno(),
            Some(libc::EEXIST | errno::IPSET_ERR_EXIST_SETNAME2)
        )
    }

    /// Check if the set is busy or still referenced by a rule.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.errno(),
            Some(libc::EBUSY | errno::IPSET_ERR_BUSY | errno::IPSET_ERR_REFERENCED)
        )
    }

    /// Check if the kernel reported the element as missing from the set.
    ///
    /// This is how a failed Test command, or a Delete of an absent element,
    /// is reported.
    pub fn is_missing_element(&self) -> bool {
        self.errno() == Some(errno::IPSET_ERR_EXIST)
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

fn describe(errno: i32) -> String {
    match errno::describe(errno) {
        Some(message) => message.to_string(),
        None => io::Error::from_raw_os_error(errno).to_string(),
    }
}
