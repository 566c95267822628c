//! Local resolver cache flushing.
//!
//! Hosts reached through dynamic DNS may come back with a new address after
//! every boot, so the cache is flushed before each connection attempt. Only
//! Windows keeps a resolver cache that has to be flushed from the client
//! side; other platforms resolve the fresh record on their own.

use std::ffi::OsString;

/// External command that clears the local DNS resolver cache.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DnsFlush {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl DnsFlush {
    /// Creates a flush command from a program and its arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the flush command for the current platform, or `None` when
    /// the platform needs no flush.
    #[must_use]
    pub fn for_host_platform() -> Option<Self> {
        if cfg!(windows) {
            Some(Self::new("ipconfig", ["/flushdns"]))
        } else {
            None
        }
    }

    pub(crate) fn os_args(&self) -> Vec<OsString> {
        self.args.iter().map(OsString::from).collect()
    }
}
