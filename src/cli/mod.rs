//! Command-line interface definitions for the `nightcap` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `nightcap` binary.
#[derive(Debug, Parser)]
#[command(
    name = "nightcap",
    version,
    about = "Wake a Scaleway instance, SSH into it, and power it off afterwards",
    long_about = "Wake a Scaleway instance, SSH into it, and power it off afterwards.\n\n\
        Stopped instances are powered on and polled until running. SSH is \
        retried up to five times. Once the session ends the instance is \
        powered off after a short grace window; press CTRL+C during that \
        window to leave it running."
)]
pub(crate) struct Cli {
    /// Scaleway server UUID of the instance to connect to.
    #[arg(value_name = "INSTANCE_ID")]
    pub(crate) instance_id: String,
    /// Remote user to log in as (defaults to `root`).
    #[arg(short = 'u', long, value_name = "USER")]
    pub(crate) user: Option<String>,
    /// Connect to this host instead of the instance's public address.
    ///
    /// The address lookup is skipped entirely, which is useful for DNS names
    /// pointing at the instance or for connecting through a VPN.
    #[arg(short = 'H', long, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// Private key passed to SSH with `-i`. Supports `~/` expansion.
    #[arg(short = 'i', long, value_name = "PATH")]
    pub(crate) identity: Option<String>,
    /// Extra SSH arguments as a single string, split with shell quoting
    /// (`-o 'SetEnv LANG=C'` stays one value).
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub(crate) ssh_args: Option<String>,
    /// Zone hosting the instance (defaults to `SCW_DEFAULT_ZONE`).
    #[arg(long, value_name = "ZONE")]
    pub(crate) zone: Option<String>,
    /// Arguments passed verbatim to SSH after the destination (use -- to
    /// separate them).
    #[arg(last = true, value_name = "SSH_ARG")]
    pub(crate) extra: Vec<String>,
}
