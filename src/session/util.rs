//! Utility functions for path manipulation and shell rendering.

use std::ffi::OsString;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use shell_escape::unix::escape;

/// Expands a leading `~/` prefix to the user's home directory.
///
/// If the `HOME` environment variable is not set, the function returns the
/// input string unchanged.
///
/// # Examples
///
/// ```
/// # use nightcap::session::expand_tilde;
/// let home = std::env::var("HOME").expect("HOME should be set");
/// assert_eq!(expand_tilde("~/.ssh/id_ed25519"), format!("{home}/.ssh/id_ed25519"));
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

/// Checks that `path` names a regular file (or a symlink, which `ssh`
/// resolves itself) the current user can stat.
pub(crate) fn check_regular_file(path: &str) -> Result<(), String> {
    let path_buf = Utf8Path::new(path);
    let file_name = path_buf
        .file_name()
        .ok_or_else(|| format!("path has no file name: {path_buf}"))?;
    let dir_path = match path_buf.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    let metadata = dir
        .symlink_metadata(file_name)
        .map_err(|err| err.to_string())?;
    if metadata.is_file() || metadata.file_type().is_symlink() {
        Ok(())
    } else {
        Err(String::from("not a regular file"))
    }
}

/// Renders a program and its arguments as a single shell-escaped line for
/// diagnostics.
pub(crate) fn render_command(program: &str, args: &[OsString]) -> String {
    let mut rendered = escape(program.into()).into_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&escape(arg.to_string_lossy()));
    }
    rendered
}
