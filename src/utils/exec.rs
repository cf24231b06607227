//! External transformer invocation.
//!
//! The style compiler and the optional script minifier are plain commands:
//! input via an argument or stdin, result on stdout, chatter on stderr.
//!
//! ```ignore
//! let css = Cmd::from_slice(&["sass", "--style=compressed"])
//!     .arg("src/styles/main.scss")
//!     .quiet(SASS_NOISE)
//!     .stdout_text()?;
//!
//! let js = Cmd::new("terser").arg("--mangle").stdin(source).stdout_text()?;
//! ```

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

/// Stderr lines sass prints even when compilation succeeds.
pub const SASS_NOISE: &[&str] = &["Deprecation Warning", "DEPRECATION WARNING", "More info"];

#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    input: Option<Vec<u8>>,
    noise: &'static [&'static str],
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// `["npx", "sass", "--style=compressed"]` → program + leading args.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let (program, args) = match cmd.split_first() {
            Some((program, args)) => (program.as_ref().to_owned(), args),
            None => (OsString::new(), &[][..]),
        };
        Self::new(program).args(args)
    }

    /// Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.input = Some(data.as_ref().to_vec());
        self
    }

    /// Stderr lines starting with any of `prefixes` are not logged.
    pub fn quiet(mut self, prefixes: &'static [&'static str]) -> Self {
        self.noise = prefixes;
        self
    }

    fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Run to completion. A non-zero exit is an error carrying stderr;
    /// on success, remaining stderr lines are logged under the program name.
    pub fn run(self) -> Result<Output> {
        let name = self.name();
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if self.input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start `{name}`"))?;
        if let Some(data) = &self.input
            && let Some(mut pipe) = child.stdin.take()
        {
            pipe.write_all(data)
                .with_context(|| format!("failed to feed `{name}`"))?;
        }
        let output = child
            .wait_with_output()
            .with_context(|| format!("`{name}` did not finish"))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let report = filtered(&stderr, self.noise);
        if !output.status.success() {
            bail!("`{name}` failed with {}\n{report}", output.status);
        }
        if !report.is_empty() {
            log!(&name; "{}", report);
        }
        Ok(output)
    }

    /// Run and return stdout as UTF-8.
    pub fn stdout_text(self) -> Result<String> {
        let name = self.name();
        let output = self.run()?;
        String::from_utf8(output.stdout).with_context(|| format!("`{name}` wrote non-UTF-8 output"))
    }
}

/// Stderr without ANSI colors, blank lines and noise.
fn filtered(stderr: &str, noise: &[&str]) -> String {
    stderr
        .lines()
        .map(strip_ansi)
        .filter(|line| {
            let line = line.trim();
            !line.is_empty() && !noise.iter().any(|p| line.starts_with(p))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"))
        .replace_all(s, "")
}
