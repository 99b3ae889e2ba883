//! Command lines for the external service executables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gwasbench_core::error::BenchError;

/// A program and its arguments, split on whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Resolve the program against `dir` when it is a relative path such as
    /// `./bin/dpi`. Bare names like `make` are left for `PATH` lookup.
    #[must_use]
    pub fn resolved_program(&self, dir: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            dir.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

impl FromStr for CommandSpec {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| BenchError::Config("empty command".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
