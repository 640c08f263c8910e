//! External program execution.

use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

use thiserror::Error;
use tracing::debug;

use crate::naming::{ImageName, OutputType};

const OUTPUT_TYPE_VAR: &str = "FSLOUTPUTTYPE";

/// A single external program run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    output: Option<ImageName>,
}

impl ToolCommand {
    pub fn new<S>(program: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: Vec::new(),
            output: None,
        }
    }

    pub fn arg<S>(mut self, arg: S) -> Self
    where
        S: AsRef<OsStr>,
    {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Appends the prefix of the image the program writes.
    ///
    /// The image's format is exported to the program so the written file has the expected
    /// extension.
    pub fn output(mut self, name: &ImageName) -> Self {
        self.args.push(name.prefix().into_os_string());
        self.output = Some(name.clone());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_output(&self) -> Option<&ImageName> {
        self.output.as_ref()
    }

    pub fn output_type(&self) -> Option<OutputType> {
        self.output.as_ref().map(ImageName::output_type)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;

        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed ({status})")]
    Failed { program: String, status: ExitStatus },
}

/// Runs external programs, returning what they print to stdout.
pub trait Runner {
    fn run(&mut self, command: &ToolCommand) -> Result<String, ToolError>;
}

/// Runs programs as child processes, waiting for each to exit.
///
/// stdout is captured; stderr is passed through.
#[derive(Debug, Default)]
pub struct SystemRunner {
    bin_dir: Option<PathBuf>,
}

impl SystemRunner {
    /// Creates a runner that prefers programs in `$FSLDIR/bin`.
    pub fn new(fsl_dir: Option<PathBuf>) -> Self {
        Self {
            bin_dir: fsl_dir.map(|dir| dir.join("bin")),
        }
    }

    fn resolve_program(&self, program: &str) -> PathBuf {
        if let Some(dir) = &self.bin_dir {
            let path = dir.join(program);

            if path.is_file() {
                return path;
            }
        }

        PathBuf::from(program)
    }
}

impl Runner for SystemRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<String, ToolError> {
        let program = self.resolve_program(command.program());

        debug!(program = ?program, command = %command, "running tool");

        let mut cmd = Command::new(&program);
        cmd.args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        if let Some(output_type) = command.output_type() {
            cmd.env(OUTPUT_TYPE_VAR, output_type.as_ref());
        }

        let output = cmd.output().map_err(|e| ToolError::Spawn {
            program: command.program().into(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: command.program().into(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
