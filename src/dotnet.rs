//! Invocations of the external `dotnet` toolchain.
//!
//! Each step the preparation runs is described by a [`ToolCommand`], which
//! renders to the argument vector passed to the executable. Running commands
//! goes through the [`BuildTool`] trait so orchestration can be exercised
//! without a toolchain installed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::PrepError;
use crate::project::{Configuration, Language};

/// Settings shared by build and publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSettings {
    pub project: PathBuf,
    pub configuration: Configuration,
    pub framework: Option<String>,
    pub runtime: Option<String>,
    pub output_dir: PathBuf,
    pub packages_dir: PathBuf,
    /// Pass-through properties, e.g. `/p:Foo=Bar`
    pub properties: Vec<String>,
}

/// One invocation of the external toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    New {
        template: String,
        output_dir: PathBuf,
        name: String,
        framework: Option<String>,
        language: Option<Language>,
    },
    Restore {
        project: PathBuf,
        packages_dir: PathBuf,
        runtime: Option<String>,
    },
    Build(CompileSettings),
    Publish(CompileSettings),
}

impl ToolCommand {
    /// Subcommand name passed to the toolchain
    pub fn verb(&self) -> &'static str {
        match self {
            ToolCommand::New { .. } => "new",
            ToolCommand::Restore { .. } => "restore",
            ToolCommand::Build(_) => "build",
            ToolCommand::Publish(_) => "publish",
        }
    }

    /// Render the argument vector (without the executable)
    pub fn args(&self, verbose: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.verb().into()];

        match self {
            ToolCommand::New {
                template,
                output_dir,
                name,
                framework,
                language,
            } => {
                args.push(template.into());
                args.push("--output".into());
                args.push(output_dir.into());
                args.push("--name".into());
                args.push(name.into());
                args.push("--force".into());
                if let Some(framework) = framework {
                    args.push("--framework".into());
                    args.push(framework.into());
                }
                if let Some(language) = language {
                    args.push("--language".into());
                    args.push(language.as_str().into());
                }
            }
            ToolCommand::Restore {
                project,
                packages_dir,
                runtime,
            } => {
                args.push(project.into());
                args.push("--packages".into());
                args.push(packages_dir.into());
                if let Some(runtime) = runtime {
                    args.push("--runtime".into());
                    args.push(runtime.into());
                }
            }
            ToolCommand::Build(settings) | ToolCommand::Publish(settings) => {
                push_compile_args(&mut args, settings);
            }
        }

        if verbose {
            args.push("--verbosity".into());
            args.push("normal".into());
        }

        args
    }

    /// Human-readable command line, used for logging and error reports
    pub fn display(&self, program: &Path, verbose: bool) -> String {
        let mut line = program.display().to_string();
        for arg in self.args(verbose) {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

fn push_compile_args(args: &mut Vec<OsString>, settings: &CompileSettings) {
    args.push(settings.project.as_os_str().into());
    args.push("--configuration".into());
    args.push(settings.configuration.as_str().into());
    args.push("--no-restore".into());
    args.push("--output".into());
    args.push(settings.output_dir.as_os_str().into());

    // Restore placed packages under packages_dir; point the build at them
    let mut package_root = OsString::from("/p:NuGetPackageRoot=");
    package_root.push(settings.packages_dir.as_os_str());
    package_root.push(std::path::MAIN_SEPARATOR_STR);
    args.push(package_root);

    if let Some(framework) = &settings.framework {
        args.push("--framework".into());
        args.push(framework.into());
    }
    if let Some(runtime) = &settings.runtime {
        args.push("--runtime".into());
        args.push(runtime.into());
    }
    args.extend(settings.properties.iter().map(OsString::from));
}

/// Runs toolchain commands to completion
pub trait BuildTool {
    fn run(&self, command: &ToolCommand, working_dir: &Path) -> Result<(), PrepError>;
}

/// The real `dotnet` executable
#[derive(Debug, Clone)]
pub struct DotnetCli {
    program: PathBuf,
    verbose: bool,
}

impl DotnetCli {
    pub fn new(program: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            program: program.into(),
            verbose,
        }
    }
}

impl BuildTool for DotnetCli {
    fn run(&self, command: &ToolCommand, working_dir: &Path) -> Result<(), PrepError> {
        let command_line = command.display(&self.program, self.verbose);
        info!(cwd = %working_dir.display(), "$ {command_line}");

        // Output streams straight through to the harness log
        let status = Command::new(&self.program)
            .args(command.args(self.verbose))
            .current_dir(working_dir)
            .status()
            .map_err(|e| PrepError::ToolSpawnFailed {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PrepError::ToolFailed {
                command: command_line,
                code: status.code().unwrap_or(-1),
            })
        }
    }
}
