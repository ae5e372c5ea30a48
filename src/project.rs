//! Project, configuration, and operation types for scenario preparation.
//!
//! Provides type-safe wrappers for the build configuration, the requested
//! operation, and the on-disk project file the toolchain operates on.

use clap::ValueEnum;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codefix::replace_in_file;
use crate::error::PrepError;

/// Placeholder substituted with the requested target framework
pub const FRAMEWORK_PLACEHOLDER: &str = "$FRAMEWORK";

/// Build variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Configuration {
    #[value(name = "Debug")]
    Debug,
    #[default]
    #[value(name = "Release")]
    Release,
}

impl Configuration {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Configuration::Debug => "Debug",
            Configuration::Release => "Release",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preparation step to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Build,
    Publish,
    Backup,
}

impl Operation {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Build => "build",
            Operation::Publish => "publish",
            Operation::Backup => "backup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source language of a project created from a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Language {
    #[default]
    #[value(name = "C#")]
    CSharp,
    #[value(name = "F#")]
    FSharp,
    #[value(name = "VB")]
    VisualBasic,
}

impl Language {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CSharp => "C#",
            Language::FSharp => "F#",
            Language::VisualBasic => "VB",
        }
    }

    /// Project file extension produced by `dotnet new` for this language
    #[inline]
    pub fn project_extension(&self) -> &'static str {
        match self {
            Language::CSharp => "csproj",
            Language::FSharp => "fsproj",
            Language::VisualBasic => "vbproj",
        }
    }
}

/// Path to an SDK-style project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile(PathBuf);

impl ProjectFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory holding the project file
    pub fn directory(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Substitute the framework placeholder with a concrete moniker
    pub fn set_framework(&self, framework: &str) -> Result<bool, PrepError> {
        replace_in_file(&self.0, FRAMEWORK_PLACEHOLDER, framework)
    }

    /// Target frameworks declared by the project
    pub fn target_frameworks(&self) -> Result<Vec<String>, PrepError> {
        let content = fs::read_to_string(&self.0)?;
        parse_target_frameworks(&content).map_err(|source| PrepError::InvalidProjectXml {
            path: self.0.clone(),
            source,
        })
    }
}

impl fmt::Display for ProjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Parse `<TargetFramework>` / `<TargetFrameworks>` values from project XML
pub fn parse_target_frameworks(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_framework = false;
    let mut frameworks = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                in_framework = matches!(
                    e.name().as_ref(),
                    b"TargetFramework" | b"TargetFrameworks"
                );
            }
            Event::Text(t) if in_framework => {
                let text = t.unescape()?;
                frameworks.extend(
                    text.split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                );
            }
            Event::End(_) => in_framework = false,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(frameworks)
}

/// A project bound to its build output directory
#[derive(Debug, Clone)]
pub struct Project {
    pub file: ProjectFile,
    pub bin_dir: PathBuf,
}

impl Project {
    pub fn new(file: ProjectFile, bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            file,
            bin_dir: bin_dir.into(),
        }
    }
}
