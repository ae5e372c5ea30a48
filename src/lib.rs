//! # Perf Precommands
//!
//! Preparation steps for performance test scenarios.
//!
//! Before a scenario is measured its project is copied (or created from a
//! template) into a fixed layout, optionally instrumented with a startup
//! event, and then built, published, or backed up through the `dotnet`
//! toolchain.
//!
//! ## Usage
//!
//! ```ignore
//! use perf_precommands::config::{Cli, Config};
//! use perf_precommands::precommands::PreCommands;
//!
//! let config = Config::from_cli(Cli::parse())?;
//! PreCommands::new(config)
//!     .existing(Path::new("src/emptyconsole"), "emptyconsole.csproj")?
//!     .execute()?;
//! ```

/// Line-based source edits
pub mod codefix;

/// CLI configuration and argument parsing
pub mod config;

/// Filesystem copy and removal
pub mod copier;

/// External toolchain invocations
pub mod dotnet;

/// Error types for preparation steps
pub mod error;

/// Tracing subscriber setup
pub mod logging;

/// Build, publish and backup orchestration
pub mod precommands;

/// Project, configuration and operation types
pub mod project;
