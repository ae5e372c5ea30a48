//! CLI configuration and runtime settings for scenario preparation.

use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::{Path, PathBuf};

use crate::project::{Configuration, Language, Operation};

/// Environment variable pointing at the Helix correlation payload
pub const HELIX_PAYLOAD_ENV: &str = "HELIX_CORRELATION_PAYLOAD";

/// Common preparation steps for performance test scenarios
#[derive(Parser, Debug)]
#[command(name = "precommands")]
#[command(version)]
#[command(about = "Common preparation steps for perf tests")]
pub struct Cli {
    #[command(subcommand)]
    pub operation: OperationCommand,

    /// Root of the scenario layout (app/, bin/, pub/, tmp/)
    #[arg(long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Repository root (packages and static dependencies live below it)
    #[arg(long, global = true)]
    pub repo_root: Option<PathBuf>,

    /// Existing project directory copied into app/
    #[arg(long, global = true, requires = "project_file", conflicts_with = "template")]
    pub project_dir: Option<PathBuf>,

    /// Project file name inside --project-dir
    #[arg(long, global = true, requires = "project_dir")]
    pub project_file: Option<String>,

    /// Template used to create a new project in app/
    #[arg(long, global = true, requires = "exe_name")]
    pub template: Option<String>,

    /// Name of the project created from --template
    #[arg(long, global = true, requires = "template")]
    pub exe_name: Option<String>,

    /// Language of the project created from --template
    #[arg(long, global = true, value_enum, requires = "template")]
    pub language: Option<Language>,

    /// Source file, relative to the project, that receives startup logging
    #[arg(long, global = true, requires = "startup_line")]
    pub startup_file: Option<PathBuf>,

    /// Exact line after which the startup statement is inserted
    #[arg(long, global = true, requires = "startup_file", allow_hyphen_values = true)]
    pub startup_line: Option<String>,

    /// Path to the dotnet executable
    #[arg(long, global = true, default_value = "dotnet")]
    pub dotnet: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Preparation operations
#[derive(Subcommand, Debug)]
pub enum OperationCommand {
    /// Builds the project
    Build(CommonArgs),
    /// Publishes the project
    Publish(CommonArgs),
    /// Backs up the project to tmp folder
    Backup(CommonArgs),
}

impl OperationCommand {
    pub fn operation(&self) -> Operation {
        match self {
            OperationCommand::Build(_) => Operation::Build,
            OperationCommand::Publish(_) => Operation::Publish,
            OperationCommand::Backup(_) => Operation::Backup,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            OperationCommand::Build(args)
            | OperationCommand::Publish(args)
            | OperationCommand::Backup(args) => args,
        }
    }
}

/// Options that are common across the dotnet commands
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Build configuration
    #[arg(short, long, value_enum, value_name = "config", default_value_t = Configuration::Release)]
    pub configuration: Configuration,

    /// Target framework moniker
    #[arg(short, long, value_name = "framework")]
    pub framework: Option<String>,

    /// Runtime identifier
    #[arg(short, long, value_name = "runtime")]
    pub runtime: Option<String>,

    /// Flags passed through to msbuild
    #[arg(long, value_name = "/p:Foo=Bar;/p:Baz=Blee;...")]
    pub msbuild: Option<String>,
}

/// Fixed scenario directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Scenario working directory
    pub root: PathBuf,
    /// Copy of the project under test
    pub app_dir: PathBuf,
    /// Build output
    pub bin_dir: PathBuf,
    /// Publish output
    pub pub_dir: PathBuf,
    /// Backup of app_dir
    pub tmp_dir: PathBuf,
}

impl Layout {
    pub fn new(root: &Path) -> Self {
        Self {
            app_dir: root.join("app"),
            bin_dir: root.join("bin"),
            pub_dir: root.join("pub"),
            tmp_dir: root.join("tmp"),
            root: root.to_path_buf(),
        }
    }
}

/// Where the project under test comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// Copy an existing project directory into app/
    Existing { dir: PathBuf, file: String },
    /// Create a new project from a template
    Template {
        template: String,
        exe_name: String,
        language: Option<Language>,
    },
}

/// Startup logging injection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupLogging {
    pub file: PathBuf,
    pub line: String,
}

/// Runtime configuration parsed from CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Operation to run
    pub operation: Operation,
    /// Build configuration
    pub configuration: Configuration,
    /// Target framework moniker
    pub framework: Option<String>,
    /// Runtime identifier
    pub runtime: Option<String>,
    /// Pass-through msbuild properties, one per item
    pub msbuild: Vec<String>,
    /// Scenario directories
    pub layout: Layout,
    /// Repository root
    pub repo_root: PathBuf,
    /// Restore target for packages
    pub packages_dir: PathBuf,
    /// Directory holding PerfLab.cs
    pub static_deps_dir: PathBuf,
    /// Project to prepare, if any
    pub project: Option<ProjectSource>,
    /// Startup logging injection, if any
    pub startup: Option<StartupLogging>,
    /// dotnet executable
    pub dotnet: PathBuf,
    /// Enable verbose output
    pub verbose: bool,
}

impl Config {
    /// Create Config from CLI arguments and the process environment
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let cwd = env::current_dir()?;
        let payload = env::var_os(HELIX_PAYLOAD_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Ok(Self::resolve(cli, &cwd, payload))
    }

    /// Create Config from CLI arguments with an explicit environment
    pub fn resolve(cli: Cli, cwd: &Path, helix_payload: Option<PathBuf>) -> Self {
        let working_dir = match cli.working_dir {
            Some(dir) => absolute_from(cwd, dir),
            None => cwd.to_path_buf(),
        };

        // The toolchain runs inside working_dir, so every path handed to it
        // must not depend on the process directory
        let repo_root = match cli.repo_root {
            Some(dir) => absolute_from(cwd, dir),
            None => find_repo_root(&working_dir),
        };

        let static_deps_dir = match helix_payload {
            Some(payload) => absolute_from(cwd, payload).join("staticdeps"),
            None => repo_root.join("src").join("scenarios").join("staticdeps"),
        };

        let project = match (cli.project_dir, cli.project_file, cli.template, cli.exe_name) {
            (Some(dir), Some(file), _, _) => Some(ProjectSource::Existing { dir, file }),
            (_, _, Some(template), Some(exe_name)) => Some(ProjectSource::Template {
                template,
                exe_name,
                language: cli.language,
            }),
            _ => None,
        };

        let startup = match (cli.startup_file, cli.startup_line) {
            (Some(file), Some(line)) => Some(StartupLogging { file, line }),
            _ => None,
        };

        let operation = cli.operation.operation();
        let common = cli.operation.common().clone();

        Config {
            operation,
            configuration: common.configuration,
            framework: common.framework,
            runtime: common.runtime,
            msbuild: common
                .msbuild
                .as_deref()
                .map(split_msbuild_properties)
                .unwrap_or_default(),
            layout: Layout::new(&working_dir),
            packages_dir: repo_root.join("artifacts").join("packages"),
            repo_root,
            static_deps_dir,
            project,
            startup,
            dotnet: resolve_program(cwd, cli.dotnet),
            verbose: cli.verbose,
        }
    }
}

fn absolute_from(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

/// Bare names like `dotnet` are left for PATH lookup; anything with a
/// directory component is anchored at `cwd`
pub fn resolve_program(cwd: &Path, program: PathBuf) -> PathBuf {
    if program.components().count() > 1 {
        absolute_from(cwd, program)
    } else {
        program
    }
}

/// Split a `/p:Foo=Bar;/p:Baz=Blee` list into individual properties
pub fn split_msbuild_properties(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Nearest ancestor holding `src/scenarios`, else `start` itself
pub fn find_repo_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join("src").join("scenarios").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["precommands"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    fn resolve(args: &[&str]) -> Config {
        Config::resolve(parse(args), Path::new("/work"), None)
    }

    // ==================== Cli parsing tests ====================

    #[test]
    fn test_cli_requires_operation() {
        let result = Cli::try_parse_from(["precommands"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_operation() {
        assert!(Cli::try_parse_from(["precommands", "clean"]).is_err());
    }

    #[test]
    fn test_cli_rejects_invalid_configuration() {
        let result = Cli::try_parse_from(["precommands", "build", "-c", "Checked"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["precommands", "build", "-c", "release"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_configuration_defaults_to_release() {
        for op in ["build", "publish", "backup"] {
            let cli = parse(&[op]);
            assert_eq!(cli.operation.common().configuration, Configuration::Release);
        }
    }

    #[test]
    fn test_cli_common_args() {
        let cli = parse(&[
            "publish",
            "-c",
            "Debug",
            "-f",
            "net8.0",
            "-r",
            "linux-x64",
            "--msbuild",
            "/p:Foo=Bar;/p:Baz=Blee",
        ]);

        assert_eq!(cli.operation.operation(), Operation::Publish);
        let common = cli.operation.common();
        assert_eq!(common.configuration, Configuration::Debug);
        assert_eq!(common.framework.as_deref(), Some("net8.0"));
        assert_eq!(common.runtime.as_deref(), Some("linux-x64"));
        assert_eq!(common.msbuild.as_deref(), Some("/p:Foo=Bar;/p:Baz=Blee"));
    }

    #[test]
    fn test_cli_long_common_args() {
        let cli = parse(&["build", "--configuration", "Debug", "--framework", "net9.0"]);
        let common = cli.operation.common();
        assert_eq!(common.configuration, Configuration::Debug);
        assert_eq!(common.framework.as_deref(), Some("net9.0"));
    }

    #[test]
    fn test_cli_global_args_after_operation() {
        let cli = parse(&["backup", "--working-dir", "scenario", "-v"]);
        assert_eq!(cli.working_dir, Some(PathBuf::from("scenario")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_project_dir_requires_file() {
        let result = Cli::try_parse_from(["precommands", "--project-dir", "src/app", "build"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_project_dir_conflicts_with_template() {
        let result = Cli::try_parse_from([
            "precommands",
            "--project-dir",
            "src/app",
            "--project-file",
            "app.csproj",
            "--template",
            "console",
            "--exe-name",
            "app",
            "build",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_startup_file_requires_line() {
        let result = Cli::try_parse_from(["precommands", "--startup-file", "Program.cs", "build"]);
        assert!(result.is_err());
    }

    // ==================== Config::resolve tests ====================

    #[test]
    fn test_config_defaults() {
        let config = resolve(&["build"]);

        assert_eq!(config.operation, Operation::Build);
        assert_eq!(config.configuration, Configuration::Release);
        assert_eq!(config.framework, None);
        assert_eq!(config.runtime, None);
        assert!(config.msbuild.is_empty());
        assert_eq!(config.layout, Layout::new(Path::new("/work")));
        assert_eq!(config.project, None);
        assert_eq!(config.startup, None);
        assert_eq!(config.dotnet, PathBuf::from("dotnet"));
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_layout_dirs() {
        let config = resolve(&["backup", "--working-dir", "scenario"]);

        assert_eq!(config.layout.app_dir, PathBuf::from("/work/scenario/app"));
        assert_eq!(config.layout.bin_dir, PathBuf::from("/work/scenario/bin"));
        assert_eq!(config.layout.pub_dir, PathBuf::from("/work/scenario/pub"));
        assert_eq!(config.layout.tmp_dir, PathBuf::from("/work/scenario/tmp"));
    }

    #[test]
    fn test_config_repo_paths() {
        let config = resolve(&["build", "--repo-root", "/repo"]);

        assert_eq!(config.repo_root, PathBuf::from("/repo"));
        assert_eq!(config.packages_dir, PathBuf::from("/repo/artifacts/packages"));
        assert_eq!(
            config.static_deps_dir,
            PathBuf::from("/repo/src/scenarios/staticdeps")
        );
    }

    #[test]
    fn test_config_relative_repo_root() {
        let config = resolve(&["--working-dir", "scenario", "--repo-root", "../repo", "build"]);

        assert_eq!(config.layout.root, PathBuf::from("/work/scenario"));
        assert_eq!(config.repo_root, PathBuf::from("/work/../repo"));
        assert_eq!(
            config.packages_dir,
            PathBuf::from("/work/../repo/artifacts/packages")
        );
        assert_eq!(
            config.static_deps_dir,
            PathBuf::from("/work/../repo/src/scenarios/staticdeps")
        );
        assert!(config.packages_dir.is_absolute());
    }

    #[test]
    fn test_config_relative_helix_payload() {
        let cli = parse(&["build"]);
        let config = Config::resolve(cli, Path::new("/work"), Some(PathBuf::from("payload")));

        assert_eq!(config.static_deps_dir, PathBuf::from("/work/payload/staticdeps"));
    }

    #[test]
    fn test_config_dotnet_path_resolution() {
        let config = resolve(&["build", "--dotnet", "./.dotnet/dotnet"]);
        assert_eq!(config.dotnet, PathBuf::from("/work/./.dotnet/dotnet"));

        let config = resolve(&["build", "--dotnet", "/opt/dotnet/dotnet"]);
        assert_eq!(config.dotnet, PathBuf::from("/opt/dotnet/dotnet"));

        let config = resolve(&["build", "--dotnet", "dotnet"]);
        assert_eq!(config.dotnet, PathBuf::from("dotnet"));
    }

    #[test]
    fn test_config_helix_payload_static_deps() {
        let cli = parse(&["build", "--repo-root", "/repo"]);
        let config = Config::resolve(cli, Path::new("/work"), Some(PathBuf::from("/payload")));

        assert_eq!(config.static_deps_dir, PathBuf::from("/payload/staticdeps"));
        assert_eq!(config.packages_dir, PathBuf::from("/repo/artifacts/packages"));
    }

    #[test]
    fn test_config_msbuild_split() {
        let config = resolve(&["build", "--msbuild", "/p:Foo=Bar;;/p:Baz=Blee;"]);
        assert_eq!(config.msbuild, vec!["/p:Foo=Bar", "/p:Baz=Blee"]);
    }

    #[test]
    fn test_config_existing_project() {
        let config = resolve(&[
            "--project-dir",
            "/src/emptyconsole",
            "--project-file",
            "emptyconsole.csproj",
            "build",
        ]);

        assert_eq!(
            config.project,
            Some(ProjectSource::Existing {
                dir: PathBuf::from("/src/emptyconsole"),
                file: "emptyconsole.csproj".to_string(),
            })
        );
    }

    #[test]
    fn test_config_template_project() {
        let config = resolve(&[
            "publish",
            "--template",
            "console",
            "--exe-name",
            "hello",
            "--language",
            "F#",
        ]);

        assert_eq!(
            config.project,
            Some(ProjectSource::Template {
                template: "console".to_string(),
                exe_name: "hello".to_string(),
                language: Some(Language::FSharp),
            })
        );
    }

    #[test]
    fn test_config_startup_logging() {
        let config = resolve(&[
            "build",
            "--startup-file",
            "Program.cs",
            "--startup-line",
            "    static void Main()",
        ]);

        assert_eq!(
            config.startup,
            Some(StartupLogging {
                file: PathBuf::from("Program.cs"),
                line: "    static void Main()".to_string(),
            })
        );
    }

    // ==================== find_repo_root tests ====================

    #[test]
    fn test_find_repo_root_ancestor() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src").join("scenarios")).unwrap();
        let nested = temp.path().join("src").join("scenarios").join("emptyconsole");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_repo_root(&nested), temp.path());
    }

    #[test]
    fn test_find_repo_root_fallback() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_repo_root(temp.path()), temp.path());
    }
}
