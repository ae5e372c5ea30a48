//! Preparation steps run before a performance scenario.
//!
//! Handles building, publishing and backing up the project under test:
//! - build: restore, then build into bin/
//! - publish: restore, then publish into pub/
//! - backup: fresh copy of app/ into tmp/

use std::path::Path;

use tracing::{debug, info, warn};

use crate::codefix::insert_after;
use crate::config::{Config, ProjectSource};
use crate::copier::{copy_file, create_dir, replace_directory};
use crate::dotnet::{BuildTool, CompileSettings, DotnetCli, ToolCommand};
use crate::error::PrepError;
use crate::project::{Language, Operation, Project, ProjectFile};

/// Statement injected by [`PreCommands::add_startup_logging`]
pub const STARTUP_STATEMENT: &str = "PerfLabGenericEventSource.Log.Startup();";

/// Event source copied next to the project file
pub const EVENT_SOURCE_FILE: &str = "PerfLab.cs";

/// Runs the preparation steps for one scenario
#[derive(Debug)]
pub struct PreCommands<T: BuildTool = DotnetCli> {
    config: Config,
    tool: T,
    project: Option<Project>,
}

impl PreCommands<DotnetCli> {
    /// Preparation backed by the dotnet executable named in the config
    pub fn new(config: Config) -> Self {
        let tool = DotnetCli::new(config.dotnet.clone(), config.verbose);
        Self::with_tool(config, tool)
    }
}

impl<T: BuildTool> PreCommands<T> {
    pub fn with_tool(config: Config, tool: T) -> Self {
        Self {
            config,
            tool,
            project: None,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// The project bound by [`existing`](Self::existing) or
    /// [`new_project`](Self::new_project)
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Set up the project and startup logging requested in the config
    pub fn prepare(&mut self) -> Result<&mut Self, PrepError> {
        match self.config.project.clone() {
            Some(ProjectSource::Existing { dir, file }) => {
                self.existing(&dir, &file)?;
            }
            Some(ProjectSource::Template {
                template,
                exe_name,
                language,
            }) => {
                self.new_project(&template, &exe_name, language)?;
            }
            None => {}
        }

        if let Some(startup) = self.config.startup.clone() {
            self.add_startup_logging(&startup.file, &startup.line)?;
        }

        Ok(self)
    }

    /// Make a new app in app/ from the given template
    pub fn new_project(
        &mut self,
        template: &str,
        exe_name: &str,
        language: Option<Language>,
    ) -> Result<&mut Self, PrepError> {
        let layout = &self.config.layout;
        create_dir(&layout.root)?;

        let command = ToolCommand::New {
            template: template.to_string(),
            output_dir: layout.app_dir.clone(),
            name: exe_name.to_string(),
            framework: self.config.framework.clone(),
            language,
        };
        self.tool.run(&command, &layout.root)?;

        let extension = language.unwrap_or_default().project_extension();
        let file = ProjectFile::new(layout.app_dir.join(format!("{exe_name}.{extension}")));
        info!(project = %file, template, "created project");

        self.project = Some(Project::new(file, layout.bin_dir.clone()));
        Ok(self)
    }

    /// Copy an existing project into app/ and bind to its project file
    pub fn existing(&mut self, project_dir: &Path, project_file: &str) -> Result<&mut Self, PrepError> {
        let layout = &self.config.layout;
        let (files, _) = replace_directory(project_dir, &layout.app_dir)?;
        debug!(
            src = %project_dir.display(),
            dst = %layout.app_dir.display(),
            files,
            "copied project"
        );

        let file = ProjectFile::new(layout.app_dir.join(project_file));
        if let Some(framework) = &self.config.framework {
            if file.set_framework(framework)? {
                info!(project = %file, framework = %framework, "set target framework");
            }
        }

        self.project = Some(Project::new(file, layout.bin_dir.clone()));
        Ok(self)
    }

    /// Run the configured operation
    pub fn execute(&self) -> Result<(), PrepError> {
        info!(
            operation = %self.config.operation,
            configuration = %self.config.configuration,
            "running precommand"
        );

        match self.config.operation {
            Operation::Build => {
                self.restore()?;
                self.build()
            }
            Operation::Publish => {
                self.restore()?;
                self.publish()
            }
            Operation::Backup => self.backup(),
        }
    }

    pub fn add_startup_logging(&self, file: &Path, line: &str) -> Result<(), PrepError> {
        self.add_event_source(file, line, STARTUP_STATEMENT)
    }

    /// Add a copy of the event source to the project and insert the call.
    ///
    /// `file` is relative to the directory holding the project file and
    /// `line` is the exact line the statement goes after.
    pub fn add_event_source(&self, file: &Path, line: &str, statement: &str) -> Result<(), PrepError> {
        let project = self.require_project()?;
        let project_dir = project.file.directory();

        copy_file(
            &self.config.static_deps_dir.join(EVENT_SOURCE_FILE),
            &project_dir.join(EVENT_SOURCE_FILE),
        )?;
        insert_after(&project_dir.join(file), line, statement)?;

        info!(file = %file.display(), "added {statement}");
        Ok(())
    }

    fn require_project(&self) -> Result<&Project, PrepError> {
        self.project.as_ref().ok_or(PrepError::NoProject)
    }

    fn restore(&self) -> Result<(), PrepError> {
        let project = self.require_project()?;
        let command = ToolCommand::Restore {
            project: project.file.path().to_path_buf(),
            packages_dir: self.config.packages_dir.clone(),
            runtime: self.config.runtime.clone(),
        };
        self.tool.run(&command, &self.config.layout.root)
    }

    fn build(&self) -> Result<(), PrepError> {
        let project = self.require_project()?;
        self.check_framework(&project.file);

        let settings = self.compile_settings(project, &project.bin_dir);
        self.tool
            .run(&ToolCommand::Build(settings), &self.config.layout.root)
    }

    fn publish(&self) -> Result<(), PrepError> {
        let project = self.require_project()?;
        self.check_framework(&project.file);

        let settings = self.compile_settings(project, &self.config.layout.pub_dir);
        self.tool
            .run(&ToolCommand::Publish(settings), &self.config.layout.root)
    }

    fn backup(&self) -> Result<(), PrepError> {
        let layout = &self.config.layout;
        let (files, bytes) = replace_directory(&layout.app_dir, &layout.tmp_dir)?;
        info!(
            dst = %layout.tmp_dir.display(),
            files,
            bytes,
            "backed up app"
        );
        Ok(())
    }

    fn compile_settings(&self, project: &Project, output_dir: &Path) -> CompileSettings {
        CompileSettings {
            project: project.file.path().to_path_buf(),
            configuration: self.config.configuration,
            framework: self.config.framework.clone(),
            runtime: self.config.runtime.clone(),
            output_dir: output_dir.to_path_buf(),
            packages_dir: self.config.packages_dir.clone(),
            properties: self.config.msbuild.clone(),
        }
    }

    /// Warn when the requested framework is not one the project declares
    fn check_framework(&self, file: &ProjectFile) {
        let Some(requested) = &self.config.framework else {
            return;
        };

        match file.target_frameworks() {
            Ok(declared) if !declared.is_empty() && !declared.contains(requested) => {
                warn!(
                    project = %file,
                    requested = %requested,
                    declared = %declared.join(";"),
                    "requested framework is not declared by the project"
                );
            }
            Ok(_) => {}
            Err(e) => debug!(project = %file, "could not read target frameworks: {e}"),
        }
    }
}
