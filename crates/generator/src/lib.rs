//! Layer code generation for kratos services
//!
//! This crate renders the intermediate model produced by the parser into
//! Go source for the business (biz) and data-access (data) layers:
//! - `<service>.go` (domain entities, repo interface, use case)
//! - `<service>_repo.go` (repo implementation)
//! - `model.go` (data models)
//!
//! Existing files are never overwritten; they are reported as skipped.

mod templates;

use protoscaffold_common::{
    naming, FieldDefinition, GeneratorError, RenderOptions, Result, ServiceDefinition,
};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tera::Tera;

/// What happened to one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written(PathBuf),
    /// A file already existed at the path and was left untouched
    Skipped(PathBuf),
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Written(path) | FileOutcome::Skipped(path) => path,
        }
    }
}

/// Per-file outcomes of one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub outcomes: Vec<FileOutcome>,
}

impl GenerationReport {
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Written(path) => Some(path.as_path()),
            FileOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Skipped(path) => Some(path.as_path()),
            FileOutcome::Written(_) => None,
        })
    }

    /// Append another run's outcomes
    pub fn merge(&mut self, other: GenerationReport) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Biz layer entity, named after an RPC's short request or reply type
#[derive(Debug, Serialize)]
struct Entity<'a> {
    name: &'a str,
    fields: &'a [FieldDefinition],
}

/// Layer generator
///
/// Renders a `ServiceDefinition` with embedded templates:
/// - biz layer: entities, `<Service>Repo` interface, `<Service>UseCase`
/// - data layer: `<Service>RepoImpl` and per-message data models
pub struct LayerGenerator {
    options: RenderOptions,
    tera: Tera,
}

impl LayerGenerator {
    /// Create a new layer generator with the given render options
    pub fn new(options: RenderOptions) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { options, tera })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Generate `<service>.go` into `target_dir`
    pub fn generate_biz(
        &self,
        service: &ServiceDefinition,
        target_dir: &Path,
    ) -> Result<GenerationReport> {
        ensure_dir(target_dir)?;
        let package = go_package_for_dir(target_dir, "biz");
        let rendered = self.render_biz(service, &package)?;

        let path = target_dir.join(format!("{}.go", service.name.to_lowercase()));
        Ok(GenerationReport {
            outcomes: vec![write_new_file(&path, &rendered)?],
        })
    }

    /// Generate `<service>_repo.go` and `model.go` into `target_dir`
    pub fn generate_data(
        &self,
        service: &ServiceDefinition,
        target_dir: &Path,
    ) -> Result<GenerationReport> {
        ensure_dir(target_dir)?;
        let package = go_package_for_dir(target_dir, "data");

        let repo = self.render_data_repo(service, &package)?;
        let repo_path = target_dir.join(format!("{}_repo.go", service.name.to_lowercase()));

        let model = self.render_data_model(service, &package)?;
        let model_path = target_dir.join("model.go");

        Ok(GenerationReport {
            outcomes: vec![
                write_new_file(&repo_path, &repo)?,
                write_new_file(&model_path, &model)?,
            ],
        })
    }

    /// Render the biz layer source without touching the filesystem
    pub fn render_biz(&self, service: &ServiceDefinition, package: &str) -> Result<String> {
        let mut context = self.create_context(service, package);
        context.insert("entities", &biz_entities(service));
        self.render(templates::BIZ_TEMPLATE, &context)
    }

    /// Render the data repo source without touching the filesystem
    pub fn render_data_repo(&self, service: &ServiceDefinition, package: &str) -> Result<String> {
        let mut context = self.create_context(service, package);
        context.insert(
            "domain",
            &naming::package_name(&self.options.domain_package),
        );
        context.insert(
            "proto_package",
            self.options.proto_package_or(&service.go_package),
        );
        self.render(templates::DATA_REPO_TEMPLATE, &context)
    }

    /// Render the data models source without touching the filesystem
    pub fn render_data_model(&self, service: &ServiceDefinition, package: &str) -> Result<String> {
        let context = self.create_context(service, package);
        self.render(templates::DATA_MODEL_TEMPLATE, &context)
    }

    fn render(&self, template: &str, context: &tera::Context) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            GeneratorError::Generation(format!("Template error in {}: {:?}", template, e))
        })
    }

    /// Create template context from ServiceDefinition
    fn create_context(&self, service: &ServiceDefinition, package: &str) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("service", service);
        context.insert("options", &self.options);
        context.insert("package", package);
        context
    }
}

/// Unique request/reply short names in RPC order, with the request
/// message's fields when the schema declares it
fn biz_entities(service: &ServiceDefinition) -> Vec<Entity<'_>> {
    let mut entities: Vec<Entity<'_>> = Vec::new();
    for method in &service.methods {
        let sides = [
            (&method.request_type_short, &method.request_type_full),
            (&method.response_type_short, &method.response_type_full),
        ];
        for (short, full) in sides {
            if entities.iter().any(|e| e.name == short.as_str()) {
                continue;
            }
            let bare = naming::clean_type_name(full);
            let fields = service
                .messages
                .iter()
                .find(|m| m.name == bare)
                .map_or(&[][..], |m| m.fields.as_slice());
            entities.push(Entity {
                name: short,
                fields,
            });
        }
    }
    entities
}

/// Go package clause for files written into `dir`
fn go_package_for_dir(dir: &Path, fallback: &str) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.replace(['-', '.'], "_"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        tracing::info!(dir = %dir.display(), "creating target directory");
    }
    fs::create_dir_all(dir).map_err(|e| {
        GeneratorError::Generation(format!(
            "Failed to create target directory {}: {}",
            dir.display(),
            e
        ))
    })
}

/// Write `content` to `path` unless something already exists there
fn write_new_file(path: &Path, content: &str) -> Result<FileOutcome> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            tracing::warn!(path = %path.display(), "file already exists, skipping");
            return Ok(FileOutcome::Skipped(path.to_path_buf()));
        }
        Err(e) => {
            return Err(GeneratorError::Generation(format!(
                "Failed to create {}: {}",
                path.display(),
                e
            )))
        }
    };

    file.write_all(content.as_bytes()).map_err(|e| {
        GeneratorError::Generation(format!("Failed to write {}: {}", path.display(), e))
    })?;
    tracing::info!(path = %path.display(), "generated file");
    Ok(FileOutcome::Written(path.to_path_buf()))
}
