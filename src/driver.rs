use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::classify::classify_all;
use crate::config::Config;
use crate::emit;
use crate::model::{Model, Version};
use crate::parse::parse_file;
use crate::types::FatalError;

pub const HEADER_FILE: &str = "vk.h";
pub const SOURCE_FILE: &str = "vk.c";
pub const BOOTSTRAP_FILE: &str = "dlvk.c";
pub const LIBRARY_NAME: &str = "vk";

const BOOTSTRAP_SOURCE: &str = include_str!("../native/dlvk.c");

/// Failures of a generator run. In every case nothing has been written to
/// the output paths.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{} already exists (use -w to overwrite)", .0.display())]
    Precondition(PathBuf),

    #[error(transparent)]
    Structural(#[from] FatalError),

    #[error("failed to build static library: {0}")]
    ExternalTool(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Path of `vk.xml`.
    pub registry: PathBuf,
    pub out_dir: PathBuf,
    /// Replace output files left by a previous run.
    pub overwrite: bool,
    /// Also compile the generated source and the bootstrap module into a
    /// static library.
    pub static_lib: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            registry: PathBuf::from("vk.xml"),
            out_dir: PathBuf::from("."),
            overwrite: false,
            static_lib: false,
        }
    }
}

impl Options {
    /// Final paths of everything the run produces.
    pub fn outputs(&self) -> Vec<PathBuf> {
        artifact_names(self.static_lib)
            .into_iter()
            .map(|name| self.out_dir.join(name))
            .collect()
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub paths: Vec<PathBuf>,
    pub version: Version,
    /// Number of procedures that made it into the generated code.
    pub emitted: usize,
}

/// Generates the loader files described by `options`.
///
/// Files are staged in a scratch directory under `out_dir` and moved to
/// their final names once every step has succeeded. Existing outputs are
/// refused up front unless `options.overwrite` is set. On error the final
/// paths are left as they were.
pub fn run(options: &Options, config: &Config) -> Result<Artifacts, GenerateError> {
    let outputs = options.outputs();
    if !options.overwrite {
        if let Some(path) = outputs.iter().find(|p| p.exists()) {
            return Err(GenerateError::Precondition(path.clone()));
        }
    }

    let (registry, errors) = parse_file(&options.registry)?;
    for e in &errors {
        warn!("non-fatal error while parsing registry: {:?}", e);
    }

    let model = Model::from_registry(&registry, config)?;
    info!(
        "vk.xml {}: {} core procedures",
        model.version,
        model.procedures.len()
    );
    let procs = classify_all(model.procedures, config);
    let emitted = procs.iter().filter(|p| p.is_emitted(config)).count();
    let output = emit::generate(&procs, &model.version, config)?;

    let scratch = tempfile::Builder::new()
        .prefix(".genvk-")
        .tempdir_in(&options.out_dir)?;
    debug!("staging into {}", scratch.path().display());
    fs::write(scratch.path().join(HEADER_FILE), &output.header)?;
    fs::write(scratch.path().join(SOURCE_FILE), &output.source)?;
    if options.static_lib {
        build_static_lib(scratch.path())?;
    }

    install(scratch.path(), &artifact_names(options.static_lib), &outputs)?;
    scratch.close()?;

    Ok(Artifacts {
        paths: outputs,
        version: model.version,
        emitted,
    })
}

fn artifact_names(static_lib: bool) -> Vec<String> {
    let mut names = vec![String::from(HEADER_FILE), String::from(SOURCE_FILE)];
    if static_lib {
        names.push(library_file_name(env!("GENVK_TARGET")));
    }
    names
}

/// Moves the staged artifacts `names` from `scratch` to `finals`. Files they
/// replace are parked in `scratch` first; if any move fails, everything is
/// put back so the final paths hold what they held before the call.
fn install(scratch: &Path, names: &[String], finals: &[PathBuf]) -> io::Result<()> {
    if let Some(dir) = finals.iter().find(|p| p.is_dir()) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} is a directory", dir.display()),
        ));
    }

    let previous = scratch.join("previous");
    fs::create_dir(&previous)?;

    let mut parked = Vec::new();
    for (name, path) in names.iter().zip(finals) {
        if !path.exists() {
            continue;
        }
        if let Err(e) = fs::rename(path, previous.join(name)) {
            restore(&previous, &parked, &[]);
            return Err(e);
        }
        parked.push((name.as_str(), path.as_path()));
    }

    let mut installed = Vec::new();
    for (name, path) in names.iter().zip(finals) {
        if let Err(e) = fs::rename(scratch.join(name), path) {
            restore(&previous, &parked, &installed);
            return Err(e);
        }
        installed.push(path.as_path());
    }

    Ok(())
}

fn restore(previous: &Path, parked: &[(&str, &Path)], installed: &[&Path]) {
    for path in installed {
        if let Err(e) = fs::remove_file(path) {
            warn!("failed to remove {}: {}", path.display(), e);
        }
    }
    for (name, path) in parked {
        if let Err(e) = fs::rename(previous.join(name), path) {
            warn!("failed to restore {}: {}", path.display(), e);
        }
    }
}

/// File name `cc` gives the archive for `target`.
pub fn library_file_name(target: &str) -> String {
    if target.contains("msvc") {
        format!("{}.lib", LIBRARY_NAME)
    } else {
        format!("lib{}.a", LIBRARY_NAME)
    }
}

fn build_static_lib(dir: &Path) -> Result<(), GenerateError> {
    fs::write(dir.join(BOOTSTRAP_FILE), BOOTSTRAP_SOURCE)?;

    let mut build = cc::Build::new();
    build
        .opt_level(2)
        .cargo_metadata(false)
        .cargo_warnings(false)
        .target(env!("GENVK_TARGET"))
        .host(env!("GENVK_HOST"))
        .include(dir)
        .out_dir(dir)
        .file(dir.join(SOURCE_FILE))
        .file(dir.join(BOOTSTRAP_FILE));

    info!("building {}", library_file_name(env!("GENVK_TARGET")));
    build
        .try_compile(LIBRARY_NAME)
        .map_err(|e| GenerateError::ExternalTool(e.to_string()))
}
