//! Container image recipe for running passtider.
//!
//! The image is built in two stages: a toolchain stage that compiles the
//! release binary, and a minimal runtime stage in which the binary runs as a
//! restricted account from a fixed application directory. The recipe is kept
//! as data so the rendered `Containerfile`, the build context and the
//! post-build verification all agree on the same values.

mod context;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::config::ImageConfig;
use crate::error::{ConfigError, FilesystemError, PasstiderError};

pub use context::build_context;

/// Name of the binary copied into the runtime stage.
pub const BINARY_NAME: &str = "passtider";

/// File name of the rendered recipe inside the build context.
pub const CONTAINERFILE_NAME: &str = "Containerfile";

/// Dependency manifests copied before the sources so fetches are cached.
pub const MANIFEST_FILES: &[&str] = &["Cargo.toml", "Cargo.lock"];

/// Source directory copied into the build stage.
pub const SOURCE_DIR: &str = "src";

/// Subcommand the container runs.
pub const ENTRYPOINT_COMMAND: &str = "search";

const BUILD_DIR: &str = "/build";

/// Everything needed to render, build and verify the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecipe {
    /// Tag applied to the built image.
    pub tag: String,
    /// Toolchain image for the build stage.
    pub builder_image: String,
    /// Minimal image for the runtime stage.
    pub base_image: String,
    /// Application directory inside the image.
    pub app_dir: Utf8PathBuf,
    /// Restricted account name.
    pub user: String,
    /// Restricted account id.
    pub uid: u32,
    /// Environment variable set to the application directory.
    pub search_path_env: String,
    /// Exec-form entrypoint.
    pub entrypoint: Vec<String>,
}

impl ImageRecipe {
    /// Derive a recipe from `[image]` configuration.
    #[must_use]
    pub fn from_config(config: &ImageConfig) -> Self {
        let binary = config.app_dir.join(BINARY_NAME);
        Self {
            tag: config.tag.clone(),
            builder_image: config.builder_image.clone(),
            base_image: config.base_image.clone(),
            app_dir: config.app_dir.clone(),
            user: config.user.clone(),
            uid: config.uid,
            search_path_env: config.search_path_env.clone(),
            entrypoint: vec![binary.into_string(), String::from(ENTRYPOINT_COMMAND)],
        }
    }

    /// Replace the tag, keeping everything else.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Path of the binary inside the runtime stage.
    #[must_use]
    pub fn binary_path(&self) -> Utf8PathBuf {
        self.app_dir.join(BINARY_NAME)
    }

    /// The `NAME=value` entry the runtime environment must contain.
    #[must_use]
    pub fn search_path_entry(&self) -> String {
        format!("{}={}", self.search_path_env, self.app_dir)
    }

    /// Check that the recipe yields a non-root, fixed-command image.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag.trim().is_empty() {
            return Err(invalid("image.tag", "must not be empty"));
        }
        if self.user.trim().is_empty() || self.user == "root" {
            return Err(invalid("image.user", "must name a non-root account"));
        }
        if self.uid == 0 {
            return Err(invalid("image.uid", "must not be 0"));
        }
        if !self.app_dir.as_str().starts_with('/') {
            return Err(invalid("image.app_dir", "must be an absolute path"));
        }
        if self.entrypoint.is_empty() {
            return Err(invalid("image.entrypoint", "must not be empty"));
        }
        if !is_env_name(&self.search_path_env) {
            return Err(invalid(
                "image.search_path_env",
                "must be a valid environment variable name",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn exec_form(args: &[String]) -> String {
    let quoted: Vec<String> = args
        .iter()
        .map(|arg| format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Render the two-stage `Containerfile` for `recipe`.
#[must_use]
pub fn render_containerfile(recipe: &ImageRecipe) -> String {
    let user = &recipe.user;
    let app_dir = &recipe.app_dir;
    let manifests = MANIFEST_FILES.join(" ");
    [
        format!("FROM {} AS build", recipe.builder_image),
        format!("WORKDIR {BUILD_DIR}"),
        format!("COPY {manifests} ./"),
        format!(
            "RUN mkdir {SOURCE_DIR} && touch {SOURCE_DIR}/lib.rs {SOURCE_DIR}/main.rs && cargo fetch --locked"
        ),
        format!("COPY {SOURCE_DIR} ./{SOURCE_DIR}"),
        format!("RUN cargo build --release --locked --bin {BINARY_NAME}"),
        String::new(),
        format!("FROM {}", recipe.base_image),
        format!(
            "RUN useradd --system --uid {} --no-create-home --shell /usr/sbin/nologin {user} \\\n    && mkdir -p {app_dir} \\\n    && chown {user}:{user} {app_dir}",
            recipe.uid
        ),
        format!(
            "COPY --from=build --chown={user}:{user} {BUILD_DIR}/target/release/{BINARY_NAME} {}",
            recipe.binary_path()
        ),
        format!("WORKDIR {app_dir}"),
        format!("USER {user}"),
        format!("ENV {}", recipe.search_path_entry()),
        format!("ENTRYPOINT {}", exec_form(&recipe.entrypoint)),
    ]
    .iter()
    .map(|line| format!("{line}\n"))
    .collect()
}

/// Write the rendered recipe to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns `FilesystemError::NotFound` when the parent directory is missing
/// and `FilesystemError::IoError` when the file cannot be written.
pub fn write_containerfile(path: &Utf8Path, recipe: &ImageRecipe) -> Result<(), PasstiderError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().unwrap_or(CONTAINERFILE_NAME);
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|_| {
        FilesystemError::NotFound {
            path: parent.as_std_path().to_path_buf(),
        }
    })?;
    dir.write(file_name, render_containerfile(recipe))
        .map_err(|error| FilesystemError::IoError {
            path: path.as_std_path().to_path_buf(),
            message: error.to_string(),
        })?;
    Ok(())
}
