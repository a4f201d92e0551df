//! Image build and post-build verification through the engine API.
//!
//! The build context is produced by [`crate::image::build_context`]; this
//! module only ships it to the engine, surfaces build output in the log and
//! checks that the resulting image honours the recipe.

use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::body_full;
use bollard::models::{BuildInfo, ImageInspect};
use bollard::query_parameters::BuildImageOptionsBuilder;
use futures_util::StreamExt;

use super::EngineConnector;
use crate::error::{ContainerError, PasstiderError};
use crate::image::{CONTAINERFILE_NAME, ImageRecipe};

/// Boxed future returned by [`ImageEngine::build_image`].
pub type BuildImageFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<BuildInfo>, bollard::errors::Error>> + Send + 'a>>;

/// Boxed future returned by [`ImageEngine::inspect_image`].
pub type InspectImageFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ImageInspect, bollard::errors::Error>> + Send + 'a>>;

/// Behaviour required to build and inspect images.
///
/// This abstraction keeps the build and verification logic testable without
/// a running daemon.
pub trait ImageEngine {
    /// Build `context` (a tar archive holding a `Containerfile`) as `tag`,
    /// returning every progress message the engine sent.
    fn build_image(&self, tag: &str, context: Vec<u8>) -> BuildImageFuture<'_>;

    /// Inspect the image called `tag`.
    fn inspect_image(&self, tag: &str) -> InspectImageFuture<'_>;
}

impl ImageEngine for Docker {
    fn build_image(&self, tag: &str, context: Vec<u8>) -> BuildImageFuture<'_> {
        let options = BuildImageOptionsBuilder::default()
            .dockerfile(CONTAINERFILE_NAME)
            .t(tag)
            .rm(true)
            .build();

        Box::pin(async move {
            let mut stream = std::pin::pin!(Self::build_image(
                self,
                options,
                None,
                Some(body_full(context.into())),
            ));
            let mut messages = vec![];
            while let Some(item) = stream.next().await {
                let info = item?;
                if let Some(line) = info
                    .stream
                    .as_deref()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                {
                    tracing::info!(target: "passtider::build", "{line}");
                }
                messages.push(info);
            }
            Ok(messages)
        })
    }

    fn inspect_image(&self, tag: &str) -> InspectImageFuture<'_> {
        let tag_owned = String::from(tag);
        Box::pin(async move { Self::inspect_image(self, &tag_owned).await })
    }
}

fn build_failed(tag: &str, message: impl Into<String>) -> PasstiderError {
    PasstiderError::from(ContainerError::BuildFailed {
        tag: String::from(tag),
        message: message.into(),
    })
}

/// Describe every way `inspect` differs from what `recipe` promises.
///
/// An empty list means the image runs the fixed command as the restricted
/// user from the application directory.
#[must_use]
pub fn image_mismatches(recipe: &ImageRecipe, inspect: &ImageInspect) -> Vec<String> {
    let Some(config) = inspect.config.as_ref() else {
        return vec![String::from("image has no runtime configuration")];
    };

    let mut mismatches = vec![];

    let user = config.user.as_deref().unwrap_or_default();
    if user != recipe.user {
        mismatches.push(format!("user is '{user}', expected '{}'", recipe.user));
    }

    let working_dir = config.working_dir.as_deref().unwrap_or_default();
    if working_dir != recipe.app_dir.as_str() {
        mismatches.push(format!(
            "working dir is '{working_dir}', expected '{}'",
            recipe.app_dir
        ));
    }

    let entrypoint = config.entrypoint.clone().unwrap_or_default();
    if entrypoint != recipe.entrypoint {
        mismatches.push(format!(
            "entrypoint is {entrypoint:?}, expected {:?}",
            recipe.entrypoint
        ));
    }

    if config.cmd.as_ref().is_some_and(|cmd| !cmd.is_empty()) {
        mismatches.push(String::from("image sets default arguments"));
    }

    let expected_env = recipe.search_path_entry();
    let has_env = config
        .env
        .as_ref()
        .is_some_and(|env| env.iter().any(|entry| *entry == expected_env));
    if !has_env {
        mismatches.push(format!("environment lacks '{expected_env}'"));
    }

    mismatches
}

impl EngineConnector {
    /// Build the image described by `recipe` from a prepared context.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::BuildFailed` when the engine rejects the
    /// request or reports a failing build step.
    pub async fn build_image_async<E: ImageEngine>(
        engine: &E,
        recipe: &ImageRecipe,
        context: Vec<u8>,
    ) -> Result<(), PasstiderError> {
        tracing::info!(tag = %recipe.tag, bytes = context.len(), "building image");
        let messages = engine
            .build_image(&recipe.tag, context)
            .await
            .map_err(|error| build_failed(&recipe.tag, error.to_string()))?;

        if let Some(message) = messages
            .iter()
            .find_map(|info| info.error_detail.as_ref()?.message.clone())
        {
            return Err(build_failed(&recipe.tag, message));
        }

        tracing::info!(tag = %recipe.tag, "image built");
        Ok(())
    }

    /// Inspect the image tagged `recipe.tag` and check it against `recipe`.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::InspectFailed` when the image cannot be
    /// inspected and `ContainerError::ImageMismatch` listing every property
    /// that differs.
    pub async fn verify_image_async<E: ImageEngine>(
        engine: &E,
        recipe: &ImageRecipe,
    ) -> Result<(), PasstiderError> {
        let inspect = engine.inspect_image(&recipe.tag).await.map_err(|error| {
            PasstiderError::from(ContainerError::InspectFailed {
                tag: recipe.tag.clone(),
                message: error.to_string(),
            })
        })?;

        let mismatches = image_mismatches(recipe, &inspect);
        if mismatches.is_empty() {
            tracing::info!(tag = %recipe.tag, "image matches recipe");
            return Ok(());
        }
        Err(ContainerError::ImageMismatch {
            tag: recipe.tag.clone(),
            mismatches,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use bollard::models::{ErrorDetail, ImageConfig as EngineImageConfig};
    use mockall::mock;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::config::ImageConfig;

    mock! {
        Engine {}

        impl ImageEngine for Engine {
            fn build_image(&self, tag: &str, context: Vec<u8>) -> BuildImageFuture<'_>;
            fn inspect_image(&self, tag: &str) -> InspectImageFuture<'_>;
        }
    }

    type RuntimeFixture = std::io::Result<tokio::runtime::Runtime>;

    #[fixture]
    fn runtime() -> RuntimeFixture {
        tokio::runtime::Runtime::new()
    }

    #[fixture]
    fn recipe() -> ImageRecipe {
        ImageRecipe::from_config(&ImageConfig::default())
    }

    fn conforming_inspect() -> ImageInspect {
        ImageInspect {
            config: Some(EngineImageConfig {
                user: Some(String::from("passtider")),
                working_dir: Some(String::from("/app")),
                entrypoint: Some(vec![
                    String::from("/app/passtider"),
                    String::from("search"),
                ]),
                env: Some(vec![
                    String::from("PATH=/usr/local/bin:/usr/bin"),
                    String::from("XDG_CONFIG_HOME=/app"),
                ]),
                ..EngineImageConfig::default()
            }),
            ..ImageInspect::default()
        }
    }

    #[rstest]
    fn conforming_image_has_no_mismatches(recipe: ImageRecipe) {
        assert!(image_mismatches(&recipe, &conforming_inspect()).is_empty());
    }

    #[rstest]
    fn root_image_reports_every_difference(recipe: ImageRecipe) {
        let inspect = ImageInspect {
            config: Some(EngineImageConfig {
                user: Some(String::new()),
                working_dir: Some(String::from("/")),
                cmd: Some(vec![String::from("bash")]),
                ..EngineImageConfig::default()
            }),
            ..ImageInspect::default()
        };
        let mismatches = image_mismatches(&recipe, &inspect);
        assert_eq!(mismatches.len(), 5, "unexpected mismatches: {mismatches:?}");
        assert_eq!(
            mismatches.first().map(String::as_str),
            Some("user is '', expected 'passtider'")
        );
    }

    #[rstest]
    fn build_passes_tag_and_context(runtime: RuntimeFixture, recipe: ImageRecipe) {
        let mut engine = MockEngine::new();
        engine
            .expect_build_image()
            .times(1)
            .returning(|tag, context| {
                assert_eq!(tag, "passtider:latest");
                assert_eq!(context, b"context".to_vec());
                Box::pin(async {
                    Ok(vec![BuildInfo {
                        stream: Some(String::from("Step 1/12 : FROM rust\n")),
                        ..BuildInfo::default()
                    }])
                })
            });

        runtime
            .expect("runtime should start")
            .block_on(EngineConnector::build_image_async(
                &engine,
                &recipe,
                b"context".to_vec(),
            ))
            .expect("build should succeed");
    }

    #[rstest]
    fn failing_build_step_becomes_build_failed(runtime: RuntimeFixture, recipe: ImageRecipe) {
        let mut engine = MockEngine::new();
        engine.expect_build_image().times(1).returning(|_, _| {
            Box::pin(async {
                Ok(vec![BuildInfo {
                    error_detail: Some(ErrorDetail {
                        message: Some(String::from("cargo build exited with 101")),
                        ..ErrorDetail::default()
                    }),
                    ..BuildInfo::default()
                }])
            })
        });

        let error = runtime
            .expect("runtime should start")
            .block_on(EngineConnector::build_image_async(&engine, &recipe, vec![]))
            .expect_err("build should fail");

        assert_eq!(
            error.to_string(),
            "failed to build image 'passtider:latest': cargo build exited with 101"
        );
    }

    #[rstest]
    fn engine_rejection_becomes_build_failed(runtime: RuntimeFixture, recipe: ImageRecipe) {
        let mut engine = MockEngine::new();
        engine.expect_build_image().times(1).returning(|_, _| {
            Box::pin(async {
                Err(bollard::errors::Error::DockerResponseServerError {
                    status_code: 500,
                    message: String::from("daemon unavailable"),
                })
            })
        });

        let result = runtime
            .expect("runtime should start")
            .block_on(EngineConnector::build_image_async(&engine, &recipe, vec![]));

        assert!(matches!(
            result,
            Err(PasstiderError::Container(ContainerError::BuildFailed { ref message, .. }))
                if message.contains("daemon unavailable")
        ));
    }

    #[rstest]
    fn verify_accepts_conforming_image(runtime: RuntimeFixture, recipe: ImageRecipe) {
        let mut engine = MockEngine::new();
        engine
            .expect_inspect_image()
            .times(1)
            .returning(|_| Box::pin(async { Ok(conforming_inspect()) }));

        runtime
            .expect("runtime should start")
            .block_on(EngineConnector::verify_image_async(&engine, &recipe))
            .expect("image should verify");
    }

    #[rstest]
    fn verify_reports_mismatches(runtime: RuntimeFixture, recipe: ImageRecipe) {
        let mut engine = MockEngine::new();
        engine.expect_inspect_image().times(1).returning(|_| {
            let mut inspect = conforming_inspect();
            if let Some(config) = inspect.config.as_mut() {
                config.user = Some(String::from("root"));
            }
            Box::pin(async move { Ok(inspect) })
        });

        let error = runtime
            .expect("runtime should start")
            .block_on(EngineConnector::verify_image_async(&engine, &recipe))
            .expect_err("root image should fail verification");

        assert_eq!(
            error.to_string(),
            "image 'passtider:latest' does not match its recipe: user is 'root', expected 'passtider'"
        );
    }
}
