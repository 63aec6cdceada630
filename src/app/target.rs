//! Builds the sink selected by `--target`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use mirror_core::sink::RepositoryStatus;
use mirror_core::{LocalSink, RepoSink, RepoSinkConfig, Sink};
use tracing::info;

use crate::app::context::RunContext;
use crate::cli::Target;

/// Creates the sink for this run. For the repository target the repository
/// is created on first use; failing to reach it ends the run.
pub(crate) async fn build_sink(ctx: &RunContext) -> Result<Arc<dyn Sink>> {
    match ctx.args.target {
        Target::Local => {
            let root = &ctx.args.output_dir;
            if !root.exists() {
                tokio::fs::create_dir_all(root).await.with_context(|| {
                    format!("Failed to create output directory {}", root.display())
                })?;
                info!(dir = %root.display(), "Created output directory");
            }
            Ok(Arc::new(LocalSink::new(root.clone())))
        }
        Target::Github => {
            let Some(repo) = ctx.args.repo.as_ref() else {
                bail!("--repo OWNER/NAME is required with --target github");
            };
            let Some(token) = ctx.args.token.as_ref().filter(|t| !t.trim().is_empty()) else {
                bail!("An access token is required with --target github (set GITHUB_TOKEN or pass --token)");
            };
            let sink = RepoSink::new(
                RepoSinkConfig {
                    api_base: ctx.args.repo_api_base.clone(),
                    owner: repo.owner.clone(),
                    repo: repo.name.clone(),
                    branch: ctx.args.branch.clone(),
                    token: token.clone(),
                },
                ctx.http_timeouts,
            )?;
            let status = sink
                .ensure_repository()
                .await
                .with_context(|| format!("Failed to prepare repository {repo}"))?;
            match status {
                RepositoryStatus::Created => info!(repo = %repo, "Created repository"),
                RepositoryStatus::Existing => info!(repo = %repo, "Using existing repository"),
            }
            Ok(Arc::new(sink))
        }
    }
}
