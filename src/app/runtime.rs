use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use mirror_core::{
    ApiClient, AssetClient, DispatchProgress, Materializer, MirrorPipeline, PipelineOptions,
    RetryPolicy, SegmentResolver,
};
use tracing::{debug, info};
use url::Url;

use crate::app::{config_runtime, context, exit_handler, progress_manager, target, terminal};
use crate::{ProcessExit, app_config, output};

pub(crate) async fn run_mirror() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded = app_config::load_default_file_config()?;
    let args = config_runtime::apply_config_defaults(cli, &cli_sources, loaded.config.as_ref())?;
    let http_timeouts = config_runtime::resolve_http_timeouts(loaded.config.as_ref());

    let default_level = config_runtime::resolve_default_log_level(&args);
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(default_level, no_color);

    debug!("CLI arguments parsed");
    if loaded.config.is_some()
        && let Some(path) = loaded.path.as_ref()
    {
        debug!(path = %path.display(), "Loaded config file");
    }
    info!("Recitation mirror starting");

    let audio_host = Url::parse(&args.audio_host)
        .with_context(|| format!("Invalid audio host URL: {}", args.audio_host))?;
    let ctx = context::RunContext {
        args,
        http_timeouts,
        audio_host,
    };

    let sink = target::build_sink(&ctx).await?;

    let api = ApiClient::with_settings(
        &ctx.args.api_base,
        RetryPolicy::with_max_attempts(u32::from(ctx.args.max_attempts)),
        Duration::from_secs_f64(ctx.args.delay),
        ctx.http_timeouts,
    )?;
    let resolver = SegmentResolver::new(&api, ctx.audio_host.clone());
    let materializer = Arc::new(Materializer::new(
        AssetClient::new(ctx.http_timeouts)?,
        Arc::clone(&sink),
    ));

    let options = PipelineOptions {
        concurrency: usize::from(ctx.args.concurrency),
        filter: ctx.args.files.into(),
        reciter_ids: ctx.args.reciters.clone(),
        translations: ctx.args.translations.clone(),
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let progress = Arc::new(DispatchProgress::new());
    let pipeline = MirrorPipeline::new(resolver, sink, materializer, options)?
        .with_interrupt_flag(Arc::clone(&interrupted))
        .with_progress(Arc::clone(&progress));

    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        ctx.args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) =
        progress_manager::spawn_progress_ui(use_spinner, Arc::clone(&progress));

    let result = pipeline.run().await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = result?;
    if !ctx.args.quiet {
        output::print_summary(&summary);
    }

    Ok(exit_handler::determine_exit_outcome(
        &summary,
        interrupted.load(Ordering::SeqCst),
    ))
}
