use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use mirror_core::HttpTimeouts;

use crate::app_config::FileConfig;
use crate::cli::{Args, FilesArg, MAX_DELAY_SECS};

/// Which options were given explicitly on the command line (and so beat the config file).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) concurrency: bool,
    pub(crate) delay: bool,
    pub(crate) max_attempts: bool,
    pub(crate) files: bool,
    pub(crate) translations: bool,
    pub(crate) target: bool,
    pub(crate) repo: bool,
    pub(crate) branch: bool,
    pub(crate) api_base: bool,
    pub(crate) audio_host: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, sources_from(&matches))
}

fn sources_from(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        concurrency: is_commandline_value(matches, "concurrency"),
        delay: is_commandline_value(matches, "delay"),
        max_attempts: is_commandline_value(matches, "max_attempts"),
        files: is_commandline_value(matches, "files"),
        translations: is_commandline_value(matches, "translations"),
        target: is_commandline_value(matches, "target"),
        repo: is_commandline_value(matches, "repo"),
        branch: is_commandline_value(matches, "branch"),
        api_base: is_commandline_value(matches, "api_base"),
        audio_host: is_commandline_value(matches, "audio_host"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills options not given on the command line from the config file, then
/// re-checks the effective values.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.output_dir
            && let Some(output_dir) = &file_config.output_dir
        {
            args.output_dir.clone_from(output_dir);
        }

        if !cli_sources.concurrency
            && let Some(concurrency) = file_config.concurrency
        {
            args.concurrency = concurrency;
        }

        if !cli_sources.delay
            && let Some(delay) = file_config.delay_secs
        {
            args.delay = delay;
        }

        if !cli_sources.max_attempts
            && let Some(max_attempts) = file_config.max_attempts
        {
            args.max_attempts = max_attempts;
        }

        if !cli_sources.files
            && let Some(files) = file_config.files
        {
            args.files = files_arg_for(files);
        }

        if !cli_sources.translations
            && let Some(translations) = &file_config.translations
        {
            args.translations = translations.clone();
        }

        if !cli_sources.target
            && let Some(target) = file_config.target
        {
            args.target = target;
        }

        if !cli_sources.repo
            && args.repo.is_none()
            && let Some(repo) = &file_config.repo
        {
            args.repo = Some(repo.clone());
        }

        if !cli_sources.branch
            && let Some(branch) = &file_config.branch
        {
            args.branch.clone_from(branch);
        }

        if !cli_sources.api_base
            && let Some(api_base) = &file_config.api_base
        {
            args.api_base.clone_from(api_base);
        }

        if !cli_sources.audio_host
            && let Some(audio_host) = &file_config.audio_host
        {
            args.audio_host.clone_from(audio_host);
        }
    }

    if !(1..=100).contains(&args.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=100",
            args.concurrency
        );
    }
    if !(0.0..=MAX_DELAY_SECS).contains(&args.delay) {
        bail!(
            "Invalid effective delay value: {}. Expected range: 0..=60",
            args.delay
        );
    }

    Ok(args)
}

fn files_arg_for(filter: mirror_core::ContentFilter) -> FilesArg {
    match filter {
        mirror_core::ContentFilter::MetadataOnly => FilesArg::Json,
        mirror_core::ContentFilter::BinaryOnly => FilesArg::Mp3,
        mirror_core::ContentFilter::Both => FilesArg::Both,
    }
}

pub(crate) fn resolve_http_timeouts(file_config: Option<&FileConfig>) -> HttpTimeouts {
    let mut timeouts = HttpTimeouts::default();
    let Some(file_config) = file_config else {
        return timeouts;
    };
    if let Some(value) = file_config.connect_timeout_secs {
        timeouts.connect_secs = value;
    }
    if let Some(value) = file_config.read_timeout_secs {
        timeouts.read_secs = value;
    }
    timeouts
}

/// Log level used when `RUST_LOG` is unset.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::cli::Target;

    fn parse(argv: &[&str]) -> (Args, CliValueSources) {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, sources_from(&matches))
    }

    fn file_config() -> FileConfig {
        FileConfig {
            output_dir: Some(PathBuf::from("/srv/mirror")),
            concurrency: Some(20),
            delay_secs: Some(2.0),
            files: Some(mirror_core::ContentFilter::MetadataOnly),
            translations: Some(mirror_core::TranslationSelection::All),
            target: Some(Target::Github),
            branch: Some("pages".to_string()),
            ..FileConfig::default()
        }
    }

    #[test]
    fn test_config_fills_unset_options() {
        let (args, sources) = parse(&["recitation-mirror"]);
        let args = apply_config_defaults(args, &sources, Some(&file_config())).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("/srv/mirror"));
        assert_eq!(args.concurrency, 20);
        assert!((args.delay - 2.0).abs() < f64::EPSILON);
        assert_eq!(args.files, FilesArg::Json);
        assert_eq!(args.translations, mirror_core::TranslationSelection::All);
        assert_eq!(args.target, Target::Github);
        assert_eq!(args.branch, "pages");
    }

    #[test]
    fn test_command_line_beats_config() {
        let (args, sources) = parse(&[
            "recitation-mirror",
            "-c",
            "3",
            "-o",
            "here",
            "--files",
            "both",
            "--translations",
            "none",
        ]);
        let args = apply_config_defaults(args, &sources, Some(&file_config())).unwrap();
        assert_eq!(args.concurrency, 3);
        assert_eq!(args.translations, mirror_core::TranslationSelection::None);
        assert_eq!(args.output_dir, PathBuf::from("here"));
        assert_eq!(args.files, FilesArg::Both);
        assert!((args.delay - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_config_keeps_cli_defaults() {
        let (args, sources) = parse(&["recitation-mirror"]);
        let args = apply_config_defaults(args, &sources, None).unwrap();
        assert_eq!(args.concurrency, 5);
        assert_eq!(args.target, Target::Local);
    }

    #[test]
    fn test_timeouts_from_config() {
        let cfg = FileConfig {
            connect_timeout_secs: Some(5),
            ..FileConfig::default()
        };
        let timeouts = resolve_http_timeouts(Some(&cfg));
        assert_eq!(timeouts.connect_secs, 5);
        assert_eq!(timeouts.read_secs, 300);
    }

    #[test]
    fn test_log_level_priority() {
        let (args, _) = parse(&["recitation-mirror", "-q", "-vv"]);
        assert_eq!(resolve_default_log_level(&args), "error");
        let (args, _) = parse(&["recitation-mirror", "-v"]);
        assert_eq!(resolve_default_log_level(&args), "debug");
        let (args, _) = parse(&["recitation-mirror"]);
        assert_eq!(resolve_default_log_level(&args), "info");
    }
}
