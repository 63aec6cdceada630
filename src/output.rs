//! CLI output formatting for the end-of-run summary.

use mirror_core::RunSummary;

/// Failed assets listed individually before the list is cut short.
pub const MAX_LISTED_FAILURES: usize = 20;

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

pub(crate) fn summary_lines(summary: &RunSummary, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let headline = if summary.interrupted {
        "Mirror run interrupted"
    } else {
        "Mirror run complete"
    };
    lines.push(format!("{headline}: {} reciter(s)", summary.reciters.len()));
    if !summary.translations.is_empty() {
        lines.push(format!("  Translations: {}", summary.translations.len()));
    }
    lines.push(format!(
        "  Documents: {} written, {} failed",
        summary.documents.written, summary.documents.failed
    ));
    lines.push(format!(
        "  Audio: {} total, {} downloaded, {} skipped, {} failed",
        summary.assets.total, summary.assets.downloaded, summary.assets.skipped, summary.assets.failed
    ));

    let failed: Vec<_> = summary.failed_assets().collect();
    if !failed.is_empty() {
        lines.push("  Failed audio:".to_string());
        for task in failed.iter().take(MAX_LISTED_FAILURES) {
            lines.push(truncate_to_width(
                &format!("    {} <- {}", task.destination_key, task.source_url),
                width,
            ));
        }
        if failed.len() > MAX_LISTED_FAILURES {
            lines.push(format!(
                "    ... and {} more",
                failed.len() - MAX_LISTED_FAILURES
            ));
        }
    }
    lines
}

/// Prints the run summary to stdout.
pub(crate) fn print_summary(summary: &RunSummary) {
    for line in summary_lines(summary, terminal_width()) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::DownloadTask;
    use mirror_core::pipeline::{ReciterSummary, TranslationSummary};

    #[test]
    fn test_truncate_to_width_appends_ellipsis() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 4), "abc");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_summary_lines_for_clean_run() {
        let summary = RunSummary::default();
        let lines = summary_lines(&summary, 80);
        assert_eq!(lines[0], "Mirror run complete: 0 reciter(s)");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_summary_lines_count_translations() {
        let summary = RunSummary {
            translations: vec![TranslationSummary::default(), TranslationSummary::default()],
            ..RunSummary::default()
        };
        let lines = summary_lines(&summary, 80);
        assert_eq!(lines[1], "  Translations: 2");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_summary_lines_list_failed_assets() {
        let mut reciter = ReciterSummary::default();
        reciter.failed_assets.push(DownloadTask::new(
            "https://cdn.example/a.mp3",
            "audio/1/ayah/1_1.mp3",
        ));
        let summary = RunSummary {
            reciters: vec![reciter],
            interrupted: true,
            ..RunSummary::default()
        };
        let lines = summary_lines(&summary, 80);
        assert!(lines[0].starts_with("Mirror run interrupted"));
        assert!(lines.iter().any(|line| line.contains("audio/1/ayah/1_1.mp3")));
    }
}
