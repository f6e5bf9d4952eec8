use std::ops::Range;

use colored::Colorize;
use log::{debug, log_enabled};

use crate::context::Outcome;

/// Log outcome of matching a production that started at `at`
pub(crate) fn log_result(target: &str, at: usize, source: &str, outcome: &Outcome) {
    if log_enabled!(log::Level::Debug) {
        let Some((_, node)) = outcome else {
            debug!(
                target: target,
                "{}", "ERR".red().bold()
            );
            return;
        };

        let range = node.range().unwrap_or(at..at);
        log_with_highlight(target, at, source, range);
    }
}

/// Log matched `range` on its source line, with skipped whitespace after `at` dimmed
pub(crate) fn log_with_highlight(target: &str, at: usize, source: &str, range: Range<usize>) {
    if log_enabled!(log::Level::Debug) {
        let Range { start, end } = range;

        let line_start = source[..at].rfind('\n').map_or(0, |i| i + 1);
        let line_end = end + source[end..].find('\n').unwrap_or(source[end..].len());

        let trivia = source[at..start]
            .split('\n')
            .map(|p| p.on_bright_black().to_string())
            .collect::<Vec<_>>()
            .join(format!("{}\n", r"\n".bright_black()).as_str());
        let parsed = source[start..end]
            .split('\n')
            .map(|p| p.on_bright_green().to_string())
            .collect::<Vec<_>>()
            .join(format!("{}\n", r"\n".bright_green()).as_str());

        debug!(
            target: target,
            "{} {}\n{}{}{}{}",
            "OK".green().bold(),
            if range.is_empty() {
                format!("(empty @'{}')", "|".dimmed())
            } else {
                "".to_string()
            },
            &source[line_start..at],
            trivia,
            if range.is_empty() {
                "|".dimmed().italic()
            } else {
                parsed.underline()
            },
            &source[end..line_end]
        );
    }
}
