use std::io::{self, Write};
use std::time::Duration;

use super::{BatchSummary, DiffResult, Outcome};
use crate::compare::DiffStats;

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Human-readable report for a single comparison.
pub fn print_stats(out: &mut impl Write, stats: &DiffStats) -> io::Result<()> {
    writeln!(out, "Diff report:")?;
    if stats.exact_same {
        writeln!(out, "\tExact match")?;
    } else {
        writeln!(out, "\tImages differ")?;
    }
    writeln!(out, "\tDifferent Pixels %: {:.2}%", stats.diff_percent())?;
    writeln!(out, "\tDifferent Pixels #: {}", stats.diff_pixels)?;
    Ok(())
}

/// One line per retained batch result.
pub fn print_result_line(out: &mut impl Write, result: &DiffResult) -> io::Result<()> {
    let label = result.label();
    match result.outcome() {
        Outcome::Matched => writeln!(out, "  \x1b[32mPASS\x1b[0m  {label}"),
        Outcome::Differed => writeln!(
            out,
            "  \x1b[31mFAIL\x1b[0m  {label}  ({} pixels, {:.2}%)",
            result.stats.diff_pixels,
            result.stats.diff_percent()
        ),
        Outcome::Errored => writeln!(out, "  \x1b[31m ERR\x1b[0m  {label}  ({})", result.err),
    }
}

pub fn print_summary(
    out: &mut impl Write,
    summary: &BatchSummary,
    elapsed: Duration,
) -> io::Result<()> {
    writeln!(out)?;
    write!(
        out,
        "Diffs:  {} total, \x1b[32m{} matched\x1b[0m, \x1b[31m{} differed\x1b[0m",
        summary.total, summary.matched, summary.differed
    )?;
    if summary.errored > 0 {
        write!(out, ", \x1b[31m{} errored\x1b[0m", summary.errored)?;
    }
    writeln!(out)?;
    writeln!(out, "Time:   {}", format_duration(elapsed))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn stats_report_for_difference() {
        let stats = DiffStats {
            num_pixels: 400,
            diff_pixels: 3,
            exact_same: false,
        };
        let text = render(|b| print_stats(b, &stats));
        assert_eq!(
            text,
            "Diff report:\n\tImages differ\n\tDifferent Pixels %: 0.75%\n\tDifferent Pixels #: 3\n"
        );
    }

    #[test]
    fn stats_report_for_match() {
        let stats = DiffStats {
            num_pixels: 100,
            diff_pixels: 0,
            exact_same: true,
        };
        assert!(render(|b| print_stats(b, &stats)).contains("\tExact match\n"));
    }

    #[test]
    fn error_line_shows_message() {
        let result = DiffResult {
            passthrough: Default::default(),
            image: "a.png".into(),
            stats: DiffStats::default(),
            err: "error reading 'a.png' (not found)".into(),
            compared: Vec::new(),
        };
        let text = render(|b| print_result_line(b, &result));
        assert!(text.contains("ERR"));
        assert!(text.contains("a.png  (error reading 'a.png' (not found))"));
    }

    #[test]
    fn summary_hides_zero_errors() {
        let summary = BatchSummary {
            total: 4,
            matched: 3,
            differed: 1,
            errored: 0,
        };
        let text = render(|b| print_summary(b, &summary, Duration::from_millis(1500)));
        assert!(text.contains("4 total"));
        assert!(!text.contains("errored"));
        assert!(text.contains("Time:   1.5s"));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(2300)), "2.3s");
    }
}
