// Output Writers
// Writes the moderated CSV, the text report and the offense pie chart

use crate::models::ModerationOutcome;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const CSV_FILE: &str = "moderated_comments.csv";
pub const REPORT_FILE: &str = "moderation_report.txt";
pub const CHART_FILE: &str = "offense_type_pie_chart.png";

const CHART_SIZE: (u32, u32) = (640, 640);
const CHART_TITLE: &str = "Offensive Comment Type Distribution";

/// Marker written to the `is_offensive` column when no classification
/// was obtained for a record.
const UNRESOLVED_MARKER: &str = "unresolved";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write output file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),
}

/// Locations of the files a run produced. `chart` is `None` when the
/// chart was skipped or failed to render.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub report: PathBuf,
    pub chart: Option<PathBuf>,
}

/// Write one CSV row per outcome, preserving input order. Resolved rows
/// carry the classification fields; unresolved rows carry a marker and
/// empty classification columns.
pub fn write_moderated_csv(
    outcomes: &[ModerationOutcome],
    path: &Path,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "comment_id",
        "username",
        "comment_text",
        "is_offensive",
        "offense_type",
        "explanation",
    ])?;

    for outcome in outcomes {
        let record = &outcome.record;
        let (is_offensive, offense_type, explanation) = match &outcome.classification {
            Some(c) => (
                c.is_offensive.to_string(),
                c.offense_type.clone().unwrap_or_default(),
                c.explanation.clone(),
            ),
            None => (UNRESOLVED_MARKER.to_string(), String::new(), String::new()),
        };
        writer.write_record([
            record.comment_id.to_string(),
            record.username.clone(),
            record.comment_text.clone(),
            is_offensive,
            offense_type,
            explanation,
        ])?;
    }

    writer.flush()?;
    info!("[OUTPUT] Moderated CSV saved to {}", path.display());
    Ok(())
}

pub fn write_report(report_text: &str, path: &Path) -> Result<(), OutputError> {
    fs::write(path, report_text)?;
    info!("[OUTPUT] Report saved to {}", path.display());
    Ok(())
}

/// Render the offense-type pie chart. Returns whether the chart was
/// written. An empty tally skips the chart. An unwritable output path
/// is a real output failure; only the rendering itself (e.g. no usable
/// fonts on the host) degrades to a warning.
pub fn write_pie_chart(type_counts: &[(String, usize)], path: &Path) -> Result<bool, OutputError> {
    if type_counts.is_empty() {
        info!("[OUTPUT] No offensive comments, skipping pie chart");
        return Ok(false);
    }

    // Probe writability up front so I/O problems surface as errors
    // instead of vanishing into the render result.
    fs::File::create(path)?;

    match render_pie_chart(type_counts, path) {
        Ok(()) => {
            info!("[OUTPUT] Pie chart saved to {}", path.display());
            Ok(true)
        }
        Err(e) => {
            warn!("[OUTPUT] Failed to render pie chart: {}", e);
            let _ = fs::remove_file(path);
            Ok(false)
        }
    }
}

fn render_pie_chart(
    type_counts: &[(String, usize)],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(CHART_TITLE, ("sans-serif", 28))?;

    let sizes: Vec<f64> = type_counts.iter().map(|(_, count)| *count as f64).collect();
    let labels: Vec<&str> = type_counts.iter().map(|(label, _)| label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..type_counts.len())
        .map(|i| {
            let (r, g, b) = Palette99::COLORS[i % Palette99::COLORS.len()];
            RGBColor(r, g, b)
        })
        .collect();

    let center = (CHART_SIZE.0 as i32 / 2, CHART_SIZE.1 as i32 / 2);
    let radius = 220.0;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(140.0);
    pie.percentages(("sans-serif", 16).into_font());
    pie.label_style(("sans-serif", 18).into_font());
    root.draw(&pie)?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationResult, CommentRecord};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("modbot-output-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn resolved_outcome(id: i64) -> ModerationOutcome {
        ModerationOutcome::resolved(
            CommentRecord {
                comment_id: id,
                username: "ann".to_string(),
                comment_text: "hello, world".to_string(),
            },
            ClassificationResult {
                comment_id: id,
                is_offensive: true,
                offense_type: Some("insult".to_string()),
                explanation: "rude".to_string(),
            },
        )
    }

    fn unresolved_outcome(id: i64) -> ModerationOutcome {
        ModerationOutcome::unresolved(CommentRecord {
            comment_id: id,
            username: "bob".to_string(),
            comment_text: "bye".to_string(),
        })
    }

    #[test]
    fn test_csv_carries_classification_columns() {
        let dir = temp_dir();
        let path = dir.join(CSV_FILE);
        write_moderated_csv(&[resolved_outcome(1), unresolved_outcome(2)], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "comment_id,username,comment_text,is_offensive,offense_type,explanation"
        );
        assert_eq!(lines.next().unwrap(), "1,ann,\"hello, world\",true,insult,rude");
        assert_eq!(lines.next().unwrap(), "2,bob,bye,unresolved,,");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_csv_rows_preserve_input_order() {
        let dir = temp_dir();
        let path = dir.join(CSV_FILE);
        write_moderated_csv(
            &[resolved_outcome(9), resolved_outcome(3), resolved_outcome(5)],
            &path,
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let ids: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, vec!["9", "3", "5"]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_report_file_is_written_verbatim() {
        let dir = temp_dir();
        let path = dir.join(REPORT_FILE);
        write_report("=== Moderation Report ===\n", &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "=== Moderation Report ===\n"
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_empty_tally_skips_chart() {
        let dir = temp_dir();
        let path = dir.join(CHART_FILE);
        assert!(!write_pie_chart(&[], &path).unwrap());
        assert!(!path.exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unwritable_chart_path_is_io_error() {
        let dir = temp_dir();
        let path = dir.join("missing-subdir").join(CHART_FILE);
        let tally = vec![("insult".to_string(), 2)];
        let err = write_pie_chart(&tally, &path).unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_unwritable_csv_path_errors() {
        let dir = temp_dir();
        let path = dir.join("missing-subdir").join(CSV_FILE);
        let err = write_moderated_csv(&[resolved_outcome(1)], &path).unwrap_err();
        assert!(matches!(err, OutputError::Csv(_)));
        let _ = fs::remove_dir_all(dir);
    }
}
