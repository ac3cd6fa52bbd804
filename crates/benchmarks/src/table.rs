//! CSV rendering of run summaries.

use crate::result::RunSummary;
use std::borrow::Cow;

/// Quote a header field that contains a delimiter, a quote or a line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render summaries as CSV: a header line and one line per run, no index
/// column. Values use the shortest round-trip decimal form.
pub fn render_csv(summaries: &[RunSummary], baseline_label: &str, candidate_label: &str) -> String {
    let header: Vec<String> = RunSummary::columns(baseline_label, candidate_label)
        .iter()
        .map(|column| csv_field(column).into_owned())
        .collect();
    let mut output = header.join(",");
    output.push('\n');
    for summary in summaries {
        let row: Vec<String> = summary.row().iter().map(f64::to_string).collect();
        output.push_str(&row.join(","));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TargetSummary;

    #[test]
    fn test_render_csv() {
        let baseline = TargetSummary {
            http_rate: 40.0,
            http_duration_mean: 12.5,
            http_duration_median: 10.0,
            http_duration_p95: 31.25,
            cpu_energy: 17.0,
        };
        let candidate = TargetSummary {
            cpu_energy: 15.5,
            ..baseline
        };
        let csv = render_csv(
            &[RunSummary {
                run: 1,
                baseline,
                candidate,
            }],
            "baseline",
            "graphcl",
        );
        assert_eq!(
            csv,
            "baseline_http_rate,baseline_http_duration_mean,baseline_http_duration_median,\
baseline_http_duration_p95,baseline_cpu_energy,graphcl_http_rate,graphcl_http_duration_mean,\
graphcl_http_duration_median,graphcl_http_duration_p95,graphcl_cpu_energy\n\
40,12.5,10,31.25,17,40,12.5,10,31.25,15.5\n"
        );
    }

    #[test]
    fn test_header_labels_are_quoted() {
        let csv = render_csv(&[], "a,b", "say \"hi\"");
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("\"a,b_http_rate\",\"a,b_http_duration_mean\","));
        assert!(header.ends_with(",\"say \"\"hi\"\"_cpu_energy\""));
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn test_header_only_without_runs() {
        let csv = render_csv(&[], "a", "b");
        assert_eq!(csv.lines().count(), 1);
    }
}
