//! Snapshot assembly and text exposition.
//!
//! Families are rendered directly into the Prometheus text format in the
//! order given. A registry-backed encoder is deliberately not used here:
//! registries re-sort families by name on gather, and the exposition must
//! keep the scrape's key insertion order stable across versions.

use crate::collectors::catalog;
use crate::collectors::context::DataPoint;
use tracing::error;

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// One metric family ready for exposition: resolved name, help, and the
/// scrape's data points in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub name: String,
    pub help: String,
    pub points: Vec<DataPoint>,
}

impl MetricSnapshot {
    #[must_use]
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            points,
        }
    }

    /// Info semantics: a gauge of value 1 whose single label carries
    /// metadata.
    #[must_use]
    pub fn info(name: &str, help: &str, label: &str, value: &str) -> Self {
        Self::gauge(
            name,
            help,
            vec![DataPoint {
                labels: vec![(label.to_string(), value.to_string())],
                value: 1.0,
            }],
        )
    }
}

/// One scrape's worth of families. Info families go last in the response,
/// after any custom-query families.
#[derive(Debug, Default)]
pub struct Snapshots {
    pub gauges: Vec<MetricSnapshot>,
    pub infos: Vec<MetricSnapshot>,
}

impl Snapshots {
    /// Final family order: built-in gauges, custom-query families, info.
    #[must_use]
    pub fn into_families(self, custom: Vec<MetricSnapshot>) -> Vec<MetricSnapshot> {
        let mut families = self.gauges;
        families.extend(custom);
        families.extend(self.infos);
        families
    }
}

/// Resolve accumulated points into families through the catalog, keeping key
/// insertion order. Keys missing from the catalog indicate a task/catalog
/// mismatch; the startup self-test makes that unreachable, so here they are
/// logged and skipped instead of tearing down the scrape.
#[must_use]
pub fn families_from_points(points: Vec<(&'static str, Vec<DataPoint>)>) -> Vec<MetricSnapshot> {
    let mut families = Vec::with_capacity(points.len());
    for (key, data) in points {
        if catalog::def(key).is_none() {
            error!(key, "data point for a key not in the metric catalog");
            continue;
        }
        families.push(MetricSnapshot::gauge(
            catalog::name(key),
            catalog::help(key),
            data,
        ));
    }
    families
}

/// Render families into the text exposition format. Every family is typed
/// gauge; info series are gauges of value 1 by construction.
#[must_use]
pub fn write_exposition(families: &[MetricSnapshot]) -> String {
    let mut out = String::new();
    for family in families {
        if family.points.is_empty() {
            continue;
        }
        if !family.help.is_empty() {
            out.push_str("# HELP ");
            out.push_str(&family.name);
            out.push(' ');
            out.push_str(&escape_help(&family.help));
            out.push('\n');
        }
        out.push_str("# TYPE ");
        out.push_str(&family.name);
        out.push_str(" gauge\n");
        for point in &family.points {
            out.push_str(&family.name);
            if !point.labels.is_empty() {
                out.push('{');
                for (i, (label, value)) in point.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(label);
                    out.push_str("=\"");
                    out.push_str(&escape_label_value(value));
                    out.push('"');
                }
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(point.value));
            out.push('\n');
        }
    }
    out
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collectors::context::labels;

    fn point(pairs: &[(&str, &str)], value: f64) -> DataPoint {
        DataPoint {
            labels: labels(pairs),
            value,
        }
    }

    #[test]
    fn unlabelled_gauge_renders_name_help_type_and_value() {
        let family = MetricSnapshot::gauge(
            "altibase_instance_working_time_seconds",
            "Instance working time (V$INSTANCE).",
            vec![point(&[], 42.0)],
        );
        let text = write_exposition(&[family]);
        assert!(text.contains(
            "# HELP altibase_instance_working_time_seconds Instance working time (V$INSTANCE).\n"
        ));
        assert!(text.contains("# TYPE altibase_instance_working_time_seconds gauge\n"));
        assert!(text.contains("altibase_instance_working_time_seconds 42\n"));
    }

    #[test]
    fn labelled_points_render_in_row_order() {
        let family = MetricSnapshot::gauge(
            "altibase_sessions",
            "Session count; label status: total, active.",
            vec![
                point(&[("status", "total")], 7.0),
                point(&[("status", "active")], 3.0),
            ],
        );
        let text = write_exposition(&[family]);
        let total = text.find(r#"altibase_sessions{status="total"} 7"#).unwrap();
        let active = text.find(r#"altibase_sessions{status="active"} 3"#).unwrap();
        assert!(total < active);
    }

    #[test]
    fn label_values_are_escaped() {
        let family = MetricSnapshot::gauge(
            "altibase_long_run_query_detail",
            "h",
            vec![point(&[("query", "SELECT \"A\\B\"\nFROM T")], 1.0)],
        );
        let text = write_exposition(&[family]);
        assert!(text.contains(r#"query="SELECT \"A\\B\"\nFROM T""#));
    }

    #[test]
    fn family_order_is_the_slice_order() {
        let a = MetricSnapshot::gauge("altibase_zz", "h", vec![point(&[], 1.0)]);
        let b = MetricSnapshot::gauge("altibase_aa", "h", vec![point(&[], 2.0)]);
        let text = write_exposition(&[a, b]);
        assert!(text.find("altibase_zz").unwrap() < text.find("altibase_aa").unwrap());
    }

    #[test]
    fn info_family_is_a_gauge_of_one() {
        let family = MetricSnapshot::info(
            "altibase_version",
            "Altibase server version (Info).",
            "version",
            "7.3.0.0.2",
        );
        let text = write_exposition(&[family]);
        assert!(text.contains(r#"altibase_version{version="7.3.0.0.2"} 1"#));
    }

    #[test]
    fn empty_families_are_not_rendered() {
        let family = MetricSnapshot::gauge("altibase_custom_q1", "h", vec![]);
        let text = write_exposition(&[family]);
        assert!(text.is_empty());
    }

    #[test]
    fn label_order_within_a_sample_is_preserved() {
        let family = MetricSnapshot::gauge(
            "altibase_replication_peer",
            "h",
            vec![point(
                &[
                    ("replication", "r1"),
                    ("role", "sender"),
                    ("peer", "10.0.0.1:5678"),
                ],
                1.0,
            )],
        );
        let text = write_exposition(&[family]);
        assert!(text.contains(
            r#"altibase_replication_peer{replication="r1",role="sender",peer="10.0.0.1:5678"} 1"#
        ));
    }

    #[test]
    fn fractional_and_infinite_values_render() {
        let family = MetricSnapshot::gauge(
            "altibase_buffer_pool_hit_ratio",
            "h",
            vec![point(&[], 0.95)],
        );
        let text = write_exposition(&[family]);
        assert!(text.contains("altibase_buffer_pool_hit_ratio 0.95\n"));
        assert_eq!(format_value(f64::INFINITY), "+Inf");
    }

    #[test]
    fn into_families_puts_custom_between_gauges_and_info() {
        let snapshots = Snapshots {
            gauges: vec![MetricSnapshot::gauge("altibase_sessions", "h", vec![point(&[], 1.0)])],
            infos: vec![MetricSnapshot::info("altibase_version", "h", "version", "x")],
        };
        let custom = vec![MetricSnapshot::gauge("altibase_custom_q1", "h", vec![point(&[], 5.0)])];
        let names: Vec<_> = snapshots
            .into_families(custom)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec!["altibase_sessions", "altibase_custom_q1", "altibase_version"]
        );
    }

    #[test]
    fn unknown_keys_are_skipped_during_resolution() {
        let points = vec![
            ("sessions", vec![point(&[], 1.0)]),
            ("not_in_catalog", vec![point(&[], 2.0)]),
        ];
        let families = families_from_points(points);
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name, "altibase_sessions");
    }
}
