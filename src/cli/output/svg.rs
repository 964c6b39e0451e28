use std::borrow::Cow;

use crate::{
    stats::{
        aggregate::AggregationResult,
        palette::{class_hex, contrast_text_color},
        pie::{ArcOptions, ArcPath, ring},
    },
    utils::time::format_duration,
};

const STROKE_WIDTH: f64 = 20.;
const LEGEND_ROW: f64 = 24.;

/// Hex color of a node. Colors are either theme classes or hex values already.
pub fn node_hex(color: Option<&str>) -> Cow<'static, str> {
    match color {
        Some(v) if v.starts_with('#') => Cow::Owned(v.to_owned()),
        Some(v) => Cow::Borrowed(class_hex(v, false)),
        None => Cow::Borrowed(class_hex("", false)),
    }
}

/// Ring segments of every node, in the same order as the nodes.
pub fn node_arcs(result: &AggregationResult, opts: &ArcOptions) -> Vec<Option<ArcPath>> {
    ring(result.nodes.iter().map(|v| *v.percentage), opts)
}

/// Standalone svg document with the ring and a legend below it.
pub fn ring_svg(result: &AggregationResult, opts: &ArcOptions) -> String {
    let size = opts.center * 2.;
    let height = size + LEGEND_ROW * result.nodes.len() as f64;
    let mut lines = vec![format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {height}" width="{size}" height="{height}">"#
    )];

    for (node, arc) in result.nodes.iter().zip(node_arcs(result, opts)) {
        let Some(arc) = arc else {
            continue;
        };
        lines.push(format!(
            r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{STROKE_WIDTH}"><title>{}</title></path>"#,
            arc.d,
            node_hex(node.color.as_deref()),
            escape(&node.name)
        ));
    }
    lines.push(format!(
        r#"  <text x="{c}" y="{c}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        format_duration(result.total_duration),
        c = opts.center
    ));

    for (index, node) in result.nodes.iter().enumerate() {
        let hex = node_hex(node.color.as_deref());
        let y = size + LEGEND_ROW * index as f64;
        lines.push(format!(
            r#"  <rect x="0" y="{y}" width="{size}" height="{}" fill="{hex}"/>"#,
            LEGEND_ROW - 2.
        ));
        lines.push(format!(
            r#"  <text x="6" y="{}" fill="{}">{} {} ({:.1}%)</text>"#,
            y + LEGEND_ROW / 2. + 4.,
            contrast_text_color(&hex),
            escape(&node.name),
            format_duration(node.duration),
            *node.percentage
        ));
    }
    lines.push("</svg>".to_owned());
    lines.join("\n") + "\n"
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::{node_arcs, node_hex, ring_svg};
    use crate::{
        stats::{
            aggregate::{AggregationResult, NodeStat},
            pie::ArcOptions,
        },
        utils::percentage::Percentage,
    };

    fn node(id: &str, color: Option<&str>, minutes: i64, percentage: f64) -> NodeStat {
        NodeStat {
            id: id.into(),
            name: Arc::from(format!("<{id}>")),
            color: color.map(Arc::from),
            duration: Duration::minutes(minutes),
            percentage: Percentage::new_opt(percentage).unwrap(),
            children: vec![],
        }
    }

    fn result() -> AggregationResult {
        AggregationResult {
            total_duration: Duration::minutes(100),
            nodes: vec![
                node("a", Some("text-blue-600"), 75, 75.),
                node("b", Some("#fee2e2"), 25, 25.),
                node("c", None, 0, 0.1),
            ],
        }
    }

    #[test]
    fn colors() {
        assert_eq!(node_hex(Some("text-blue-600")), "#3b82f6");
        assert_eq!(node_hex(Some("#123456")), "#123456");
        assert_eq!(node_hex(None), "#e7e5e4");
    }

    #[test]
    fn arcs_follow_nodes() {
        let arcs = node_arcs(&result(), &ArcOptions::default());
        assert_eq!(arcs.len(), 3);
        assert_eq!(arcs[1].as_ref().map(|v| v.start_angle), Some(270.));
        assert!(arcs[2].is_none());
    }

    #[test]
    fn document() {
        let svg = ring_svg(&result(), &ArcOptions::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<path ").count(), 2);
        assert_eq!(svg.matches("<rect ").count(), 3);
        assert!(svg.contains("&lt;a&gt;"));
        assert!(svg.contains(r##"stroke="#3b82f6""##));
        assert!(svg.contains(">1h40m</text>"));
    }
}
