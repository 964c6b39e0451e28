use crate::{stats::aggregate::AggregationResult, utils::time::format_duration};

/// Shareable text version of a breakdown. Children are listed under their parent, with
/// durations only.
pub fn markdown(title: &str, result: &AggregationResult, with_children: bool) -> String {
    let mut text = format!(
        "## {title}\n**Total**: {}\n\n",
        format_duration(result.total_duration)
    );

    for node in &result.nodes {
        text.push_str(&format!(
            "- **[{}]** {} ({:.1}%)\n",
            node.name,
            format_duration(node.duration),
            *node.percentage
        ));
        if with_children {
            for child in &node.children {
                text.push_str(&format!(
                    "    * {}: {}\n",
                    child.name,
                    format_duration(child.duration)
                ));
            }
        }
        text.push('\n');
    }
    text
}
