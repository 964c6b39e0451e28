use serde::{Deserialize, Serialize};

/// Segments narrower than this many degrees aren't drawn.
pub const MIN_SWEEP_DEGREES: f64 = 1.;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArcOptions {
    pub radius: f64,
    pub center: f64,
    /// Carved out of the end of every segment.
    pub gap_angle: f64,
}

impl Default for ArcOptions {
    fn default() -> Self {
        Self {
            radius: 80.,
            center: 100.,
            gap_angle: 2.,
        }
    }
}

impl ArcOptions {
    /// Point on the ring, 0° pointing at 12 o'clock and growing clockwise.
    fn point(&self, degrees: f64) -> (f64, f64) {
        let radians = (degrees - 90.).to_radians();
        (
            self.center + self.radius * radians.cos(),
            self.center + self.radius * radians.sin(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcPath {
    pub d: String,
    pub start_angle: f64,
    /// Where the next segment starts. The gap isn't subtracted here.
    pub end_angle: f64,
}

/// SVG path of a ring segment taking `percentage` of the circle starting at `current_angle`.
pub fn arc(percentage: f64, current_angle: f64, opts: &ArcOptions) -> Option<ArcPath> {
    let sweep = percentage / 100. * 360.;
    if sweep.is_nan() || sweep < MIN_SWEEP_DEGREES {
        return None;
    }

    let start_angle = current_angle;
    let drawn_end = current_angle + sweep - opts.gap_angle;
    let large_arc = if drawn_end - start_angle <= 180. { 0 } else { 1 };

    let (x1, y1) = opts.point(start_angle);
    let (x2, y2) = opts.point(drawn_end);
    let d = format!(
        "M {x1} {y1} A {r} {r} 0 {large_arc} 1 {x2} {y2}",
        r = opts.radius
    );

    Some(ArcPath {
        d,
        start_angle,
        end_angle: current_angle + sweep,
    })
}

/// Folds [arc] over `percentages` starting at 0°. Dropped segments still advance the angle, so
/// the ring always spans the same fraction of the circle as the input does.
pub fn ring(
    percentages: impl IntoIterator<Item = f64>,
    opts: &ArcOptions,
) -> Vec<Option<ArcPath>> {
    let mut angle = 0.;
    percentages
        .into_iter()
        .map(|percentage| {
            let arc = arc(percentage, angle, opts);
            angle += percentage.max(0.) / 100. * 360.;
            arc
        })
        .collect()
}
