//! Greedy placement of peak labels in screen space.
//!
//! Candidates are visited left to right. Each starts just above its anchor
//! and is pushed upward until it clears every label placed before it, for
//! at most [`LayoutConfig::max_shifts`] steps. Pixel `y` grows downward.

use serde::Serialize;

use crate::synth::Peak;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    Linear,
    Log,
}

/// Linear map between an axis range and its pixel span.
///
/// For log axes `range` is given in log10 units, as renderers report it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    pub scale: AxisScale,
    pub range: [f64; 2],
    /// Pixel positions of `range[0]` and `range[1]`.
    pub pixels: [f64; 2],
}

impl AxisMapping {
    pub fn linear(range: [f64; 2], pixels: [f64; 2]) -> Self {
        AxisMapping {
            scale: AxisScale::Linear,
            range,
            pixels,
        }
    }

    pub fn log(range: [f64; 2], pixels: [f64; 2]) -> Self {
        AxisMapping {
            scale: AxisScale::Log,
            range,
            pixels,
        }
    }

    fn is_degenerate(&self) -> bool {
        let [r0, r1] = self.range;
        let [p0, p1] = self.pixels;
        !(r0.is_finite() && r1.is_finite() && p0.is_finite() && p1.is_finite())
            || r0 == r1
            || p0 == p1
    }

    /// Pixel of a data value; `None` for values a log axis cannot show.
    pub fn to_pixel(&self, value: f64) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        let v = match self.scale {
            AxisScale::Linear => value,
            AxisScale::Log if value > 0.0 => value.log10(),
            AxisScale::Log => return None,
        };
        let [r0, r1] = self.range;
        let [p0, p1] = self.pixels;
        let px = p0 + (v - r0) / (r1 - r0) * (p1 - p0);
        px.is_finite().then_some(px)
    }

    pub fn to_data(&self, pixel: f64) -> f64 {
        let [r0, r1] = self.range;
        let v = r0 + self.fraction(pixel) * (r1 - r0);
        match self.scale {
            AxisScale::Linear => v,
            AxisScale::Log => 10f64.powf(v),
        }
    }

    /// Position of `pixel` along the axis: 0 at `range[0]`, 1 at `range[1]`.
    pub fn fraction(&self, pixel: f64) -> f64 {
        let [p0, p1] = self.pixels;
        (pixel - p0) / (p1 - p0)
    }

    fn pixel_min(&self) -> f64 {
        self.pixels[0].min(self.pixels[1])
    }
}

/// Current axes of the plot, as reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisGeometry {
    pub x: AxisMapping,
    pub y: AxisMapping,
}

impl AxisGeometry {
    /// Top edge of the plotting area in pixels.
    pub fn plot_top(&self) -> f64 {
        self.y.pixel_min()
    }

    pub fn is_ready(&self) -> bool {
        !self.x.is_degenerate() && !self.y.is_degenerate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
}

/// Measures rendered label text in pixels.
pub trait LabelMeasure {
    /// `None` while the renderer cannot measure yet (fonts, layout).
    fn measure(&self, text: &str) -> Option<LabelSize>;
}

/// Monospace estimate: fixed advance per character and per line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedCharMetrics {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for FixedCharMetrics {
    fn default() -> Self {
        FixedCharMetrics {
            char_width: 7.0,
            line_height: 14.0,
        }
    }
}

impl LabelMeasure for FixedCharMetrics {
    fn measure(&self, text: &str) -> Option<LabelSize> {
        let lines = text.lines().count().max(1);
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Some(LabelSize {
            width: widest as f64 * self.char_width,
            height: lines as f64 * self.line_height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Vertical gap between anchor and label, and between stacked labels.
    pub gap: f64,
    /// Horizontal distance from the anchor to the label's left edge.
    pub offset_x: f64,
    pub max_shifts: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            gap: 2.0,
            offset_x: 2.0,
            max_shifts: 30,
        }
    }
}

/// Axis-aligned pixel rectangle; `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    /// Strict overlap; touching edges do not count.
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    fn shift_y(&mut self, dy: f64) {
        self.top += dy;
        self.bottom += dy;
    }
}

/// A label waiting to be placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCandidate {
    pub owner: String,
    pub text: String,
    /// Data-space anchor: (kinetic energy, intensity).
    pub anchor: [f64; 2],
    pub size: LabelSize,
}

/// A placed label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    pub owner: String,
    pub text: String,
    pub anchor: [f64; 2],
    pub size: LabelSize,
    /// Data-space x of the left edge.
    pub x: f64,
    /// Bottom edge as a fraction of the y axis (0 at `range[0]`, 1 at `range[1]`).
    pub y: f64,
    pub rect: PixelRect,
    /// False when the shift budget ran out or clamping reintroduced overlap.
    pub settled: bool,
}

/// Place labels without overlap, best effort.
///
/// Output follows input order; candidates whose anchor cannot be mapped to
/// pixels (e.g. non-positive values on a log axis) are left out.
pub fn place(
    candidates: &[LabelCandidate],
    geometry: &AxisGeometry,
    config: &LayoutConfig,
) -> Vec<LabelBox> {
    let mut order: Vec<(usize, f64, f64)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let px = geometry.x.to_pixel(c.anchor[0])?;
            let py = geometry.y.to_pixel(c.anchor[1])?;
            Some((i, px, py))
        })
        .collect();
    // Stable: equal x keeps input order
    order.sort_by(|a, b| a.1.total_cmp(&b.1));

    let plot_top = geometry.plot_top();
    let mut placed: Vec<(usize, PixelRect, bool)> = Vec::with_capacity(order.len());

    for (i, px, py) in order {
        let size = candidates[i].size;
        let left = px + config.offset_x;
        let bottom = py - config.gap;
        let mut rect = PixelRect {
            left,
            top: bottom - size.height,
            right: left + size.width,
            bottom,
        };

        let collides = |r: &PixelRect, placed: &[(usize, PixelRect, bool)]| {
            placed.iter().any(|(_, p, _)| p.overlaps(r))
        };
        let mut settled = true;
        let mut shifts = 0;
        while collides(&rect, &placed) {
            if shifts == config.max_shifts {
                settled = false;
                break;
            }
            rect.shift_y(-(size.height + config.gap));
            shifts += 1;
        }

        if rect.top < plot_top {
            rect.shift_y(plot_top - rect.top);
            if collides(&rect, &placed) {
                settled = false;
            }
        }
        placed.push((i, rect, settled));
    }

    placed.sort_by_key(|&(i, _, _)| i);
    placed
        .into_iter()
        .map(|(i, rect, settled)| {
            let c = &candidates[i];
            LabelBox {
                owner: c.owner.clone(),
                text: c.text.clone(),
                anchor: c.anchor,
                size: c.size,
                x: geometry.x.to_data(rect.left),
                y: geometry.y.fraction(rect.bottom),
                rect,
                settled,
            }
        })
        .collect()
}

/// Text and anchor of one label before measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub element: String,
    pub photon_energy: f64,
    pub text: String,
    pub anchor: [f64; 2],
    pub is_auger: bool,
}

/// One annotation per distinct kinetic energy within each group and kind.
///
/// Photoelectron peaks that coincide share a label listing their shells,
/// followed by the asymmetry parameter of the first of them. The anchor sits
/// on the tallest of the coinciding peaks.
pub fn annotations(peaks: &[Peak]) -> Vec<Annotation> {
    let mut out: Vec<(Annotation, Vec<&str>, f64)> = Vec::new();
    for peak in peaks {
        let existing = out.iter_mut().find(|(a, _, _)| {
            a.element == peak.element
                && a.photon_energy == peak.photon_energy
                && a.is_auger == peak.is_auger()
                && a.anchor[0] == peak.kinetic_energy
        });
        match existing {
            Some((a, shells, _)) => {
                shells.push(&peak.label);
                a.anchor[1] = a.anchor[1].max(peak.intensity);
            }
            None => out.push((
                Annotation {
                    element: peak.element.clone(),
                    photon_energy: peak.photon_energy,
                    text: String::new(),
                    anchor: [peak.kinetic_energy, peak.intensity],
                    is_auger: peak.is_auger(),
                },
                vec![peak.label.as_str()],
                peak.beta,
            )),
        }
    }

    out.into_iter()
        .map(|(mut a, shells, beta)| {
            a.text = if a.is_auger {
                shells.join(", ")
            } else {
                format!("{}\nβ={beta:.2}", shells.join(", "))
            };
            a
        })
        .collect()
}
