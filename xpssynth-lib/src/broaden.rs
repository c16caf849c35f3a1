//! Gaussian broadening of discrete peaks into continuous curves.
//!
//! Each peak gets a width proportional to its own kinetic energy plus a
//! fixed term. Curves are grouped by (element, photon energy); within a group
//! the photoelectron and Auger contributions are kept apart so the total can
//! honour per-series visibility without re-synthesizing anything.

use serde::Serialize;

use crate::constants::FWHM_PER_SIGMA;
use crate::selection::BroadeningWidth;
use crate::synth::Peak;

/// Contributions further than this many σ from a peak are dropped.
const CUTOFF_SIGMAS: f64 = 8.0;

/// Identity of a peak group: one element under one photon energy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupKey {
    pub element: String,
    pub photon_energy: f64,
}

impl GroupKey {
    pub fn of(peak: &Peak) -> Self {
        GroupKey {
            element: peak.element.clone(),
            photon_energy: peak.photon_energy,
        }
    }

    fn matches(&self, peak: &Peak) -> bool {
        self.element == peak.element && self.photon_energy == peak.photon_energy
    }
}

/// The two kinds of discrete series a group is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Photoelectron,
    Auger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Provenance {
    Group(GroupKey),
    Total,
}

/// A sampled curve on an [`EnergyGrid`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadenedCurve {
    pub provenance: Provenance,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl BroadenedCurve {
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.x.iter().zip(&self.y).map(|(&x, &y)| [x, y]).collect()
    }
}

/// Limits for [`EnergyGrid::adaptive`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub min_step: f64,
    pub max_step: f64,
    pub max_points: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            min_step: 0.005,
            max_step: 5.0,
            max_points: 200_000,
        }
    }
}

/// Sorted, strictly increasing evaluation points in eV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyGrid {
    points: Vec<f64>,
}

impl EnergyGrid {
    /// Evenly spaced points from `emin` to `emax`, both included.
    pub fn uniform(emin: f64, emax: f64, step: f64) -> Self {
        if !valid_bounds(emin, emax) || step.is_nan() || step <= 0.0 {
            return EnergyGrid::default();
        }
        let n = ((emax - emin) / step).ceil() as usize;
        let mut points: Vec<f64> = (0..n).map(|i| emin + i as f64 * step).collect();
        points.push(emax);
        points.dedup();
        EnergyGrid { points }
    }

    /// Points whose spacing follows the local σ of `width`: a third of σ at
    /// each position, clamped to the configured step range. Low kinetic
    /// energies, where peaks are narrow, get the finest sampling.
    ///
    /// Every entry of `centers` inside the bounds is added exactly, so a
    /// curve can always be read at a peak position.
    pub fn adaptive(
        emin: f64,
        emax: f64,
        width: BroadeningWidth,
        config: GridConfig,
        centers: &[f64],
    ) -> Self {
        if !valid_bounds(emin, emax) {
            return EnergyGrid::default();
        }
        let span = emax - emin;
        let min_step = config
            .min_step
            .max(span / config.max_points.max(1) as f64)
            .max(f64::EPSILON * emax.abs());
        let max_step = config.max_step.max(min_step);

        let mut points = Vec::new();
        let mut x = emin;
        while x < emax {
            points.push(x);
            let sigma = width.fwhm_at(x.max(0.0)) / FWHM_PER_SIGMA;
            let step = (sigma / 3.0).clamp(min_step, max_step);
            x += if step.is_finite() { step } else { max_step };
        }
        points.push(emax);

        points.extend(centers.iter().copied().filter(|&c| c > emin && c < emax));
        points.sort_by(f64::total_cmp);
        points.dedup();
        EnergyGrid { points }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn valid_bounds(emin: f64, emax: f64) -> bool {
    emin.is_finite() && emax.is_finite() && emin < emax
}

/// Standard deviation (eV) of the kernel for a peak at `kinetic_energy`.
pub fn sigma_at(width: BroadeningWidth, kinetic_energy: f64) -> f64 {
    width.fwhm_at(kinetic_energy) / FWHM_PER_SIGMA
}

/// Add one Gaussian of height `amplitude` centred on `center` onto `out`.
///
/// A zero width degenerates to a spike on the grid point equal to `center`.
fn accumulate(grid: &[f64], out: &mut [f64], center: f64, amplitude: f64, sigma: f64) {
    if !sigma.is_finite() || sigma <= 0.0 {
        if let Ok(j) = grid.binary_search_by(|x| x.total_cmp(&center)) {
            out[j] += amplitude;
        }
        return;
    }
    let lo = grid.partition_point(|&x| x < center - CUTOFF_SIGMAS * sigma);
    let hi = grid.partition_point(|&x| x <= center + CUTOFF_SIGMAS * sigma);
    for j in lo..hi {
        let z = (grid[j] - center) / sigma;
        out[j] += amplitude * (-0.5 * z * z).exp();
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GroupCurves {
    key: GroupKey,
    photoelectron: Vec<f64>,
    auger: Vec<f64>,
}

impl GroupCurves {
    fn value(&self, j: usize) -> f64 {
        self.photoelectron[j] + self.auger[j]
    }
}

/// Per-group broadened curves on a shared grid, kept so the total can be
/// re-summed whenever visibility changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadeningCache {
    grid: EnergyGrid,
    groups: Vec<GroupCurves>,
}

impl BroadeningCache {
    /// Broaden `peaks` on `grid`. Groups appear in first-seen peak order.
    pub fn build(peaks: &[Peak], width: BroadeningWidth, grid: EnergyGrid) -> Self {
        let n = grid.len();
        let mut groups: Vec<GroupCurves> = Vec::new();

        for peak in peaks {
            let idx = match groups.iter().position(|g| g.key.matches(peak)) {
                Some(i) => i,
                None => {
                    groups.push(GroupCurves {
                        key: GroupKey::of(peak),
                        photoelectron: vec![0.0; n],
                        auger: vec![0.0; n],
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            let out = if peak.is_auger() {
                &mut group.auger
            } else {
                &mut group.photoelectron
            };
            let sigma = sigma_at(width, peak.kinetic_energy);
            accumulate(
                grid.points(),
                out,
                peak.kinetic_energy,
                peak.intensity,
                sigma,
            );
        }

        BroadeningCache { grid, groups }
    }

    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    pub fn group_keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    /// One curve per group, photoelectron and Auger parts combined.
    pub fn group_curves(&self) -> Vec<BroadenedCurve> {
        self.groups
            .iter()
            .map(|g| BroadenedCurve {
                provenance: Provenance::Group(g.key.clone()),
                x: self.grid.points.clone(),
                y: (0..self.grid.len()).map(|j| g.value(j)).collect(),
            })
            .collect()
    }

    /// Pointwise sum of the parts for which `visible` returns true.
    pub fn total<F>(&self, visible: F) -> BroadenedCurve
    where
        F: Fn(&GroupKey, Component) -> bool,
    {
        let mut y = vec![0.0; self.grid.len()];
        for g in &self.groups {
            let pe = visible(&g.key, Component::Photoelectron);
            let au = visible(&g.key, Component::Auger);
            for (j, v) in y.iter_mut().enumerate() {
                *v += match (pe, au) {
                    (true, true) => g.value(j),
                    (true, false) => g.photoelectron[j],
                    (false, true) => g.auger[j],
                    (false, false) => 0.0,
                };
            }
        }
        BroadenedCurve {
            provenance: Provenance::Total,
            x: self.grid.points.clone(),
            y,
        }
    }
}

/// Per-group curves plus their total.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadened {
    pub per_group: Vec<BroadenedCurve>,
    pub total: BroadenedCurve,
}

/// Broaden `peaks` and sum every group into the total.
pub fn broaden(peaks: &[Peak], width: BroadeningWidth, grid: EnergyGrid) -> Broadened {
    let cache = BroadeningCache::build(peaks, width, grid);
    Broadened {
        per_group: cache.group_curves(),
        total: cache.total(|_, _| true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::PeakKind;

    fn peak(element: &str, photon_energy: f64, kinetic_energy: f64, intensity: f64) -> Peak {
        Peak {
            element: element.to_string(),
            photon_energy,
            label: "1s".to_string(),
            kinetic_energy,
            intensity,
            binding_energy: photon_energy - kinetic_energy,
            beta: 1.5,
            kind: PeakKind::Photoelectron,
        }
    }

    #[test]
    fn test_uniform_grid_hits_bounds() {
        let g = EnergyGrid::uniform(0.0, 10.0, 3.0);
        assert_eq!(g.points(), [0.0, 3.0, 6.0, 9.0, 10.0]);
        assert!(EnergyGrid::uniform(5.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_adaptive_grid_resolves_local_sigma() {
        let width = BroadeningWidth::new(1.0, 0.0).unwrap();
        let g = EnergyGrid::adaptive(0.0, 1500.0, width, GridConfig::default(), &[616.4]);
        let pts = g.points();
        assert_eq!(pts[0], 0.0);
        assert_eq!(*pts.last().unwrap(), 1500.0);
        assert!(pts.contains(&616.4));
        assert!(pts.windows(2).all(|w| w[1] > w[0]));

        // Around the peak the spacing stays under σ/3
        let sigma = sigma_at(width, 616.4);
        let i = pts.iter().position(|&x| x == 616.4).unwrap();
        assert!(pts[i + 1] - pts[i] <= sigma / 3.0 + 1e-9);
        assert!(pts[i] - pts[i - 1] <= sigma / 3.0 + 1e-9);

        // Finer at low energy than at high energy
        assert!(pts[1001] - pts[1000] < pts[pts.len() - 2] - pts[pts.len() - 3]);
    }

    #[test]
    fn test_adaptive_grid_respects_point_cap() {
        let width = BroadeningWidth::new(0.0, 0.0).unwrap();
        let config = GridConfig {
            max_points: 1000,
            ..GridConfig::default()
        };
        let g = EnergyGrid::adaptive(0.0, 1000.0, width, config, &[]);
        assert!(g.len() <= 1002);
    }

    #[test]
    fn test_curve_peaks_at_amplitude() {
        let width = BroadeningWidth::new(1.0, 0.0).unwrap();
        let p = peak("neon", 1486.6, 616.4, 0.05);
        let grid = EnergyGrid::adaptive(0.0, 1486.6, width, GridConfig::default(), &[616.4]);
        let b = broaden(std::slice::from_ref(&p), width, grid);
        let j = b.total.x.iter().position(|&x| x == 616.4).unwrap();
        assert!((b.total.y[j] - 0.05).abs() < 1e-15);
        assert_eq!(b.per_group.len(), 1);
        assert_eq!(b.per_group[0].y, b.total.y);
    }

    #[test]
    fn test_zero_width_is_a_spike() {
        let width = BroadeningWidth::new(0.0, 0.0).unwrap();
        let p = peak("neon", 100.0, 50.0, 2.0);
        let b = broaden(&[p], width, EnergyGrid::uniform(0.0, 100.0, 1.0));
        assert_eq!(b.total.y.iter().sum::<f64>(), 2.0);
        assert_eq!(b.total.y[50], 2.0);
    }

    #[test]
    fn test_total_respects_visibility() {
        let width = BroadeningWidth::new(0.0, 1.0).unwrap();
        let peaks = [
            peak("neon", 1486.6, 100.0, 1.0),
            peak("argon", 1486.6, 300.0, 2.0),
        ];
        let cache = BroadeningCache::build(&peaks, width, EnergyGrid::uniform(0.0, 400.0, 0.1));
        let all = cache.total(|_, _| true);
        let neon_only = cache.total(|k, _| k.element == "neon");
        let groups = cache.group_curves();
        for j in 0..all.x.len() {
            assert_eq!(all.y[j], groups[0].y[j] + groups[1].y[j]);
            assert_eq!(neon_only.y[j], groups[0].y[j]);
        }
    }
}
