//! The recomputation pipeline: selection → peaks → curves → labels.
//!
//! [`SpectrumEngine`] owns every cache and replaces them wholesale. A
//! mutation re-runs synthesis and broadening synchronously and places labels
//! right away when the renderer geometry is known; otherwise layout stays
//! pending until [`SpectrumEngine::poll`] finds the renderer ready.

use std::time::Duration;

use serde::Serialize;

use crate::broaden::{
    BroadenedCurve, BroadeningCache, Component, EnergyGrid, GridConfig, GroupKey, Provenance,
};
use crate::db::XpsDb;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::layout::{
    AxisGeometry, LabelBox, LabelCandidate, LabelMeasure, LayoutConfig, annotations, place,
};
use crate::selection::{Mutation, SelectionState};
use crate::series::{Series, SeriesId, SeriesKind, Visibility};
use crate::synth::Peak;

/// Messages the renderer sends back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// A legend entry was toggled.
    VisibilityChanged { id: SeriesId, visible: bool },
    /// Axes were resized, zoomed or panned.
    AxesChanged(AxisGeometry),
    /// The plot was torn down or is not laid out yet.
    GeometryUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    /// Nothing to do.
    Idle,
    /// Labels were just placed.
    Placed,
    /// Inside a debounce window; poll again later.
    Waiting,
    /// Geometry or text metrics unavailable; poll again later.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub layout: LayoutConfig,
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            grid: GridConfig::default(),
            layout: LayoutConfig::default(),
            debounce: Duration::from_millis(50),
        }
    }
}

/// Everything a renderer needs for one draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub series: Vec<Series>,
    pub labels: Vec<LabelBox>,
}

/// Consumer of rendered frames.
pub trait RenderSink {
    fn draw(&mut self, frame: &Frame);
}

pub struct SpectrumEngine<M> {
    db: XpsDb,
    selection: SelectionState,
    measure: M,
    config: EngineConfig,
    peaks: Vec<Peak>,
    broadening: Option<BroadeningCache>,
    total: Option<BroadenedCurve>,
    visibility: Visibility,
    geometry: Option<AxisGeometry>,
    labels: Vec<LabelBox>,
    layout_pending: bool,
    debouncer: Debouncer,
}

impl<M: LabelMeasure> SpectrumEngine<M> {
    pub fn new(db: XpsDb, selection: SelectionState, measure: M) -> Self {
        Self::with_config(db, selection, measure, EngineConfig::default())
    }

    pub fn with_config(
        db: XpsDb,
        mut selection: SelectionState,
        measure: M,
        config: EngineConfig,
    ) -> Self {
        selection.canonicalize(&db);
        let mut engine = SpectrumEngine {
            db,
            selection,
            measure,
            config,
            peaks: Vec::new(),
            broadening: None,
            total: None,
            visibility: Visibility::default(),
            geometry: None,
            labels: Vec::new(),
            layout_pending: false,
            debouncer: Debouncer::new(config.debounce),
        };
        engine.recompute();
        engine
    }

    /// Validate and apply a user action, then recompute.
    ///
    /// Element identifiers are stored as the database key, so `"Ne"`,
    /// `"ne"` and `"neon"` name the same selection entry. Rejected input
    /// leaves the selection and every cache untouched.
    pub fn apply(&mut self, mutation: Mutation) -> Result<LayoutStatus> {
        let mutation = self.canonical(mutation);
        self.selection.apply(mutation)?;
        Ok(self.recompute())
    }

    /// Swap in a whole selection, e.g. one restored from storage. Legend
    /// toggles from the previous selection are dropped.
    pub fn replace_selection(&mut self, mut selection: SelectionState) -> LayoutStatus {
        selection.canonicalize(&self.db);
        self.selection = selection;
        self.visibility.reset();
        self.recompute()
    }

    /// Swap the shell database, e.g. after loading a generator blob.
    pub fn replace_database(&mut self, db: XpsDb) -> LayoutStatus {
        self.db = db;
        self.selection.canonicalize(&self.db);
        self.visibility.reset();
        self.recompute()
    }

    /// Swap the text metrics and lay labels out again.
    pub fn set_measure(&mut self, measure: M) -> LayoutStatus {
        self.measure = measure;
        self.layout_pending = true;
        if self.debouncer.is_pending() {
            return LayoutStatus::Waiting;
        }
        self.try_layout()
    }

    pub fn handle(&mut self, event: RendererEvent, now: Duration) -> LayoutStatus {
        match event {
            RendererEvent::VisibilityChanged { id, visible } => {
                if !self.visibility.set(id, visible) {
                    return LayoutStatus::Idle;
                }
                self.refresh_total();
                self.layout_pending = true;
                self.try_layout()
            }
            RendererEvent::AxesChanged(geometry) => {
                self.geometry = geometry.is_ready().then_some(geometry);
                self.layout_pending = true;
                self.debouncer.notify(now);
                LayoutStatus::Waiting
            }
            RendererEvent::GeometryUnavailable => {
                self.geometry = None;
                self.debouncer.cancel();
                self.layout_pending = true;
                LayoutStatus::Deferred
            }
        }
    }

    /// Drive deferred work: fires the debounced relayout and retries layout
    /// that was waiting on the renderer.
    pub fn poll(&mut self, now: Duration) -> LayoutStatus {
        if self.debouncer.is_pending() && !self.debouncer.poll(now) {
            return LayoutStatus::Waiting;
        }
        if !self.layout_pending {
            return LayoutStatus::Idle;
        }
        self.try_layout()
    }

    pub fn render<S: RenderSink>(&self, sink: &mut S) {
        sink.draw(&self.frame());
    }

    fn canonical(&self, mutation: Mutation) -> Mutation {
        let key = |id: String| match self.db.resolve_element(&id) {
            Ok(key) => key.to_string(),
            Err(_) => id,
        };
        match mutation {
            Mutation::AddElement(id) => Mutation::AddElement(key(id)),
            Mutation::RemoveElement(id) => Mutation::RemoveElement(key(id)),
            Mutation::SetElementMultiplier { element, value } => Mutation::SetElementMultiplier {
                element: key(element),
                value,
            },
            other => other,
        }
    }

    fn recompute(&mut self) -> LayoutStatus {
        self.peaks = self.db.synthesize(&self.selection);
        self.broadening = self.selection.broadening().then(|| {
            let grid = self.grid();
            BroadeningCache::build(&self.peaks, self.selection.width(), grid)
        });
        self.refresh_total();
        self.layout_pending = true;
        if self.debouncer.is_pending() {
            return LayoutStatus::Waiting;
        }
        self.try_layout()
    }

    fn grid(&self) -> EnergyGrid {
        let (emin, emax) = match self.selection.window() {
            Some(w) => (w.emin, w.emax),
            None => (
                0.0,
                self.selection
                    .photon_energies()
                    .iter()
                    .copied()
                    .fold(0.0, f64::max),
            ),
        };
        let centers: Vec<f64> = self.peaks.iter().map(|p| p.kinetic_energy).collect();
        EnergyGrid::adaptive(emin, emax, self.selection.width(), self.config.grid, &centers)
    }

    fn refresh_total(&mut self) {
        let visibility = &self.visibility;
        self.total = self
            .broadening
            .as_ref()
            .map(|cache| cache.total(|group, part| visibility.component_visible(group, part)));
    }

    fn try_layout(&mut self) -> LayoutStatus {
        if !self.selection.annotations() {
            self.labels.clear();
            self.layout_pending = false;
            return LayoutStatus::Placed;
        }
        let Some(geometry) = self.geometry else {
            return LayoutStatus::Deferred;
        };

        let visible: Vec<Peak> = self
            .peaks
            .iter()
            .filter(|p| {
                let component = if p.is_auger() {
                    Component::Auger
                } else {
                    Component::Photoelectron
                };
                self.visibility.component_visible(&GroupKey::of(p), component)
            })
            .cloned()
            .collect();

        let mut candidates = Vec::new();
        for note in annotations(&visible) {
            let Some(size) = self.measure.measure(&note.text) else {
                tracing::debug!("label metrics not ready, deferring layout");
                return LayoutStatus::Deferred;
            };
            candidates.push(LabelCandidate {
                owner: note.element,
                text: note.text,
                anchor: note.anchor,
                size,
            });
        }

        self.labels = place(&candidates, &geometry, &self.config.layout);
        self.layout_pending = false;
        LayoutStatus::Placed
    }

    pub fn db(&self) -> &XpsDb {
        &self.db
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn labels(&self) -> &[LabelBox] {
        &self.labels
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn geometry(&self) -> Option<&AxisGeometry> {
        self.geometry.as_ref()
    }

    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    /// Per-group broadened curves; empty when broadening is off.
    pub fn group_curves(&self) -> Vec<BroadenedCurve> {
        self.broadening
            .as_ref()
            .map(BroadeningCache::group_curves)
            .unwrap_or_default()
    }

    /// Sum of the visible groups; `None` when broadening is off.
    pub fn total(&self) -> Option<&BroadenedCurve> {
        self.total.as_ref()
    }

    /// Drawable series in trace order: per group its photoelectron bars,
    /// Auger bars and broadened curve, then the total.
    pub fn series(&self) -> Vec<Series> {
        let mut groups: Vec<GroupKey> = Vec::new();
        for p in &self.peaks {
            let key = GroupKey::of(p);
            if !groups.contains(&key) {
                groups.push(key);
            }
        }
        let curves = self.group_curves();

        let mut out = Vec::new();
        for group in &groups {
            for (kind, auger) in [(SeriesKind::Photoelectron, false), (SeriesKind::Auger, true)] {
                let members: Vec<&Peak> = self
                    .peaks
                    .iter()
                    .filter(|p| p.is_auger() == auger && GroupKey::of(p) == *group)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                out.push(self.make_series(
                    SeriesId::Group {
                        group: group.clone(),
                        kind,
                    },
                    members.iter().map(|p| p.label.clone()).collect(),
                    members
                        .iter()
                        .map(|p| [p.kinetic_energy, p.intensity])
                        .collect(),
                ));
            }
            let curve = curves
                .iter()
                .find(|c| matches!(&c.provenance, Provenance::Group(k) if k == group));
            if let Some(curve) = curve {
                out.push(self.make_series(
                    SeriesId::Group {
                        group: group.clone(),
                        kind: SeriesKind::Broadened,
                    },
                    Vec::new(),
                    curve.points(),
                ));
            }
        }
        if let Some(total) = &self.total {
            out.push(self.make_series(SeriesId::Total, Vec::new(), total.points()));
        }
        out
    }

    fn make_series(&self, id: SeriesId, labels: Vec<String>, points: Vec<[f64; 2]>) -> Series {
        Series {
            tag: id.tag(),
            visible: self.visibility.is_visible(&id),
            id,
            labels,
            points,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            series: self.series(),
            labels: self.labels.clone(),
        }
    }
}
