//! WASM bindings for the xpssynth spectrum engine.
//!
//! Build with:
//! ```sh
//! wasm-pack build -p xpssynth-wasm
//! ```
//!
//! The page owns one [`WasmEngine`], forwards user actions and renderer
//! callbacks to it, calls [`WasmEngine::poll`] from `requestAnimationFrame`,
//! and redraws from [`WasmEngine::frame_json`] whenever a call reports a change.

use std::time::Duration;

use js_sys::{Array, Function};
use wasm_bindgen::prelude::*;

use xpssynth::constants::PHOTON_ENERGY_PRESETS;
use xpssynth::{
    AxisGeometry, AxisMapping, FixedCharMetrics, LabelMeasure, LabelSize, LayoutStatus, Mutation,
    RendererEvent, SelectionState, SeriesId, SpectrumEngine, XpsDb, XpsError,
};

fn to_js(e: XpsError) -> JsError {
    JsError::new(&e.to_string())
}

fn now() -> Duration {
    Duration::from_millis(js_sys::Date::now() as u64)
}

fn axis(range: [f64; 2], pixels: [f64; 2], log: bool) -> AxisMapping {
    if log {
        AxisMapping::log(range, pixels)
    } else {
        AxisMapping::linear(range, pixels)
    }
}

fn status(s: LayoutStatus) -> String {
    match s {
        LayoutStatus::Idle => "idle",
        LayoutStatus::Placed => "placed",
        LayoutStatus::Waiting => "waiting",
        LayoutStatus::Deferred => "deferred",
    }
    .to_string()
}

/// Label metrics from a page callback `(text) => [width, height] | undefined`,
/// or a monospace estimate when none is installed.
#[derive(Default)]
struct PageMetrics {
    callback: Option<Function>,
    fallback: FixedCharMetrics,
}

impl LabelMeasure for PageMetrics {
    fn measure(&self, text: &str) -> Option<LabelSize> {
        let Some(callback) = &self.callback else {
            return self.fallback.measure(text);
        };
        let value = callback.call1(&JsValue::NULL, &JsValue::from_str(text)).ok()?;
        if !Array::is_array(&value) {
            return None;
        }
        let pair = Array::from(&value);
        let width = pair.get(0).as_f64()?;
        let height = pair.get(1).as_f64()?;
        (width.is_finite() && height.is_finite()).then_some(LabelSize { width, height })
    }
}

#[wasm_bindgen]
pub struct WasmEngine {
    inner: SpectrumEngine<PageMetrics>,
}

#[wasm_bindgen]
impl WasmEngine {
    /// Engine over the built-in table with the default selection.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmEngine {
        WasmEngine {
            inner: SpectrumEngine::new(
                XpsDb::new(),
                SelectionState::default(),
                PageMetrics::default(),
            ),
        }
    }

    /// Engine restored from a persisted selection; missing or invalid
    /// fields fall back to defaults.
    pub fn from_selection_json(json: &str) -> Result<WasmEngine, JsError> {
        let selection = SelectionState::from_json(json).map_err(to_js)?;
        Ok(WasmEngine {
            inner: SpectrumEngine::new(XpsDb::new(), selection, PageMetrics::default()),
        })
    }

    /// Swap in a database blob written by `xpssynth-generate`, keeping the
    /// current selection and text metrics.
    pub fn load_database(&mut self, bytes: &[u8]) -> Result<String, JsError> {
        let db = XpsDb::from_compressed(bytes).map_err(to_js)?;
        Ok(status(self.inner.replace_database(db)))
    }

    pub fn set_measure(&mut self, callback: Function) -> String {
        status(self.inner.set_measure(PageMetrics {
            callback: Some(callback),
            fallback: FixedCharMetrics::default(),
        }))
    }

    // ── Selection ──

    pub fn add_element(&mut self, element: &str) -> Result<String, JsError> {
        self.apply(Mutation::AddElement(element.to_string()))
    }

    pub fn remove_element(&mut self, element: &str) -> Result<String, JsError> {
        self.apply(Mutation::RemoveElement(element.to_string()))
    }

    pub fn add_photon_energy(&mut self, energy: f64) -> Result<String, JsError> {
        self.apply(Mutation::AddPhotonEnergy(energy))
    }

    pub fn remove_photon_energy(&mut self, energy: f64) -> Result<String, JsError> {
        self.apply(Mutation::RemovePhotonEnergy(energy))
    }

    pub fn set_work_function(&mut self, value: f64) -> Result<String, JsError> {
        self.apply(Mutation::SetWorkFunction(value))
    }

    pub fn set_element_multiplier(&mut self, element: &str, value: f64) -> Result<String, JsError> {
        self.apply(Mutation::SetElementMultiplier {
            element: element.to_string(),
            value,
        })
    }

    pub fn set_energy_multiplier(
        &mut self,
        photon_energy: f64,
        value: f64,
    ) -> Result<String, JsError> {
        self.apply(Mutation::SetEnergyMultiplier {
            photon_energy,
            value,
        })
    }

    pub fn set_broadening(&mut self, on: bool) -> Result<String, JsError> {
        self.apply(Mutation::SetBroadening(on))
    }

    /// FWHM = `percent` % of the kinetic energy + `fixed_ev`.
    pub fn set_broadening_width(
        &mut self,
        percent: f64,
        fixed_ev: f64,
    ) -> Result<String, JsError> {
        self.apply(Mutation::SetBroadeningWidth { percent, fixed_ev })
    }

    pub fn set_annotations(&mut self, on: bool) -> Result<String, JsError> {
        self.apply(Mutation::SetAnnotations(on))
    }

    pub fn set_auger(&mut self, on: bool) -> Result<String, JsError> {
        self.apply(Mutation::SetAuger(on))
    }

    pub fn set_energy_window(&mut self, emin: f64, emax: f64) -> Result<String, JsError> {
        self.apply(Mutation::SetEnergyWindow(Some((emin, emax))))
    }

    pub fn clear_energy_window(&mut self) -> Result<String, JsError> {
        self.apply(Mutation::SetEnergyWindow(None))
    }

    /// Selection as the JSON record the page keeps in local storage.
    pub fn selection_json(&self) -> Result<String, JsError> {
        self.inner.selection().to_json().map_err(to_js)
    }

    // ── Renderer callbacks ──

    /// Report the current axes. Ranges are in data units (log10 units for
    /// log axes); pixel pairs give the positions of the range ends.
    #[allow(clippy::too_many_arguments)]
    pub fn set_axes(
        &mut self,
        x_range0: f64,
        x_range1: f64,
        x_px0: f64,
        x_px1: f64,
        x_log: bool,
        y_range0: f64,
        y_range1: f64,
        y_px0: f64,
        y_px1: f64,
        y_log: bool,
    ) -> String {
        let geometry = AxisGeometry {
            x: axis([x_range0, x_range1], [x_px0, x_px1], x_log),
            y: axis([y_range0, y_range1], [y_px0, y_px1], y_log),
        };
        status(self.inner.handle(RendererEvent::AxesChanged(geometry), now()))
    }

    pub fn geometry_unavailable(&mut self) -> String {
        status(self.inner.handle(RendererEvent::GeometryUnavailable, now()))
    }

    /// Legend toggle for the series with the given tag.
    pub fn set_visibility(&mut self, tag: &str, visible: bool) -> Result<String, JsError> {
        let id = SeriesId::parse(tag)
            .ok_or_else(|| JsError::new(&format!("unknown series tag: {tag}")))?;
        Ok(status(
            self.inner
                .handle(RendererEvent::VisibilityChanged { id, visible }, now()),
        ))
    }

    /// Drive debounced and deferred label layout. Returns "placed" when the
    /// labels changed and the plot should be redrawn.
    pub fn poll(&mut self) -> String {
        status(self.inner.poll(now()))
    }

    // ── Output ──

    /// `{ series: [...], labels: [...] }` for the renderer.
    pub fn frame_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.inner.frame()).map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn peaks_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.inner.peaks()).map_err(|e| JsError::new(&e.to_string()))
    }
}

impl WasmEngine {
    fn apply(&mut self, mutation: Mutation) -> Result<String, JsError> {
        self.inner.apply(mutation).map(status).map_err(to_js)
    }
}

impl Default for WasmEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ── Catalog ──

/// Keys of the elements in the built-in table.
#[wasm_bindgen]
pub fn element_keys() -> Array {
    XpsDb::new()
        .element_keys()
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

/// Binding energy (eV) of one shell.
#[wasm_bindgen]
pub fn binding_energy(element: &str, shell: &str) -> Result<f64, JsError> {
    XpsDb::new().binding_energy(element, shell).map_err(to_js)
}

/// Photon energy presets as `[[name, eV], ...]`.
#[wasm_bindgen]
pub fn photon_energy_presets() -> Array {
    PHOTON_ENERGY_PRESETS
        .iter()
        .map(|&(name, energy)| {
            let pair = Array::new();
            pair.push(&JsValue::from_str(name));
            pair.push(&JsValue::from_f64(energy));
            JsValue::from(pair)
        })
        .collect()
}
