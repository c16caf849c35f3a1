//! Drawable series handed to the renderer, and the visibility state it
//! reports back.

use serde::Serialize;

use crate::broaden::{Component, GroupKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Bars at photoelectron kinetic energies.
    Photoelectron,
    /// Bars at Auger kinetic energies.
    Auger,
    /// Broadened curve of one group.
    Broadened,
}

impl SeriesKind {
    fn tag(self) -> &'static str {
        match self {
            SeriesKind::Photoelectron => "photoelectron",
            SeriesKind::Auger => "auger",
            SeriesKind::Broadened => "broadened",
        }
    }
}

impl From<Component> for SeriesKind {
    fn from(c: Component) -> Self {
        match c {
            Component::Photoelectron => SeriesKind::Photoelectron,
            Component::Auger => SeriesKind::Auger,
        }
    }
}

/// Stable identifier the renderer uses to route visibility toggles back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesId {
    Group { group: GroupKey, kind: SeriesKind },
    Total,
}

impl SeriesId {
    pub fn group(element: &str, photon_energy: f64, kind: SeriesKind) -> Self {
        SeriesId::Group {
            group: GroupKey {
                element: element.to_string(),
                photon_energy,
            },
            kind,
        }
    }

    /// String form, e.g. `neon@1486.6/photoelectron` or `total`.
    pub fn tag(&self) -> String {
        match self {
            SeriesId::Group { group, kind } => {
                format!("{}@{}/{}", group.element, group.photon_energy, kind.tag())
            }
            SeriesId::Total => "total".to_string(),
        }
    }

    /// Inverse of [`SeriesId::tag`].
    pub fn parse(tag: &str) -> Option<Self> {
        if tag == "total" {
            return Some(SeriesId::Total);
        }
        let (group, kind) = tag.rsplit_once('/')?;
        let (element, energy) = group.rsplit_once('@')?;
        let kind = match kind {
            "photoelectron" => SeriesKind::Photoelectron,
            "auger" => SeriesKind::Auger,
            "broadened" => SeriesKind::Broadened,
            _ => return None,
        };
        Some(SeriesId::group(element, energy.parse().ok()?, kind))
    }
}

/// One drawable series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub id: SeriesId,
    pub tag: String,
    /// Per-point text (shell names) for discrete series; empty for curves.
    pub labels: Vec<String>,
    pub points: Vec<[f64; 2]>,
    pub visible: bool,
}

/// Which series the renderer currently hides. Everything starts visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    hidden: Vec<SeriesId>,
}

impl Visibility {
    pub fn is_visible(&self, id: &SeriesId) -> bool {
        !self.hidden.contains(id)
    }

    /// Returns whether the state changed.
    pub fn set(&mut self, id: SeriesId, visible: bool) -> bool {
        let hidden = self.hidden.contains(&id);
        match (visible, hidden) {
            (true, true) => self.hidden.retain(|h| *h != id),
            (false, false) => self.hidden.push(id),
            _ => return false,
        }
        true
    }

    /// Whether a discrete component of a group counts towards the total.
    pub fn component_visible(&self, group: &GroupKey, component: Component) -> bool {
        self.is_visible(&SeriesId::Group {
            group: group.clone(),
            kind: component.into(),
        })
    }

    pub fn reset(&mut self) {
        self.hidden.clear();
    }
}
