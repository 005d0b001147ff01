use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Generic movable elements besides stations and metrolines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Title,
    Subtitle,
    Legend,
}

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [Self::Title, Self::Subtitle, Self::Legend];

    /// Title and subtitle carry editable text
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(self, Self::Title | Self::Subtitle)
    }
}

/// Position (top-left) and extent of an element.
/// The extent is reported by the rendering surface once it has laid the element out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementLayout {
    pub position: Point,
    pub extent: (f64, f64),
}

impl ElementLayout {
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.0, self.position.1, self.extent.0, self.extent.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Elements {
    title: ElementLayout,
    subtitle: ElementLayout,
    legend: ElementLayout,
}

impl Default for Elements {
    fn default() -> Self {
        Self {
            title: ElementLayout { position: (20.0, 20.0), extent: (300.0, 40.0) },
            subtitle: ElementLayout { position: (20.0, 70.0), extent: (300.0, 24.0) },
            legend: ElementLayout { position: (20.0, 800.0), extent: (420.0, 180.0) },
        }
    }
}

impl Elements {
    #[must_use]
    pub fn get(&self, kind: ElementKind) -> &ElementLayout {
        match kind {
            ElementKind::Title => &self.title,
            ElementKind::Subtitle => &self.subtitle,
            ElementKind::Legend => &self.legend,
        }
    }

    pub fn get_mut(&mut self, kind: ElementKind) -> &mut ElementLayout {
        match kind {
            ElementKind::Title => &mut self.title,
            ElementKind::Subtitle => &mut self.subtitle,
            ElementKind::Legend => &mut self.legend,
        }
    }

    /// Topmost element containing the point; the legend is drawn last
    #[must_use]
    pub fn element_at(&self, point: Point) -> Option<ElementKind> {
        ElementKind::ALL
            .into_iter()
            .rev()
            .find(|kind| self.get(*kind).bounds().contains(point))
    }
}
