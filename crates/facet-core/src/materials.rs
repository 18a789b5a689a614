//! Render materials
//!
//! Materials are shared, immutable values. Batches hold an `Arc` to the
//! material they draw with, so cloning a scene never copies them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Material definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material name
    pub name: String,
    /// Base color (RGBA)
    pub color: [f32; 4],
    /// Line width in pixels (ignored for meshes)
    pub line_width: f32,
    /// Whether the material is depth tested
    pub depth_test: bool,
}

impl MaterialDef {
    /// Create a depth-tested material
    pub fn new(name: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            color,
            line_width: 1.0,
            depth_test: true,
        }
    }

    /// Set the line width
    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    /// Draw without depth testing
    pub fn without_depth_test(mut self) -> Self {
        self.depth_test = false;
        self
    }
}

/// Shared material handle
pub type MaterialRef = Arc<MaterialDef>;

/// Material palette configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPalette {
    /// Solid faces
    pub face: MaterialDef,
    /// Solid edges and curve segments
    pub line: MaterialDef,
    /// Edges drawn through occluding faces
    pub occluded_line: MaterialDef,
    /// Surface instances
    pub surface: MaterialDef,
    /// Region instances
    pub region: MaterialDef,
    /// Curve control points
    pub control_point: MaterialDef,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self::dark()
    }
}

impl MaterialPalette {
    /// Create dark theme palette
    pub fn dark() -> Self {
        Self {
            face: MaterialDef::new("face", [0.62, 0.64, 0.68, 1.0]),
            line: MaterialDef::new("line", [0.05, 0.05, 0.05, 1.0]).with_line_width(1.5),
            occluded_line: MaterialDef::new("occluded-line", [0.05, 0.05, 0.05, 0.25])
                .with_line_width(1.0)
                .without_depth_test(),
            surface: MaterialDef::new("surface", [0.45, 0.55, 0.75, 0.8]),
            region: MaterialDef::new("region", [0.35, 0.7, 0.45, 0.5]),
            control_point: MaterialDef::new("control-point", [1.0, 0.85, 0.2, 1.0])
                .without_depth_test(),
        }
    }

    /// Create light theme palette
    pub fn light() -> Self {
        Self {
            face: MaterialDef::new("face", [0.82, 0.83, 0.85, 1.0]),
            line: MaterialDef::new("line", [0.15, 0.15, 0.15, 1.0]).with_line_width(1.5),
            occluded_line: MaterialDef::new("occluded-line", [0.15, 0.15, 0.15, 0.2])
                .without_depth_test(),
            surface: MaterialDef::new("surface", [0.5, 0.6, 0.85, 0.8]),
            region: MaterialDef::new("region", [0.4, 0.75, 0.5, 0.5]),
            control_point: MaterialDef::new("control-point", [0.9, 0.45, 0.1, 1.0])
                .without_depth_test(),
        }
    }
}

/// Materials shared by every batch the builders produce
#[derive(Debug, Clone)]
pub struct MaterialDatabase {
    face: MaterialRef,
    line: MaterialRef,
    occluded_line: MaterialRef,
    surface: MaterialRef,
    region: MaterialRef,
    control_point: MaterialRef,
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::new(&MaterialPalette::default())
    }
}

impl MaterialDatabase {
    /// Build a material database from a palette
    pub fn new(palette: &MaterialPalette) -> Self {
        Self {
            face: Arc::new(palette.face.clone()),
            line: Arc::new(palette.line.clone()),
            occluded_line: Arc::new(palette.occluded_line.clone()),
            surface: Arc::new(palette.surface.clone()),
            region: Arc::new(palette.region.clone()),
            control_point: Arc::new(palette.control_point.clone()),
        }
    }

    /// Face material
    pub fn face(&self) -> MaterialRef {
        self.face.clone()
    }

    /// Line material
    pub fn line(&self) -> MaterialRef {
        self.line.clone()
    }

    /// Occluded line material
    pub fn occluded_line(&self) -> MaterialRef {
        self.occluded_line.clone()
    }

    /// Surface material
    pub fn surface(&self) -> MaterialRef {
        self.surface.clone()
    }

    /// Region material
    pub fn region(&self) -> MaterialRef {
        self.region.clone()
    }

    /// Control point material
    pub fn control_point(&self) -> MaterialRef {
        self.control_point.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_shares_materials() {
        let db = MaterialDatabase::default();
        assert!(Arc::ptr_eq(&db.face(), &db.face()));
        assert!(!db.occluded_line().depth_test);
        assert_eq!(db.line().name, "line");
    }
}
