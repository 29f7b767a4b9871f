//! Artwork metadata and the JSON catalog that hangs paintings in the gallery.

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use log::info;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;
use crate::scene::{ObjectId, Scene, SceneObject, Shape, SpotLight};

/// Descriptive data attached to an exhibited piece.
///
/// Every field is optional: the detail panel falls back to placeholders
/// instead of refusing to open.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtworkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image reference, usually a path relative to the asset root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl ArtworkMetadata {
    /// Height over width, treating missing or non-positive sizes as 1.
    pub fn aspect_ratio(&self) -> f32 {
        let width = positive_or_one(self.width);
        let height = positive_or_one(self.height);
        height / width
    }

    /// Text read aloud by the narrate button.
    pub fn narration_text(&self) -> String {
        format!(
            "{}. {}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
    }
}

fn positive_or_one(value: Option<f32>) -> f32 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(1.0)
}

/// Y rotation of a hung painting, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogRotation {
    #[serde(default)]
    pub y: f32,
}

/// One catalog entry: metadata plus where the piece hangs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub metadata: ArtworkMetadata,
    /// Either `[x, y, z]` or `{ "x": .., "y": .., "z": .. }`.
    #[serde(deserialize_with = "deserialize_position")]
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<CatalogRotation>,
    /// Intensity of a spotlight lighting the piece, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotlight: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Array([f32; 3]),
    Object { x: f32, y: f32, z: f32 },
}

fn deserialize_position<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PositionRepr::deserialize(deserializer)? {
        PositionRepr::Array(xyz) => Vec3::from_array(xyz),
        PositionRepr::Object { x, y, z } => Vec3::new(x, y, z),
    })
}

/// Ordered list of exhibited pieces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl ArtworkCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Hangs every piece in the scene and returns the painting ids.
    ///
    /// Each piece gets its own group holding the painting plane and, when
    /// the entry asks for one, a spotlight. The painting stores the
    /// spotlight association so hover highlighting never has to search.
    pub fn install(&self, scene: &mut Scene) -> Vec<ObjectId> {
        let mut paintings = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let label = entry
                .metadata
                .id
                .clone()
                .unwrap_or_else(|| format!("artwork-{}", paintings.len()));
            let rotation = Quat::from_rotation_y(entry.rotation.map_or(0.0, |r| r.y));
            let group = scene.add(
                SceneObject::new(format!("{label}/mount"))
                    .with_position(entry.position)
                    .with_rotation(rotation),
                None,
            );

            let light = entry.spotlight.map(|intensity| {
                scene.add(
                    SceneObject::new(format!("{label}/spotlight"))
                        .with_position(Vec3::new(0.0, 2.0, 1.0))
                        .with_light(SpotLight { intensity }),
                    Some(group),
                )
            });

            let shape = Shape::Plane {
                width: positive_or_one(entry.metadata.width),
                height: positive_or_one(entry.metadata.height),
            };
            let mut painting = SceneObject::new(label)
                .with_shape(shape)
                .with_artwork(entry.metadata.clone());
            painting.spotlight = light;
            paintings.push(scene.add(painting, Some(group)));
        }
        info!("Gallery loaded: {} artworks installed", paintings.len());
        paintings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    const CATALOG: &str = r#"[
        {
            "id": "starry",
            "title": "Noche estrellada",
            "author": "V. van Gogh",
            "description": "Óleo sobre lienzo",
            "src": "assets/starry.jpg",
            "width": 2.0,
            "height": 1.5,
            "position": [0.0, 1.6, -10.0],
            "rotation": { "y": 0.0 },
            "spotlight": 4.0
        },
        {
            "position": [5.0, 1.6, 0.0]
        }
    ]"#;

    #[test]
    fn parses_catalog_entries() {
        let catalog = ArtworkCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.entries.len(), 2);
        let first = &catalog.entries[0].metadata;
        assert_eq!(first.title.as_deref(), Some("Noche estrellada"));
        assert!((first.aspect_ratio() - 0.75).abs() < 1e-6);
        assert_eq!(catalog.entries[1].metadata, ArtworkMetadata::default());
    }

    #[test]
    fn install_links_spotlights_and_roles() {
        let catalog = ArtworkCatalog::from_json(CATALOG).unwrap();
        let mut scene = Scene::new();
        let paintings = catalog.install(&mut scene);
        assert_eq!(paintings.len(), 2);

        let starry = scene.get(paintings[0]).unwrap();
        assert_eq!(scene.role(paintings[0]), Role::Interactable);
        let light = starry.spotlight.expect("spotlight linked");
        assert_eq!(scene.get(light).unwrap().light.unwrap().intensity, 4.0);
        assert!(scene.get(paintings[1]).unwrap().spotlight.is_none());
    }

    #[test]
    fn positions_accept_object_form() {
        let catalog = ArtworkCatalog::from_json(
            r#"[
                {
                    "id": "mona",
                    "title": "La Gioconda",
                    "position": { "x": 1.0, "y": 1.6, "z": -5.0 },
                    "rotation": { "y": 0.5 }
                }
            ]"#,
        )
        .unwrap();
        let entry = &catalog.entries[0];
        assert_eq!(entry.position, Vec3::new(1.0, 1.6, -5.0));
        assert_eq!(entry.rotation, Some(CatalogRotation { y: 0.5 }));

        let mut scene = Scene::new();
        let paintings = catalog.install(&mut scene);
        assert!((scene.world_position(paintings[0]) - Vec3::new(1.0, 1.6, -5.0)).length() < 1e-5);
    }

    #[test]
    fn missing_sizes_default_to_square() {
        let metadata = ArtworkMetadata {
            width: Some(0.0),
            ..ArtworkMetadata::default()
        };
        assert_eq!(metadata.aspect_ratio(), 1.0);
        assert_eq!(metadata.narration_text(), ". ");
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            ArtworkCatalog::from_json("{ not json"),
            Err(CatalogError::Json(_))
        ));
    }
}
