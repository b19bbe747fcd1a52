use anyhow::{bail, Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnchorContent {
    Text(String),
    Lines(Vec<String>),
}

impl AnchorContent {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            AnchorContent::Text(text) => vec![text.as_str()],
            AnchorContent::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

/// A named point of interest in model-local space.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Anchor {
    pub id: String,
    #[serde(rename = "position")]
    pub local_position: Vec3,
    pub content: AnchorContent,
}

impl Anchor {
    pub fn new(id: impl Into<String>, local_position: Vec3, content: AnchorContent) -> Self {
        Self { id: id.into(), local_position, content }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail catalog construction on the first repeated id.
    Reject,
    /// Log the repeat and keep the earliest anchor with that id.
    KeepFirst,
}

impl DuplicatePolicy {
    /// Loud in debug builds, forgiving in release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::KeepFirst
        }
    }
}

/// Immutable, id-unique set of anchors. Cloning shares the underlying list.
#[derive(Debug, Clone)]
pub struct AnchorCatalog {
    anchors: Arc<[Anchor]>,
}

impl AnchorCatalog {
    pub fn new(anchors: Vec<Anchor>, policy: DuplicatePolicy) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if seen.contains(&anchor.id) {
                match policy {
                    DuplicatePolicy::Reject => bail!("Duplicate anchor id '{}' in catalog", anchor.id),
                    DuplicatePolicy::KeepFirst => {
                        log::error!("[anchors] Duplicate anchor id '{}'; keeping the first entry.", anchor.id);
                        continue;
                    }
                }
            }
            seen.insert(anchor.id.clone());
            unique.push(anchor);
        }
        Ok(Self { anchors: unique.into() })
    }

    pub fn load_json(path: impl AsRef<Path>, policy: DuplicatePolicy) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read anchor file {}", path.display()))?;
        let anchors: Vec<Anchor> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse anchor file {}", path.display()))?;
        Self::new(anchors, policy).with_context(|| format!("Invalid anchor file {}", path.display()))
    }

    /// Anchors placed on [`ModelGraph::procedural_aircraft`](crate::model::ModelGraph::procedural_aircraft).
    pub fn aircraft_default() -> Self {
        let anchors = vec![
            Anchor::new(
                "Кабина пилота",
                Vec3::new(1.2, 0.8, 0.0),
                AnchorContent::Lines(vec![
                    "Одноместная кабина с каплевидным фонарём.".to_string(),
                    "Приборная панель, ручка управления и педали.".to_string(),
                ]),
            ),
            Anchor::new(
                "Двигатель",
                Vec3::new(2.4, 0.0, 0.42),
                AnchorContent::Text(
                    "Поршневой двигатель воздушного охлаждения вращает двухлопастной винт.".to_string(),
                ),
            ),
            Anchor::new(
                "Хвостовое оперение",
                Vec3::new(-2.2, 1.0, 0.1),
                AnchorContent::Lines(vec![
                    "Киль и руль направления.".to_string(),
                    "Стабилизатор с рулями высоты.".to_string(),
                ]),
            ),
        ];
        Self { anchors: anchors.into() }
    }

    pub fn get(&self, id: &str) -> Option<&Anchor> {
        self.anchors.iter().find(|anchor| anchor.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(id: &str, x: f32) -> Anchor {
        Anchor::new(id, Vec3::new(x, 0.0, 0.0), AnchorContent::Text(format!("{id} text")))
    }

    #[test]
    fn reject_policy_reports_duplicate_ids() {
        let err = AnchorCatalog::new(vec![anchor("a", 0.0), anchor("a", 1.0)], DuplicatePolicy::Reject)
            .expect_err("duplicate should fail");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn keep_first_policy_drops_later_duplicates() {
        let catalog = AnchorCatalog::new(
            vec![anchor("a", 0.0), anchor("b", 2.0), anchor("a", 1.0)],
            DuplicatePolicy::KeepFirst,
        )
        .expect("lenient catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").map(|a| a.local_position.x), Some(0.0));
    }

    #[test]
    fn default_catalog_has_three_unique_anchors() {
        let catalog = AnchorCatalog::aircraft_default();
        let ids: Vec<_> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["Кабина пилота", "Двигатель", "Хвостовое оперение"]);
        assert!(AnchorCatalog::new(catalog.iter().cloned().collect(), DuplicatePolicy::Reject).is_ok());
    }

    #[test]
    fn json_content_accepts_text_or_lines() {
        let parsed: Vec<Anchor> = serde_json::from_str(
            r#"[{"id":"x","position":[0,1,2],"content":"one"},
                {"id":"y","position":[3,4,5],"content":["a","b"]}]"#,
        )
        .expect("parse anchors");
        assert_eq!(parsed[0].content.lines(), ["one"]);
        assert_eq!(parsed[1].content.lines(), ["a", "b"]);
        assert_eq!(parsed[1].local_position, Vec3::new(3.0, 4.0, 5.0));
    }
}
