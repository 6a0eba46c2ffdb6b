//! JSON:API response DTOs.
//!
//! These map directly onto the upstream V3 API documents. Everything is
//! optional or defaulted because upstream omits fields freely; the
//! conversion layer decides what is required.

use std::collections::HashMap;

use serde::Deserialize;

/// A JSON:API document: primary `data` plus side-loaded `included`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Vec<Resource>,

    #[serde(default)]
    pub included: Vec<Resource>,
}

/// One resource object.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub id: Option<String>,

    /// Resource type, e.g. "stop" or "route".
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Kind-specific attributes, decoded lazily by the converters.
    #[serde(default)]
    pub attributes: serde_json::Value,

    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

impl Resource {
    /// First related id under `name`, if any.
    pub fn related_id(&self, name: &str) -> Option<&str> {
        match self.relationships.get(name)?.data.as_ref()? {
            Linkage::One(r) => Some(r.id.as_str()),
            Linkage::Many(rs) => rs.first().map(|r| r.id.as_str()),
        }
    }

    /// All related ids under `name`.
    pub fn related_ids(&self, name: &str) -> Vec<String> {
        match self.relationships.get(name).and_then(|r| r.data.as_ref()) {
            Some(Linkage::One(r)) => vec![r.id.clone()],
            Some(Linkage::Many(rs)) => rs.iter().map(|r| r.id.clone()).collect(),
            None => Vec::new(),
        }
    }
}

/// A relationship object. `data` is null when the link is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

/// Resource linkage: to-one or to-many.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    One(ResourceRef),
    Many(Vec<ResourceRef>),
}

/// A `{ "id", "type" }` pointer.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Attributes of a `line` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineAttributes {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub sort_order: Option<i64>,
}

/// Attributes of a `route` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteAttributes {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub route_type: Option<i32>,
    pub direction_names: Option<Vec<Option<String>>>,
    pub sort_order: Option<i64>,
}

/// Attributes of a `stop` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopAttributes {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Attributes of a `shape` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeAttributes {
    pub polyline: Option<String>,
}

/// Attributes of a `prediction` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionAttributes {
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub direction_id: Option<u8>,
    pub status: Option<String>,
}

/// Attributes of an `alert` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertAttributes {
    pub header: Option<String>,
    pub effect: Option<String>,
    pub severity: Option<i64>,
    pub lifecycle: Option<String>,
    #[serde(default)]
    pub informed_entity: Vec<InformedEntity>,
}

/// A route an alert touches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InformedEntity {
    pub route: Option<String>,
}

/// Attributes of a `facility` resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilityAttributes {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_document_with_included() {
        let json = r#"{
            "data": [{
                "id": "Red",
                "type": "route",
                "attributes": {"long_name": "Red Line", "type": 1},
                "relationships": {"line": {"data": {"id": "line-Red", "type": "line"}}}
            }],
            "included": [{
                "id": "line-Red",
                "type": "line",
                "attributes": {"long_name": "Red Line", "color": "DA291C"}
            }]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.data.len(), 1);
        assert_eq!(doc.included.len(), 1);
        assert_eq!(doc.data[0].related_id("line"), Some("line-Red"));
        assert_eq!(doc.included[0].kind.as_deref(), Some("line"));
    }

    #[test]
    fn null_and_missing_relationships() {
        let json = r#"{
            "data": [{
                "id": "place-pktrm",
                "type": "stop",
                "attributes": {},
                "relationships": {"parent_station": {"data": null}}
            }]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        let stop = &doc.data[0];
        assert_eq!(stop.related_id("parent_station"), None);
        assert_eq!(stop.related_id("route"), None);
        assert!(doc.included.is_empty());
    }

    #[test]
    fn to_many_relationship() {
        let json = r#"{
            "id": "a1",
            "type": "alert",
            "relationships": {"routes": {"data": [{"id": "Red", "type": "route"}, {"id": "Mattapan", "type": "route"}]}}
        }"#;

        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.related_ids("routes"), vec!["Red", "Mattapan"]);
        assert_eq!(resource.related_id("routes"), Some("Red"));
    }
}
