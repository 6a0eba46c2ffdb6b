//! Conversion from JSON:API resources to domain entities.
//!
//! A resource that lacks a required field is skipped with a warning; it
//! never fails the surrounding batch.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Alert, Facility, Line, Prediction, Route, Shape, Stop};

use super::error::ConversionError;
use super::types::{
    AlertAttributes, FacilityAttributes, LineAttributes, PredictionAttributes, Resource,
    RouteAttributes, ShapeAttributes, StopAttributes,
};

/// Convert every resource of `kind` with `convert`, dropping malformed ones.
///
/// Resources without a `type` are assumed to be of `kind`.
pub fn convert_all<T>(
    resources: &[Resource],
    kind: &'static str,
    convert: impl Fn(&Resource) -> Result<T, ConversionError>,
) -> Vec<T> {
    resources
        .iter()
        .filter(|r| r.kind.as_deref().is_none_or(|k| k == kind))
        .filter_map(|r| match convert(r) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(kind, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn require_id(resource: &Resource, kind: &'static str) -> Result<String, ConversionError> {
    resource
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or(ConversionError::MissingId { kind })
}

fn attributes<T: DeserializeOwned + Default>(
    resource: &Resource,
    kind: &'static str,
    id: &str,
) -> Result<T, ConversionError> {
    if resource.attributes.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(resource.attributes.clone()).map_err(|e| ConversionError::Malformed {
        kind,
        id: id.to_string(),
        message: e.to_string(),
    })
}

fn required<T>(
    value: Option<T>,
    kind: &'static str,
    id: &str,
    field: &'static str,
) -> Result<T, ConversionError> {
    value.ok_or_else(|| ConversionError::MissingField {
        kind,
        id: id.to_string(),
        field,
    })
}

pub fn convert_line(resource: &Resource) -> Result<Line, ConversionError> {
    const KIND: &str = "line";
    let id = require_id(resource, KIND)?;
    let attrs: LineAttributes = attributes(resource, KIND, &id)?;

    Ok(Line {
        name: required(attrs.long_name, KIND, &id, "long_name")?,
        color: required(attrs.color, KIND, &id, "color")?,
        short_name: attrs.short_name.filter(|s| !s.is_empty()),
        text_color: attrs.text_color,
        sort_order: attrs.sort_order,
        id,
    })
}

pub fn convert_route(resource: &Resource) -> Result<Route, ConversionError> {
    const KIND: &str = "route";
    let id = require_id(resource, KIND)?;
    let attrs: RouteAttributes = attributes(resource, KIND, &id)?;

    Ok(Route {
        line_id: resource.related_id("line").map(str::to_string),
        long_name: attrs.long_name,
        short_name: attrs.short_name.filter(|s| !s.is_empty()),
        color: attrs.color,
        route_type: attrs.route_type,
        direction_names: attrs
            .direction_names
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect(),
        sort_order: attrs.sort_order,
        id,
    })
}

pub fn convert_stop(resource: &Resource) -> Result<Stop, ConversionError> {
    const KIND: &str = "stop";
    let id = require_id(resource, KIND)?;
    let attrs: StopAttributes = attributes(resource, KIND, &id)?;

    Ok(Stop {
        name: required(attrs.name, KIND, &id, "name")?,
        latitude: required(attrs.latitude, KIND, &id, "latitude")?,
        longitude: required(attrs.longitude, KIND, &id, "longitude")?,
        parent_station: resource.related_id("parent_station").map(str::to_string),
        route_ids: Vec::new(),
        id,
    })
}

/// Shapes carry their route from the request, not from the resource.
pub fn convert_shape(resource: &Resource, route_id: &str) -> Result<Shape, ConversionError> {
    const KIND: &str = "shape";
    let id = require_id(resource, KIND)?;
    let attrs: ShapeAttributes = attributes(resource, KIND, &id)?;

    Ok(Shape {
        polyline: required(attrs.polyline, KIND, &id, "polyline")?,
        route_id: resource
            .related_id("route")
            .unwrap_or(route_id)
            .to_string(),
        id,
    })
}

/// Predictions keep every field optional; the matcher validates them.
pub fn convert_prediction(resource: &Resource) -> Result<Prediction, ConversionError> {
    const KIND: &str = "prediction";
    let id = require_id(resource, KIND)?;
    let attrs: PredictionAttributes = attributes(resource, KIND, &id)?;

    Ok(Prediction {
        stop_id: resource.related_id("stop").map(str::to_string),
        route_id: resource.related_id("route").map(str::to_string),
        direction_id: attrs.direction_id,
        arrival_time: attrs.arrival_time,
        departure_time: attrs.departure_time,
        status: attrs.status,
        id,
    })
}

pub fn convert_alert(resource: &Resource) -> Result<Alert, ConversionError> {
    const KIND: &str = "alert";
    let id = require_id(resource, KIND)?;
    let attrs: AlertAttributes = attributes(resource, KIND, &id)?;

    let mut route_ids: Vec<String> = Vec::new();
    let informed = attrs.informed_entity.into_iter().filter_map(|e| e.route);
    for route_id in informed.chain(resource.related_ids("routes")) {
        if !route_ids.contains(&route_id) {
            route_ids.push(route_id);
        }
    }

    Ok(Alert {
        header: required(attrs.header, KIND, &id, "header")?,
        effect: attrs.effect,
        severity: attrs.severity.unwrap_or(0),
        lifecycle: attrs.lifecycle,
        route_ids,
        id,
    })
}

pub fn convert_facility(resource: &Resource) -> Result<Facility, ConversionError> {
    const KIND: &str = "facility";
    let id = require_id(resource, KIND)?;
    let attrs: FacilityAttributes = attributes(resource, KIND, &id)?;

    Ok(Facility {
        long_name: attrs.long_name,
        short_name: attrs.short_name,
        facility_type: attrs.facility_type,
        stop_id: resource.related_id("stop").map(str::to_string),
        id,
    })
}
