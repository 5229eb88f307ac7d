//! `GeoJSON` output for rendered cells.

use geo::{LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use ride_map_hexbin_models::RenderCell;

/// Converts one cell into a Polygon feature.
///
/// Properties are `h3` (hex cell ID), `count`, `fillColor` (CSS color
/// string) and `tooltip`.
#[must_use]
pub fn to_feature(cell: &RenderCell) -> Feature {
    // GeoJSON positions are (lng, lat)
    let exterior: LineString<f64> = cell
        .boundary
        .iter()
        .map(|vertex| (vertex.lng, vertex.lat))
        .collect::<Vec<_>>()
        .into();
    let polygon = Polygon::new(exterior, Vec::new());

    let mut properties = JsonObject::new();
    properties.insert("h3".to_string(), JsonValue::from(cell.cell.to_string()));
    properties.insert("count".to_string(), JsonValue::from(cell.count));
    properties.insert(
        "fillColor".to_string(),
        JsonValue::from(cell.fill_color.to_string()),
    );
    properties.insert("tooltip".to_string(), JsonValue::from(cell.tooltip.clone()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
        id: Some(geojson::feature::Id::String(cell.cell.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Wraps every cell in a `FeatureCollection`, preserving order.
#[must_use]
pub fn to_feature_collection(cells: &[RenderCell]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: cells.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}
