//! Conversion between GeoJSON geometry objects and `geo` polygons.

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

/// Polygonal geometry of one feature, keeping the GeoJSON type it was read as.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Shape {
    /// Build a shape from parts: one part becomes a `Polygon`, anything else a `MultiPolygon`.
    pub fn from_parts(parts: Vec<Polygon<f64>>) -> Self {
        match <[Polygon<f64>; 1]>::try_from(parts) {
            Ok([polygon]) => Shape::Polygon(polygon),
            Err(parts) => Shape::MultiPolygon(MultiPolygon(parts)),
        }
    }

    /// The polygon parts (sub-polygons) of this shape.
    pub fn parts(&self) -> &[Polygon<f64>] {
        match self {
            Shape::Polygon(polygon) => std::slice::from_ref(polygon),
            Shape::MultiPolygon(mp) => &mp.0,
        }
    }

    #[inline] pub fn is_multi(&self) -> bool { matches!(self, Shape::MultiPolygon(_)) }

    /// Planar area in source projection units (holes subtracted).
    pub fn area(&self) -> f64 {
        self.parts().iter().map(|p| p.unsigned_area()).sum()
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon(self.parts().to_vec())
    }

    /// Parse a GeoJSON geometry object. Only `Polygon` and `MultiPolygon` are accepted.
    pub(crate) fn from_geojson(geometry: &Value) -> Result<Self, String> {
        let kind = geometry.get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "geometry has no \"type\"".to_string())?;
        let coords = geometry.get("coordinates")
            .and_then(Value::as_array)
            .ok_or_else(|| format!("{kind} geometry has no \"coordinates\" array"))?;

        match kind {
            "Polygon" => parse_polygon(coords).map(Shape::Polygon),
            "MultiPolygon" => coords.iter()
                .map(|polygon| polygon.as_array()
                    .ok_or_else(|| "MultiPolygon member is not an array".to_string())
                    .and_then(|rings| parse_polygon(rings)))
                .collect::<Result<Vec<_>, _>>()
                .map(|polygons| Shape::MultiPolygon(MultiPolygon(polygons))),
            other => Err(format!("unsupported geometry type {other:?}")),
        }
    }

    /// Serialize as a GeoJSON geometry object.
    pub(crate) fn to_geojson(&self) -> Value {
        match self {
            Shape::Polygon(polygon) => json!({
                "type": "Polygon",
                "coordinates": polygon_to_coords(polygon),
            }),
            Shape::MultiPolygon(mp) => json!({
                "type": "MultiPolygon",
                "coordinates": mp.0.iter().map(polygon_to_coords).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Parse polygon rings: the first is the exterior, the rest are holes.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| ring.as_array()
        .ok_or_else(|| "ring is not an array".to_string())
        .and_then(|coords| parse_ring(coords)));

    let exterior = rings.next()
        .ok_or_else(|| "polygon has no exterior ring".to_string())??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring of `[x, y, ...]` positions, closing it if needed.
fn parse_ring(coords: &[Value]) -> Result<LineString<f64>, String> {
    let mut points = Vec::with_capacity(coords.len() + 1);

    for position in coords {
        let position = position.as_array()
            .filter(|p| p.len() >= 2)
            .ok_or_else(|| format!("invalid position {position}"))?;
        let x = position[0].as_f64()
            .ok_or_else(|| format!("invalid coordinate: x must be a number, got {}", position[0]))?;
        let y = position[1].as_f64()
            .ok_or_else(|| format!("invalid coordinate: y must be a number, got {}", position[1]))?;
        points.push(Coord { x, y });
    }

    if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
        if first != *last { points.push(first) }
    }

    Ok(LineString(points))
}

fn polygon_to_coords(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn parses_polygon_with_hole() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[2, 2], [4, 2], [4, 4], [2, 4]],
            ],
        });
        let shape = Shape::from_geojson(&value).unwrap();
        let Shape::Polygon(polygon) = &shape else { panic!("expected polygon") };
        assert_eq!(polygon.interiors().len(), 1);
        assert!(polygon.interiors()[0].is_closed());
        assert_eq!(shape.area(), 96.0);
    }

    #[test]
    fn keeps_multipolygon_type() {
        let value = json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]],
        });
        let shape = Shape::from_geojson(&value).unwrap();
        assert!(shape.is_multi());
        assert_eq!(shape.parts().len(), 1);
        assert_eq!(shape.to_geojson()["type"], "MultiPolygon");
    }

    #[test]
    fn rejects_non_polygonal_and_malformed() {
        assert!(Shape::from_geojson(&json!({"type": "Point", "coordinates": [1, 2]})).is_err());
        assert!(Shape::from_geojson(&json!({"type": "Polygon"})).is_err());
        assert!(Shape::from_geojson(&json!({"type": "Polygon", "coordinates": []})).is_err());
        assert!(Shape::from_geojson(&json!({"type": "Polygon", "coordinates": [[[0, "a"]]]})).is_err());
        assert!(Shape::from_geojson(&Value::Null).is_err());
    }

    #[test]
    fn from_parts_collapses_single_part() {
        let square = polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.), (x: 0., y: 1.)];
        assert_eq!(Shape::from_parts(vec![square.clone()]), Shape::Polygon(square.clone()));

        let multi = Shape::from_parts(vec![square.clone(), square.clone()]);
        assert!(multi.is_multi());
        assert_eq!(multi.parts(), [square.clone(), square]);

        let empty = Shape::from_parts(Vec::new());
        assert!(empty.is_multi());
        assert!(empty.parts().is_empty());
    }
}
