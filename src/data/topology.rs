//! TopoJSON decoding into GeoJSON features.

use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, Value};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{MapError, Result};

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<QuantizeTransform>,
    #[serde(default)]
    arcs: Vec<Vec<Position>>,
    #[serde(default)]
    objects: HashMap<String, TopoObject>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct QuantizeTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// One geometry object. Its `arcs` and `coordinates` are kept untyped until
/// the `type` says what shape they have, so a malformed member only loses
/// its own geometry.
#[derive(Debug, Deserialize)]
struct TopoObject {
    /// `None` for a null geometry
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    arcs: serde_json::Value,
    #[serde(default)]
    coordinates: serde_json::Value,
    #[serde(default)]
    geometries: Option<Vec<TopoObject>>,
    #[serde(default)]
    properties: Option<JsonObject>,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

impl TopoObject {
    fn members(&self) -> &[TopoObject] {
        self.geometries.as_deref().unwrap_or_default()
    }

    /// Name property or id, for log messages
    fn label(&self) -> String {
        let name = self
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str());
        match (name, &self.id) {
            (Some(name), _) => name.to_string(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "unnamed object".to_string(),
        }
    }
}

fn parse<'a, T: Deserialize<'a>>(value: &'a serde_json::Value, field: &str) -> Result<T> {
    T::deserialize(value).map_err(|e| MapError::Topology(format!("bad `{field}`: {e}")))
}

impl Topology {
    /// Parse a topology in place (the buffer is used as scratch space)
    pub fn from_slice(bytes: &mut [u8]) -> Result<Self> {
        simd_json::serde::from_slice(bytes).map_err(|e| MapError::Topology(e.to_string()))
    }

    /// Features of the named object. A geometry collection yields one
    /// feature per member; any other object yields a single feature.
    ///
    /// Only a missing object is an error. A member with a null or unknown
    /// type, or with broken arc references, becomes a feature without
    /// geometry that keeps its id and properties.
    pub fn features(&self, object: &str) -> Result<Vec<Feature>> {
        let obj = self
            .objects
            .get(object)
            .ok_or_else(|| MapError::Topology(format!("no object named `{object}`")))?;

        let decoder = ArcDecoder::new(self);
        Ok(match obj.kind.as_deref() {
            Some("GeometryCollection") => obj.members().iter().map(|g| decoder.feature(g)).collect(),
            _ => vec![decoder.feature(obj)],
        })
    }
}

struct ArcDecoder<'a> {
    topology: &'a Topology,
    /// Arcs with delta encoding and quantization removed
    arcs: Vec<Vec<Position>>,
}

impl<'a> ArcDecoder<'a> {
    fn new(topology: &'a Topology) -> Self {
        let arcs = topology
            .arcs
            .iter()
            .map(|arc| match topology.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        })
                        .collect()
                }
                None => arc.clone(),
            })
            .collect();
        Self { topology, arcs }
    }

    fn point(&self, p: &[f64]) -> Position {
        match (self.topology.transform, p) {
            (Some(t), [x, y, ..]) => vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]],
            _ => p.to_vec(),
        }
    }

    /// Append arc `i` to `points`, dropping the shared joint vertex.
    /// Negative indices (`!i`) walk the arc in reverse.
    fn push_arc(&self, i: i64, points: &mut Vec<Position>) -> Result<()> {
        let idx = if i < 0 { !i } else { i };
        let arc = usize::try_from(idx)
            .ok()
            .and_then(|idx| self.arcs.get(idx))
            .ok_or_else(|| MapError::Topology(format!("arc index {i} out of range")))?;

        points.pop();
        let start = points.len();
        points.extend(arc.iter().cloned());
        if i < 0 {
            points[start..].reverse();
        }
        Ok(())
    }

    fn line(&self, arcs: &[i64]) -> Result<Vec<Position>> {
        let mut points = Vec::new();
        for &i in arcs {
            self.push_arc(i, &mut points)?;
        }
        if points.len() == 1 {
            points.push(points[0].clone());
        }
        Ok(points)
    }

    fn ring(&self, arcs: &[i64]) -> Result<Vec<Position>> {
        let mut points = self.line(arcs)?;
        while !points.is_empty() && points.len() < 4 {
            points.push(points[0].clone());
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Position>>> {
        rings.iter().map(|r| self.ring(r)).collect()
    }

    /// `Ok(None)` for a null geometry or a type TopoJSON does not define
    fn geometry(&self, obj: &TopoObject) -> Result<Option<Value>> {
        let value = match obj.kind.as_deref() {
            None => return Ok(None),
            Some("Point") => Value::Point(self.point(&parse::<Position>(&obj.coordinates, "coordinates")?)),
            Some("MultiPoint") => Value::MultiPoint(
                parse::<Vec<Position>>(&obj.coordinates, "coordinates")?
                    .iter()
                    .map(|p| self.point(p))
                    .collect(),
            ),
            Some("LineString") => Value::LineString(self.line(&parse::<Vec<i64>>(&obj.arcs, "arcs")?)?),
            Some("MultiLineString") => Value::MultiLineString(
                parse::<Vec<Vec<i64>>>(&obj.arcs, "arcs")?
                    .iter()
                    .map(|a| self.line(a))
                    .collect::<Result<_>>()?,
            ),
            Some("Polygon") => Value::Polygon(self.polygon(&parse::<Vec<Vec<i64>>>(&obj.arcs, "arcs")?)?),
            Some("MultiPolygon") => Value::MultiPolygon(
                parse::<Vec<Vec<Vec<i64>>>>(&obj.arcs, "arcs")?
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_>>()?,
            ),
            Some("GeometryCollection") => {
                let mut geometries = Vec::new();
                for member in obj.members() {
                    if let Some(value) = self.geometry(member)? {
                        geometries.push(Geometry::new(value));
                    }
                }
                Value::GeometryCollection(geometries)
            }
            Some(other) => {
                warn!("{}: unknown geometry type `{other}`", obj.label());
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    fn feature(&self, obj: &TopoObject) -> Feature {
        let geometry = match self.geometry(obj) {
            Ok(value) => value.map(Geometry::new),
            Err(err) => {
                warn!("{}: dropping geometry: {err}", obj.label());
                None
            }
        };
        let id = match &obj.id {
            Some(serde_json::Value::String(s)) => Some(Id::String(s.clone())),
            Some(serde_json::Value::Number(n)) => Some(Id::Number(n.clone())),
            _ => None,
        };
        Feature {
            bbox: None,
            geometry,
            id,
            properties: Some(obj.properties.clone().unwrap_or_default()),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUANTIZED: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.5, 0.25], "translate": [10, 20]},
        "arcs": [
            [[0, 0], [4, 0], [0, 4]],
            [[4, 4], [-4, 0], [0, -4]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "properties": {"name": "Square"}, "id": "SQ"},
                    {"type": "Point", "coordinates": [2, 4], "properties": {"name": "Dot"}, "id": 7},
                    {"type": "LineString", "arcs": [-1]}
                ]
            }
        }
    }"#;

    fn topology(json: &str) -> Topology {
        let mut bytes = json.as_bytes().to_vec();
        Topology::from_slice(&mut bytes).unwrap()
    }

    #[test]
    fn test_polygon_stitches_arcs() {
        let features = topology(QUANTIZED).features("countries").unwrap();
        assert_eq!(features.len(), 3);

        let ring = match &features[0].geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings[0].clone(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            ring,
            vec![
                vec![10.0, 20.0],
                vec![12.0, 20.0],
                vec![12.0, 21.0],
                vec![10.0, 21.0],
                vec![10.0, 20.0],
            ]
        );
        assert_eq!(features[0].id, Some(Id::String("SQ".to_string())));
        let name = features[0].properties.as_ref().and_then(|p| p.get("name")).and_then(|v| v.as_str());
        assert_eq!(name, Some("Square"));
    }

    #[test]
    fn test_point_is_quantized_not_delta() {
        let features = topology(QUANTIZED).features("countries").unwrap();
        assert_eq!(features[1].geometry.as_ref().unwrap().value, Value::Point(vec![11.0, 21.0]));
        assert!(matches!(features[1].id, Some(Id::Number(_))));
    }

    #[test]
    fn test_negative_arc_is_reversed() {
        let features = topology(QUANTIZED).features("countries").unwrap();
        assert_eq!(
            features[2].geometry.as_ref().unwrap().value,
            Value::LineString(vec![vec![12.0, 21.0], vec![12.0, 20.0], vec![10.0, 20.0]])
        );
    }

    #[test]
    fn test_unquantized_arcs() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0.5, 0.5], [1.5, 0.5]]],
            "objects": {"line": {"type": "LineString", "arcs": [0]}}
        }"#;
        let features = topology(json).features("line").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].geometry.as_ref().unwrap().value,
            Value::LineString(vec![vec![0.5, 0.5], vec![1.5, 0.5]])
        );
    }

    #[test]
    fn test_missing_object() {
        assert!(topology(QUANTIZED).features("land").is_err());
    }

    fn name(feature: &Feature) -> Option<&str> {
        feature.properties.as_ref()?.get("name")?.as_str()
    }

    #[test]
    fn test_arc_out_of_range() {
        let json = r#"{"type": "Topology", "arcs": [], "objects": {"x": {"type": "LineString", "arcs": [3], "id": "X"}}}"#;
        let features = topology(json).features("x").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].geometry, None);
        assert_eq!(features[0].id, Some(Id::String("X".to_string())));
    }

    #[test]
    fn test_null_type_keeps_properties() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            "objects": {
                "countries": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "arcs": [[0]], "properties": {"name": "Wedge"}},
                        {"type": null, "properties": {"name": "Ghost"}},
                        {"properties": {"name": "Untyped"}},
                        {"type": "Circle", "properties": {"name": "Odd"}}
                    ]
                }
            }
        }"#;
        let features = topology(json).features("countries").unwrap();
        let names: Vec<_> = features.iter().map(name).collect();
        assert_eq!(names, vec![Some("Wedge"), Some("Ghost"), Some("Untyped"), Some("Odd")]);
        assert!(matches!(
            features[0].geometry.as_ref().map(|g| &g.value),
            Some(Value::Polygon(_))
        ));
        for f in &features[1..] {
            assert_eq!(f.geometry, None);
        }
    }

    #[test]
    fn test_bad_arc_only_drops_its_own_geometry() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 0.25], "translate": [10, 20]},
            "arcs": [
                [[0, 0], [4, 0], [0, 4]],
                [[4, 4], [-4, 0], [0, -4]]
            ],
            "objects": {
                "countries": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "arcs": [[0, 1]], "properties": {"name": "Square"}},
                        {"type": "MultiPolygon", "arcs": [[[0, 9]]], "properties": {"name": "Broken"}, "id": 4},
                        {"type": "Polygon", "arcs": "not arcs", "properties": {"name": "Garbled"}},
                        {"type": "LineString", "arcs": [-2], "properties": {"name": "Edge"}}
                    ]
                }
            }
        }"#;
        let features = topology(json).features("countries").unwrap();
        assert_eq!(features.len(), 4);
        assert!(features[0].geometry.is_some());
        assert_eq!(features[1].geometry, None);
        assert_eq!(name(&features[1]), Some("Broken"));
        assert!(matches!(features[1].id, Some(Id::Number(_))));
        assert_eq!(features[2].geometry, None);
        assert_eq!(name(&features[2]), Some("Garbled"));
        assert!(features[3].geometry.is_some());
    }

    #[test]
    fn test_collection_geometry_skips_null_members() {
        let json = r#"{
            "type": "Topology",
            "objects": {"pins": {"type": "GeometryCollection", "geometries": [
                {"type": "GeometryCollection", "geometries": [
                    {"type": "Point", "coordinates": [1, 2]},
                    {"type": null}
                ]}
            ]}}
        }"#;
        let features = topology(json).features("pins").unwrap();
        assert_eq!(
            features[0].geometry.as_ref().unwrap().value,
            Value::GeometryCollection(vec![Geometry::new(Value::Point(vec![1.0, 2.0]))])
        );
    }

    #[test]
    fn test_invalid_json() {
        let mut bytes = b"{not json".to_vec();
        assert!(Topology::from_slice(&mut bytes).is_err());
    }
}
