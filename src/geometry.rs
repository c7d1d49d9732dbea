//! Bounding box normalization and centroid
//!
//! A feature-root `bbox` is `[latMin, lngMin, latMax, lngMax]`. Without one,
//! the geometry-level `bbox` is used; that one is GeoJSON order
//! `[lngMin, latMin, lngMax, latMax]` and is swapped to latitude-first when its
//! first element is below 1 (a western-hemisphere longitude).

use crate::error::ScoringError;
use crate::utils::round_to;
use serde::Serialize;
use serde_json::Value;

const CENTROID_DECIMALS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedGeometry {
    /// `[latMin, lngMin, latMax, lngMax]`
    pub bbox: [f64; 4],
    /// `[lat, lng]`, rounded to 5 decimals
    pub centroid: [f64; 2],
}

pub struct GeometryNormalizer;

impl GeometryNormalizer {
    pub fn normalize(feature: &Value) -> Result<NormalizedGeometry, ScoringError> {
        let bbox = match feature.get("bbox").filter(|b| !b.is_null()) {
            Some(root) => parse_bbox(root)?,
            None => {
                let geometry_bbox = feature
                    .get("geometry")
                    .and_then(|g| g.get("bbox"))
                    .filter(|b| !b.is_null())
                    .ok_or_else(|| invalid("feature has no bbox"))?;
                let b = parse_bbox(geometry_bbox)?;
                if b[0] < 1.0 {
                    [b[1], b[0], b[3], b[2]]
                } else {
                    b
                }
            }
        };

        Ok(NormalizedGeometry {
            bbox,
            centroid: centroid(&bbox),
        })
    }
}

fn centroid(bbox: &[f64; 4]) -> [f64; 2] {
    let (lat_a, lng_a, lat_b, lng_b) = (bbox[0], bbox[1], bbox[2], bbox[3]);
    [
        round_to((lat_a + lat_b) / 2.0, CENTROID_DECIMALS),
        round_to((lng_a + lng_b) / 2.0, CENTROID_DECIMALS),
    ]
}

fn parse_bbox(value: &Value) -> Result<[f64; 4], ScoringError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(format!("bbox is not an array: {}", value)))?;
    if items.len() != 4 {
        return Err(invalid(format!("bbox has {} elements, expected 4", items.len())));
    }
    let mut bbox = [0.0; 4];
    for (slot, item) in bbox.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(format!("bbox element is not a number: {}", item)))?;
    }
    Ok(bbox)
}

fn invalid(reason: impl Into<String>) -> ScoringError {
    ScoringError::InvalidGeometry { reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_root_bbox_used_as_is() {
        let feature = json!({"bbox": [42.0, -93.7, 42.1, -93.6]});
        let g = GeometryNormalizer::normalize(&feature).unwrap();

        assert_eq!(g.bbox, [42.0, -93.7, 42.1, -93.6]);
        assert_relative_eq!(g.centroid[0], 42.05);
        assert_relative_eq!(g.centroid[1], -93.65);
    }

    #[test]
    fn test_geometry_bbox_reordered() {
        let feature = json!({"geometry": {"type": "Polygon", "bbox": [-93.7, 42.0, -93.6, 42.1]}});
        let g = GeometryNormalizer::normalize(&feature).unwrap();

        assert_eq!(g.bbox, [42.0, -93.7, 42.1, -93.6]);
        assert_relative_eq!(g.centroid[0], 42.05);
        assert_relative_eq!(g.centroid[1], -93.65);
    }

    #[test]
    fn test_geometry_bbox_positive_first_kept() {
        let feature = json!({"geometry": {"bbox": [42.0, 10.0, 42.2, 10.2]}});
        let g = GeometryNormalizer::normalize(&feature).unwrap();
        assert_eq!(g.bbox, [42.0, 10.0, 42.2, 10.2]);
    }

    #[test]
    fn test_centroid_rounded_to_five_places() {
        let feature = json!({"bbox": [41.123451, -93.123451, 41.123461, -93.123461]});
        let g = GeometryNormalizer::normalize(&feature).unwrap();
        assert_relative_eq!(g.centroid[0], 41.12346);
        assert_relative_eq!(g.centroid[1], -93.12346);
    }

    #[test]
    fn test_invalid_bbox() {
        for feature in [
            json!({"properties": {}}),
            json!({"bbox": [1.0, 2.0, 3.0]}),
            json!({"bbox": "42,-93"}),
            json!({"geometry": {"bbox": [-93.7, "x", -93.6, 42.1]}}),
        ] {
            assert!(matches!(
                GeometryNormalizer::normalize(&feature),
                Err(ScoringError::InvalidGeometry { .. })
            ));
        }
    }
}
