use crate::boundary::BoundaryPolygon;
use crate::isochrone::PipelineResult;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

pub fn polygon_to_geojson(polygon: &BoundaryPolygon) -> GeoJson {
    let exterior_coords = polygon
        .closed_ring()
        .iter()
        .map(|coord| vec![coord.lng, coord.lat])
        .collect::<Vec<_>>();

    let geojson_polygon = Geometry::new(Value::Polygon(vec![exterior_coords]));

    GeoJson::Geometry(geojson_polygon)
}

// Convert polygon to GeoJSON string
pub fn polygon_to_geojson_string(polygon: &BoundaryPolygon) -> String {
    let geojson = polygon_to_geojson(polygon);
    geojson.to_string()
}

/// One polygon feature per island that has a boundary. Islands whose hull
/// failed are left out, so renderers only see drawable shapes.
pub fn result_to_geojson(result: &PipelineResult) -> GeoJson {
    let mut features = Vec::new();
    for band in &result.bands {
        for island in &band.islands {
            let Some(polygon) = island.polygon() else {
                continue;
            };
            let exterior_coords = polygon
                .closed_ring()
                .iter()
                .map(|coord| vec![coord.lng, coord.lat])
                .collect::<Vec<_>>();

            let mut properties = JsonObject::new();
            properties.insert("band".to_string(), band.band.0.into());
            properties.insert("cutoff_minutes".to_string(), band.cutoff_minutes.into());
            properties.insert("island".to_string(), island.label.0.into());
            properties.insert("point_count".to_string(), island.point_count.into());
            properties.insert("degenerate".to_string(), island.is_degenerate().into());

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![exterior_coords]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use crate::config::PipelineConfig;
    use crate::hull::HullType;
    use crate::isochrone::IslandPipeline;
    use crate::sample::Sample;

    #[test]
    fn test_feature_per_island() {
        let samples = vec![
            Sample::new(0.0, 0.0, 60.0),
            Sample::new(0.01, 0.0, 60.0),
            Sample::new(0.0, 0.01, 60.0),
            Sample::new(1.0, 1.0, 700.0),
        ];
        let mut config = PipelineConfig::new(vec![10, 20], 0.01);
        config.hull = HullType::Convex;
        let result = IslandPipeline::new(&config).unwrap().run(&samples, None).unwrap();

        let GeoJson::FeatureCollection(collection) = result_to_geojson(&result) else {
            panic!("expected a feature collection");
        };
        // band 1 has one island, band 2 adds an isolated point
        assert_eq!(collection.features.len(), 3);
        let last = &collection.features[2];
        assert_eq!(last.property("cutoff_minutes"), Some(&serde_json::json!(20)));
        assert_eq!(last.property("degenerate"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_polygon_ring_is_closed() {
        let polygon = BoundaryPolygon::from_polygon(&geo::polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ])
        .unwrap();
        let GeoJson::Geometry(geometry) = polygon_to_geojson(&polygon) else {
            panic!("expected a geometry");
        };
        let Value::Polygon(rings) = geometry.value else {
            panic!("expected a polygon");
        };
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0].first(), rings[0].last());
        assert!(polygon_to_geojson_string(&polygon).contains("\"Polygon\""));
    }
}
