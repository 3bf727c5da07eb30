//! Geometry, feature and feature collection expression builders.

use serde_json::Value;

use super::filter::Filter;
use super::graph::{function_def, Expr};
use super::image::{collection_filter, collection_map, element_get, element_set};

/// Remote geometry expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry(Expr);

impl Geometry {
    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    /// Geodesic-free lon/lat rectangle `(west, south, east, north)`.
    pub fn bbox(west: f64, south: f64, east: f64, north: f64) -> Self {
        let coords = Value::from(vec![
            Value::from(vec![west, north]),
            Value::from(vec![west, south]),
            Value::from(vec![east, south]),
            Value::from(vec![east, north]),
            Value::from(vec![west, north]),
        ]);
        Self(
            Expr::call("GeometryConstructors.Polygon")
                .arg("coordinates", Expr::constant(Value::from(vec![coords])))
                .arg("geodesic", false)
                .build(),
        )
    }

    /// Expands the geometry outward by `distance` metres.
    pub fn buffer(&self, distance: f64) -> Geometry {
        Geometry(
            Expr::call("Geometry.buffer")
                .arg("geometry", self.0.clone())
                .arg("distance", distance)
                .build(),
        )
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

/// Remote feature expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature(Expr);

impl Feature {
    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    /// Builds a feature with no geometry from a property dictionary.
    pub fn without_geometry(properties: Expr) -> Self {
        Self(
            Expr::call("Feature")
                .arg("geometry", Expr::constant(Value::Null))
                .arg("metadata", properties)
                .build(),
        )
    }

    pub fn geometry(&self) -> Geometry {
        Geometry(
            Expr::call("Feature.geometry")
                .arg("feature", self.0.clone())
                .build(),
        )
    }

    /// The same feature with its geometry buffered by `distance` metres.
    pub fn buffer(&self, distance: f64) -> Feature {
        Feature(
            Expr::call("Feature.buffer")
                .arg("feature", self.0.clone())
                .arg("distance", distance)
                .build(),
        )
    }

    pub fn get(&self, property: &str) -> Expr {
        element_get(&self.0, property)
    }

    pub fn set(&self, key: &str, value: impl Into<Expr>) -> Feature {
        Feature(element_set(&self.0, key, value.into()))
    }

    /// Keeps only `properties`, renaming them to `names` in order.
    pub fn select_as(&self, properties: &[&str], names: &[&str]) -> Feature {
        Feature(
            Expr::call("Feature.select")
                .arg("input", self.0.clone())
                .arg("propertySelectors", Expr::strings(properties.iter().copied()))
                .arg("newProperties", Expr::strings(names.iter().copied()))
                .arg("retainGeometry", false)
                .build(),
        )
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

/// Remote feature collection expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection(Expr);

impl FeatureCollection {
    /// Loads a table asset.
    pub fn load(asset_id: &str) -> Self {
        Self(
            Expr::call("Collection.loadTable")
                .arg("tableId", asset_id)
                .build(),
        )
    }

    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn filter(&self, filter: &Filter) -> FeatureCollection {
        FeatureCollection(collection_filter(&self.0, filter))
    }

    pub fn map(&self, f: impl FnOnce(Feature) -> Feature) -> FeatureCollection {
        let def = function_def(|arg| f(Feature(arg)).into_expr());
        FeatureCollection(collection_map(&self.0, def))
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_ring_is_closed() {
        let g = Geometry::bbox(-105.89218, 40.417183, -105.140642, 40.72316);
        match g.expr() {
            Expr::Invocation { function, args } => {
                assert_eq!(function, "GeometryConstructors.Polygon");
                let Expr::Constant(coords) = &args["coordinates"] else {
                    panic!("coordinates should be constant");
                };
                let ring = coords[0].as_array().unwrap();
                assert_eq!(ring.len(), 5);
                assert_eq!(ring[0], ring[4]);
            }
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn test_buffer_wraps_feature_geometry() {
        let f = Feature::from_expr(Expr::ArgumentRef("f".into()));
        let g = f.geometry().buffer(1000.0);
        match g.expr() {
            Expr::Invocation { function, args } => {
                assert_eq!(function, "Geometry.buffer");
                assert_eq!(args["distance"], Expr::constant(1000.0));
            }
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn test_feature_without_geometry_has_null_geometry() {
        let f = Feature::without_geometry(Expr::Dictionary(Default::default()));
        match f.expr() {
            Expr::Invocation { function, args } => {
                assert_eq!(function, "Feature");
                assert_eq!(args["geometry"], Expr::Constant(Value::Null));
            }
            _ => panic!("Expected invocation"),
        }
    }
}
