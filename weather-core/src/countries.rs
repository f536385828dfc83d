//! Country lookup by point-in-polygon against a fixed set of boundaries.
//!
//! The index is loaded once, then only read. It is `Send + Sync` and meant to
//! be shared behind an `Arc` by every request.

use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use shapefile::{
    Shape,
    dbase::{FieldValue, Record},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::Coordinate;

#[derive(Debug, Error)]
pub enum GeoIndexError {
    #[error("failed to read country boundaries from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: shapefile::Error,
    },

    #[error("record {index} in {path} has no `{field}` attribute")]
    MissingName {
        path: PathBuf,
        index: usize,
        field: String,
    },

    #[error("no polygon records found in {0}")]
    Empty(PathBuf),
}

/// One country boundary.
#[derive(Debug, Clone)]
pub struct CountryPolygon {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl CountryPolygon {
    pub fn new(name: impl Into<String>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        let geometry = geometry.into();
        let bbox = geometry.bounding_rect();
        Self {
            name: name.into(),
            geometry,
            bbox,
        }
    }

    fn contains(&self, point: &Point<f64>) -> bool {
        let Some(bbox) = self.bbox else {
            return false;
        };
        let (min, max) = (bbox.min(), bbox.max());
        if point.x() < min.x || point.x() > max.x || point.y() < min.y || point.y() > max.y {
            return false;
        }

        self.geometry.contains(point)
    }
}

/// In-memory country boundaries, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    records: Vec<CountryPolygon>,
}

impl CountryIndex {
    /// Read every polygon record of a shapefile, naming each by `name_field`.
    ///
    /// Non-polygon shapes are skipped.
    pub fn load(path: impl AsRef<Path>, name_field: &str) -> Result<Self, GeoIndexError> {
        let path = path.as_ref();
        let shapes = shapefile::read(path).map_err(|source| GeoIndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut records = Vec::with_capacity(shapes.len());
        for (index, (shape, record)) in shapes.into_iter().enumerate() {
            let shape_type = shape.shapetype();
            let Some(geometry) = boundary(shape) else {
                warn!(index, shape = ?shape_type, "skipping non-polygon record");
                continue;
            };

            let name = country_name(&record, name_field).ok_or_else(|| {
                GeoIndexError::MissingName {
                    path: path.to_path_buf(),
                    index,
                    field: name_field.to_string(),
                }
            })?;

            records.push(CountryPolygon::new(name, geometry));
        }

        if records.is_empty() {
            return Err(GeoIndexError::Empty(path.to_path_buf()));
        }

        info!(countries = records.len(), path = %path.display(), "loaded country boundaries");
        Ok(Self { records })
    }

    /// Build an index from already constructed boundaries.
    pub fn from_records(records: impl IntoIterator<Item = CountryPolygon>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Name of the first boundary, in load order, that contains the coordinate.
    ///
    /// Points exactly on a boundary line are not contained.
    pub fn country_at(&self, coordinate: Coordinate) -> Option<&str> {
        let point = Point::new(coordinate.longitude, coordinate.latitude);

        let found = self
            .records
            .iter()
            .find(|record| record.contains(&point))
            .map(|record| record.name.as_str());

        debug!(
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            country = found,
            "country lookup"
        );
        found
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Polygon shapes of any flavour; M and Z values are dropped.
fn boundary(shape: Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Some(polygon.into()),
        Shape::PolygonM(polygon) => Some(polygon.into()),
        Shape::PolygonZ(polygon) => Some(polygon.into()),
        _ => None,
    }
}

fn country_name(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::Character(Some(name)) => {
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use shapefile::{
        PolygonRing,
        dbase::{FieldName, TableWriterBuilder},
    };

    fn square(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> CountryPolygon {
        CountryPolygon::new(
            name,
            polygon![
                (x: x0, y: y0),
                (x: x1, y: y0),
                (x: x1, y: y1),
                (x: x0, y: y1),
                (x: x0, y: y0),
            ],
        )
    }

    /// Rough outline of Israel, (lon, lat).
    fn israel() -> CountryPolygon {
        CountryPolygon::new(
            "Israel",
            polygon![
                (x: 34.27, y: 31.22),
                (x: 34.90, y: 29.49),
                (x: 35.02, y: 29.50),
                (x: 35.50, y: 31.50),
                (x: 35.60, y: 33.28),
                (x: 35.10, y: 33.09),
                (x: 34.27, y: 31.22),
            ],
        )
    }

    #[test]
    fn point_inside_polygon_resolves_name() {
        let index = CountryIndex::from_records([israel(), square("Elsewhere", 0.0, 0.0, 1.0, 1.0)]);

        // Holon
        assert_eq!(index.country_at(Coordinate::new(32.0167, 34.7667)), Some("Israel"));
        assert_eq!(index.country_at(Coordinate::new(0.5, 0.5)), Some("Elsewhere"));
    }

    #[test]
    fn point_at_sea_resolves_nothing() {
        let index = CountryIndex::from_records([israel()]);

        // Mediterranean, west of the coast.
        assert_eq!(index.country_at(Coordinate::new(32.0, 33.5)), None);
    }

    #[test]
    fn latitude_and_longitude_are_not_swapped() {
        let index = CountryIndex::from_records([square("Wide", 10.0, 0.0, 20.0, 5.0)]);

        assert_eq!(index.country_at(Coordinate::new(2.0, 15.0)), Some("Wide"));
        assert_eq!(index.country_at(Coordinate::new(15.0, 2.0)), None);
    }

    #[test]
    fn overlapping_polygons_return_first_loaded() {
        let index = CountryIndex::from_records([
            square("First", 0.0, 0.0, 10.0, 10.0),
            square("Second", 5.0, 5.0, 15.0, 15.0),
        ]);

        assert_eq!(index.country_at(Coordinate::new(7.0, 7.0)), Some("First"));
        assert_eq!(index.country_at(Coordinate::new(12.0, 12.0)), Some("Second"));
    }

    #[test]
    fn boundary_point_is_not_contained() {
        let index = CountryIndex::from_records([square("Edge", 0.0, 0.0, 10.0, 10.0)]);

        assert_eq!(index.country_at(Coordinate::new(0.0, 5.0)), None);
    }

    #[test]
    fn point_in_hole_is_not_contained() {
        let ring = CountryPolygon::new(
            "Ring",
            polygon!(
                exterior: [
                    (x: 0.0, y: 0.0),
                    (x: 10.0, y: 0.0),
                    (x: 10.0, y: 10.0),
                    (x: 0.0, y: 10.0),
                    (x: 0.0, y: 0.0),
                ],
                interiors: [
                    [
                        (x: 4.0, y: 4.0),
                        (x: 6.0, y: 4.0),
                        (x: 6.0, y: 6.0),
                        (x: 4.0, y: 6.0),
                        (x: 4.0, y: 4.0),
                    ],
                ],
            ),
        );
        let index = CountryIndex::from_records([ring]);

        assert_eq!(index.country_at(Coordinate::new(5.0, 5.0)), None);
        assert_eq!(index.country_at(Coordinate::new(2.0, 2.0)), Some("Ring"));
    }

    #[test]
    fn empty_index_resolves_nothing() {
        let index = CountryIndex::default();

        assert!(index.is_empty());
        assert_eq!(index.country_at(Coordinate::new(0.0, 0.0)), None);
    }

    // Same outline as `israel()`, as shapefile points.
    fn israel_ring() -> Vec<(f64, f64)> {
        vec![
            (34.27, 31.22),
            (34.90, 29.49),
            (35.02, 29.50),
            (35.50, 31.50),
            (35.60, 33.28),
            (35.10, 33.09),
            (34.27, 31.22),
        ]
    }

    fn admin_table() -> TableWriterBuilder {
        TableWriterBuilder::new().add_character_field(FieldName::try_from("ADMIN").unwrap(), 50)
    }

    fn admin_record(name: &str) -> Record {
        let mut record = Record::default();
        record.insert(
            "ADMIN".to_string(),
            FieldValue::Character(Some(name.to_string())),
        );
        record
    }

    fn write_countries(path: &Path) {
        let israel = shapefile::Polygon::new(PolygonRing::Outer(
            israel_ring()
                .into_iter()
                .map(|(x, y)| shapefile::Point::new(x, y))
                .collect(),
        ));
        let square = shapefile::Polygon::new(PolygonRing::Outer(vec![
            shapefile::Point::new(0.0, 0.0),
            shapefile::Point::new(0.0, 1.0),
            shapefile::Point::new(1.0, 1.0),
            shapefile::Point::new(1.0, 0.0),
            shapefile::Point::new(0.0, 0.0),
        ]));

        let mut writer = shapefile::Writer::from_path(path, admin_table()).unwrap();
        writer
            .write_shape_and_record(&israel, &admin_record("Israel"))
            .unwrap();
        writer
            .write_shape_and_record(&square, &admin_record("Elsewhere"))
            .unwrap();
    }

    #[test]
    fn load_reads_polygons_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.shp");
        write_countries(&path);

        let index = CountryIndex::load(&path, "ADMIN").unwrap();

        assert_eq!(index.len(), 2);
        // Holon
        assert_eq!(index.country_at(Coordinate::new(32.0167, 34.7667)), Some("Israel"));
        assert_eq!(index.country_at(Coordinate::new(0.5, 0.5)), Some("Elsewhere"));
        assert_eq!(index.country_at(Coordinate::new(32.0, 33.5)), None);
    }

    #[test]
    fn load_with_unknown_name_field_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.shp");
        write_countries(&path);

        let err = CountryIndex::load(&path, "NAME").unwrap_err();
        match err {
            GeoIndexError::MissingName { index, field, .. } => {
                assert_eq!(index, 0);
                assert_eq!(field, "NAME");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_of_points_only_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.shp");
        {
            let mut writer = shapefile::Writer::from_path(&path, admin_table()).unwrap();
            writer
                .write_shape_and_record(&shapefile::Point::new(34.77, 32.02), &admin_record("Holon"))
                .unwrap();
        }

        let err = CountryIndex::load(&path, "ADMIN").unwrap_err();
        assert!(matches!(err, GeoIndexError::Empty(_)));
    }

    #[test]
    fn measured_and_3d_polygons_are_boundaries() {
        let m = shapefile::PolygonM::new(PolygonRing::Outer(
            israel_ring()
                .into_iter()
                .map(|(x, y)| shapefile::PointM::new(x, y, 0.0))
                .collect(),
        ));
        let z = shapefile::PolygonZ::new(PolygonRing::Outer(
            israel_ring()
                .into_iter()
                .map(|(x, y)| shapefile::PointZ::new(x, y, 120.0, 0.0))
                .collect(),
        ));

        let index = CountryIndex::from_records([
            CountryPolygon::new("Measured", boundary(Shape::PolygonM(m)).unwrap()),
            CountryPolygon::new("Elevated", boundary(Shape::PolygonZ(z)).unwrap()),
        ]);

        assert_eq!(index.country_at(Coordinate::new(32.0167, 34.7667)), Some("Measured"));
        assert!(boundary(Shape::Point(shapefile::Point::new(1.0, 2.0))).is_none());
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.shp");

        let err = CountryIndex::load(&path, "ADMIN").unwrap_err();
        assert!(matches!(err, GeoIndexError::Read { .. }));
        assert!(err.to_string().contains("missing.shp"));
    }
}
