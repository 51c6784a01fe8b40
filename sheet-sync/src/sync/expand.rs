//! Row expansion and add/update classification
//!
//! Each sheet row carries counts for a set of categories. A row becomes as many
//! point features as its largest count; feature `n` has indicator `1` for every
//! category whose count is greater than `n`. So for counts `{A: 2, B: 5}` the row
//! yields five features, `A` is set on the first two and `B` on all five.
//!
//! All features of a row are updates when the row's composite key is already in
//! the layer (they all carry the single matched object id), otherwise adds.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use super::index::{CompositeKey, RemoteIndex};
use crate::arcgis::constants::{
    CITY_FIELD, DATE_FIELD, INDICATOR_PREFIX, LAT_FIELD, LONG_FIELD, REGION_FIELD,
};
use crate::arcgis::{Feature, PointGeometry};
use crate::config::SheetFormat;
use crate::error::{Result, SyncError};
use crate::spreadsheet::{Cell, Dataset, Row};

/// Internal field names every sheet format must define
const BASE_FIELDS: [&str; 5] = ["date", "region", "city", "long", "lat"];

/// Largest count a single category cell may hold; each unit becomes a feature
pub const MAX_CATEGORY_COUNT: i64 = 100_000;

/// A category count column and the indicator attribute it drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryColumn {
    pub header: String,
    pub attribute: String,
}

impl CategoryColumn {
    /// Indicator attribute is `value_` + the last whitespace-separated token of the header
    pub fn from_header(header: impl Into<String>) -> Self {
        let header = header.into();
        let suffix = header.split_whitespace().last().unwrap_or(header.as_str());
        let attribute = format!("{}{}", INDICATOR_PREFIX, suffix);
        Self { header, attribute }
    }
}

/// Where each value lives in a sheet row
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub date: String,
    pub region: String,
    pub city: String,
    pub long: String,
    pub lat: String,
    pub categories: Vec<CategoryColumn>,
    pub wkid: u32,
}

impl RowLayout {
    /// Derive the layout from a sheet format
    ///
    /// The five base fields are looked up by internal name; every other configured
    /// column is a category count column, in configured order.
    pub fn from_format(format: &SheetFormat, wkid: u32) -> Result<Self> {
        let header = |name: &str| {
            format.header_for(name).map(str::to_string).ok_or_else(|| {
                SyncError::Configuration(format!("sheet format is missing field '{}'", name))
            })
        };

        let categories: Vec<CategoryColumn> = format
            .fields()
            .iter()
            .filter(|f| !BASE_FIELDS.contains(&f.name.as_str()))
            .map(|f| CategoryColumn::from_header(f.header.as_str()))
            .collect();

        let mut seen = HashSet::new();
        for category in &categories {
            if category.header.trim().is_empty() {
                return Err(SyncError::Configuration(
                    "category column with an empty header".to_string(),
                ));
            }
            if !seen.insert(category.attribute.as_str()) {
                return Err(SyncError::Configuration(format!(
                    "category columns map to the same indicator '{}'",
                    category.attribute
                )));
            }
        }

        Ok(Self {
            date: header("date")?,
            region: header("region")?,
            city: header("city")?,
            long: header("long")?,
            lat: header("lat")?,
            categories,
            wkid,
        })
    }

    /// Composite key of a row
    pub fn key(&self, row: &Row<'_>) -> CompositeKey {
        CompositeKey::new(
            row.get(&self.date).to_string(),
            row.get(&self.region).to_string(),
            row.get(&self.city).to_string(),
        )
    }
}

/// Features to submit, split by action; `None` means nothing to submit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub adds: Option<Vec<Feature>>,
    pub updates: Option<Vec<Feature>>,
}

impl Expansion {
    pub fn add_count(&self) -> usize {
        self.adds.as_ref().map_or(0, Vec::len)
    }

    pub fn update_count(&self) -> usize {
        self.updates.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_none() && self.updates.is_none()
    }
}

/// Parse a decimal that may use a comma separator (`"30,52"` -> `30.52`)
///
/// `NaN` and infinities are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn parse_error(row: &Row<'_>, column: &str, cell: &Cell) -> SyncError {
    SyncError::Parse {
        row: row.index() + 1,
        column: column.to_string(),
        value: cell.to_string(),
    }
}

fn parse_coordinate(row: &Row<'_>, column: &str) -> Result<f64> {
    let cell = row.get(column);
    let value = match cell {
        Cell::Number(n) => Some(*n).filter(|n| n.is_finite()),
        Cell::Text(text) => parse_decimal(text),
        Cell::Empty => None,
    };
    value.ok_or_else(|| parse_error(row, column, cell))
}

fn parse_count(row: &Row<'_>, column: &str) -> Result<i64> {
    let cell = row.get(column);
    let value = match cell {
        Cell::Number(n)
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= MAX_CATEGORY_COUNT as f64 =>
        {
            Some(*n as i64)
        }
        Cell::Text(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    value
        .filter(|n| *n <= MAX_CATEGORY_COUNT)
        .ok_or_else(|| parse_error(row, column, cell))
}

/// Expand one row into its point features (unclassified)
///
/// A row whose counts are all zero or negative yields no features.
pub fn expand_row(row: &Row<'_>, layout: &RowLayout) -> Result<Vec<Feature>> {
    let long = parse_coordinate(row, &layout.long)?;
    let lat = parse_coordinate(row, &layout.lat)?;
    let geometry = PointGeometry::new(long, lat, layout.wkid);

    let key = layout.key(row);
    let mut base = Map::new();
    base.insert(DATE_FIELD.to_string(), json!(key.date));
    base.insert(REGION_FIELD.to_string(), json!(key.region));
    base.insert(CITY_FIELD.to_string(), json!(key.city));
    base.insert(LONG_FIELD.to_string(), json!(long));
    base.insert(LAT_FIELD.to_string(), json!(lat));

    // Only strictly positive counts take part; the rest stay at 0 throughout
    let mut counts = Vec::with_capacity(layout.categories.len());
    for category in &layout.categories {
        let count = parse_count(row, &category.header)?;
        counts.push(count.max(0));
    }

    let max_count = counts.iter().copied().max().unwrap_or(0);

    let features = (0..max_count)
        .map(|cnt| {
            let mut attributes = base.clone();
            for (category, count) in layout.categories.iter().zip(&counts) {
                let active = cnt < *count;
                attributes.insert(category.attribute.clone(), json!(i32::from(active)));
            }
            Feature::new(attributes, geometry.clone())
        })
        .collect();

    Ok(features)
}

/// Expand every row and classify the features against the remote index
pub fn expand(
    dataset: &Dataset,
    layout: &RowLayout,
    index: &RemoteIndex,
    object_id_field: &str,
) -> Result<Expansion> {
    let mut adds = Vec::new();
    let mut updates = Vec::new();

    for row in dataset.rows() {
        let features = expand_row(&row, layout)?;
        if features.is_empty() {
            log::debug!("Row {} has no positive counts, skipping", row.index() + 1);
            continue;
        }

        let key = layout.key(&row);
        match index.get(&key) {
            Some(id) => {
                log::debug!(
                    "Row {} {} -> {} update(s) of object {}",
                    row.index() + 1,
                    key,
                    features.len(),
                    id
                );
                updates.extend(features.into_iter().map(|mut feature| {
                    feature
                        .attributes
                        .insert(object_id_field.to_string(), Value::from(id));
                    feature
                }));
            }
            None => {
                log::debug!("Row {} {} -> {} add(s)", row.index() + 1, key, features.len());
                adds.extend(features);
            }
        }
    }

    Ok(Expansion {
        adds: Some(adds).filter(|f| !f.is_empty()),
        updates: Some(updates).filter(|f| !f.is_empty()),
    })
}
