//! Feature layer field names and REST defaults

/// Layer field holding the survey date
pub const DATE_FIELD: &str = "date_1";
/// Layer field holding the region (oblast)
pub const REGION_FIELD: &str = "Область";
pub const CITY_FIELD: &str = "city";
pub const LONG_FIELD: &str = "long";
pub const LAT_FIELD: &str = "lat";

/// Prefix of per-category indicator fields (`value_1`, `value_2`, ...)
pub const INDICATOR_PREFIX: &str = "value_";

/// WGS 84
pub const DEFAULT_WKID: u32 = 4326;

/// Filter matching every record
pub const ALL_RECORDS: &str = "1=1";

/// Field type ArcGIS uses for the object id column
pub const OID_FIELD_TYPE: &str = "esriFieldTypeOID";

/// Lifetime requested for generated tokens, in minutes
pub const TOKEN_EXPIRATION_MINUTES: u32 = 60;
