//! Land entity - A registered parcel of land.
//!
//! Fixed administrative columns sit next to three JSON columns: the polygon
//! (`coordinates`), the centroid (`coordinate`) and the schemaless attribute bag
//! (`additional_data`) that only the application interprets against the current
//! field definitions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Land database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lands")]
pub struct Model {
    /// Unique identifier for the land record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Administrative region code
    pub region_code: Option<String>,
    /// District (kecamatan)
    pub district: Option<String>,
    /// Village (kelurahan)
    pub village: Option<String>,
    /// Type of land right (e.g. "HM", "HGB")
    pub rights_type: Option<String>,
    /// Registration year
    pub year: Option<i32>,
    /// Parcel identification number
    pub parcel_number: Option<String>,
    /// Land use
    pub land_use: Option<String>,
    /// Rights certificate number
    pub rights_number: Option<String>,
    /// Survey letter number
    pub survey_letter: Option<String>,
    /// Registered area in square metres
    pub area: Option<f64>,
    /// Registration product
    pub product: Option<String>,
    /// Area measured on the map in square metres
    pub map_area: Option<f64>,
    /// Map quality class
    pub quality_class: Option<String>,
    /// Owner as recorded on the rights document
    pub primary_owner: Option<String>,
    /// Owner as recorded on the deed
    pub secondary_owner: Option<String>,
    /// Polygon as a JSON array of `[longitude, latitude]` pairs
    pub coordinates: Option<Json>,
    /// Centroid as a JSON `[longitude, latitude]` pair
    pub coordinate: Option<Json>,
    /// Custom attribute bag keyed by field definition key
    pub additional_data: Json,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Land and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One land record has many certificates
    #[sea_orm(has_many = "super::certificate::Entity")]
    Certificates,
}

impl Related<super::certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
