//! Certificate entity - Metadata for a certificate document attached to a land record.
//! The binary content lives in a document store; this row only holds its location.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Certificate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    /// Unique identifier for the certificate
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning land record
    pub land_id: i64,
    /// Certificate number as printed on the document
    pub certificate_number: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Location of the content inside the document store
    pub file_path: String,
    /// Display file name: the sanitized certificate number plus extension
    pub file_name: String,
    /// MIME type of the content
    pub file_type: String,
    /// Content size in bytes
    pub file_size: i64,
    /// When the certificate was created
    pub created_at: DateTimeUtc,
    /// When the certificate was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Certificate and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each certificate belongs to one land record and goes with it
    #[sea_orm(
        belongs_to = "super::land::Entity",
        from = "Column::LandId",
        to = "super::land::Column::Id",
        on_delete = "Cascade"
    )]
    Land,
}

impl Related<super::land::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Land.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
