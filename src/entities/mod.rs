//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod certificate;
pub mod field_definition;
pub mod land;

// Re-export specific types to avoid conflicts
pub use certificate::{
    Column as CertificateColumn, Entity as Certificate, Model as CertificateModel,
};
pub use field_definition::{
    Column as FieldDefinitionColumn, Entity as FieldDefinition, FieldType,
    Model as FieldDefinitionModel,
};
pub use land::{Column as LandColumn, Entity as Land, Model as LandModel};
