//! Core business logic - framework-agnostic operations over the land registry.
//!
//! The custom-field schema lives in [`field`]; [`validation`], [`codec`] and [`render`]
//! each dispatch over [`crate::entities::FieldType`] in exactly one `match`, so adding a
//! type touches one place per concern.

/// Typed attribute bag stored in `lands.additional_data`
pub mod attributes;
/// Certificate metadata and the document store seam
pub mod certificate;
/// Flat form data and the attribute bag codec
pub mod codec;
/// Field definition store, reordering and seeding
pub mod field;
/// Land record create, update and delete
pub mod land;
/// Land listing, filtering and detail views
pub mod query;
/// Widget selection and display formatting per field type
pub mod render;
/// Dynamic and fixed-column validation rules
pub mod validation;
