//! Common repository traits
//!
//! This module defines generic interfaces for document store operations.

use super::StoreError;

/// Trait for creating new documents in the store
///
/// # Type Parameters
/// * `Entity` - Type of the returned entity (with ID and timestamps assigned by the store)
/// * `CreateDTO` - DTO for creation (without ID, will be automatically generated)
pub trait Create<Entity, CreateDTO> {
    /// Creates a new document
    ///
    /// # Returns
    /// * `Ok(Entity)` - Created entity with ID assigned by the store
    /// * `Err(StoreError)` - Error during insertion
    async fn create(&self, data: &CreateDTO) -> Result<Entity, StoreError>;
}

/// Trait for reading a single document by key
///
/// # Type Parameters
/// * `Entity` - Type of the entity to read
/// * `Id` - Type of the key (e.g. `String`, `(String, String)` for sub-collections)
pub trait Read<Entity, Id> {
    /// # Returns
    /// * `Ok(Some(Entity))` - Entity found
    /// * `Ok(None)` - No entity with that key
    /// * `Err(StoreError)` - Error during reading
    async fn read(&self, id: &Id) -> Result<Option<Entity>, StoreError>;
}

/// Trait for reading multiple documents by list of keys
pub trait ReadMany<Entity, Id> {
    /// Reads the documents that exist among `ids`; missing keys are skipped.
    ///
    /// # Note
    /// Entities are returned in the order of `ids`.
    async fn read_many(&self, ids: &[Id]) -> Result<Vec<Entity>, StoreError>;
}

/// Trait for patching existing documents
///
/// # Type Parameters
/// * `Entity` - Type of the updated entity
/// * `UpdateDTO` - DTO for updating (only the fields it carries are modified)
/// * `Id` - Type of the key
pub trait Update<Entity, UpdateDTO, Id> {
    /// # Returns
    /// * `Ok(Entity)` - Updated entity
    /// * `Err(StoreError)` - Error during update (e.g. entity not found)
    async fn update(&self, id: &Id, data: &UpdateDTO) -> Result<Entity, StoreError>;
}

/// Trait for deleting documents
pub trait Delete<Id> {
    /// # Returns
    /// * `Ok(())` - Deletion successful (also when the document was already gone)
    /// * `Err(StoreError)` - Error during deletion
    async fn delete(&self, id: &Id) -> Result<(), StoreError>;
}
