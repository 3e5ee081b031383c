use drdocer_shared::{EntityName, EntityType, Result};

/// Destination for rendered documents.
pub trait DocumentStorage {
    /// Persist one rendered document.
    fn store_document(
        &mut self,
        name: &EntityName,
        entity_type: &EntityType,
        document: &[u8],
    ) -> Result<()>;

    /// Called once after the last document of a run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: DocumentStorage + ?Sized> DocumentStorage for Box<D> {
    fn store_document(
        &mut self,
        name: &EntityName,
        entity_type: &EntityType,
        document: &[u8],
    ) -> Result<()> {
        (**self).store_document(name, entity_type, document)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
