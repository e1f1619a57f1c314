use crate::core::config::ThreadTableConfig;
use crate::modules::storage::StorageError;
use crate::shared::validation::SQL_IDENTIFIER_REGEX;

/// How the metadata column stores the JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    /// Native jsonb column
    Jsonb,
    /// TEXT column holding the serialized JSON string
    Text,
}

/// Total mapping of canonical thread fields onto an existing table: one
/// column per field, no more, no less. Names are interpolated into dynamic
/// SQL, so each must pass the identifier check before a store is built.
#[derive(Debug, Clone)]
pub struct ThreadTableMapping {
    pub table: String,
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub organization_id: String,
    pub tenant_id: String,
    pub metadata: String,
    pub created_at: String,
    pub updated_at: String,
    pub metadata_format: MetadataFormat,
}

impl ThreadTableMapping {
    /// The canonical layout created by the bundled migration
    #[cfg(test)]
    pub fn canonical() -> Self {
        Self {
            table: "threads".to_string(),
            id: "id".to_string(),
            title: "title".to_string(),
            user_id: "user_id".to_string(),
            organization_id: "organization_id".to_string(),
            tenant_id: "tenant_id".to_string(),
            metadata: "metadata".to_string(),
            created_at: "created_at".to_string(),
            updated_at: "updated_at".to_string(),
            metadata_format: MetadataFormat::Jsonb,
        }
    }

    pub fn from_config(config: &ThreadTableConfig) -> Result<Self, StorageError> {
        let metadata_format = match config.metadata_format.as_str() {
            "text" => MetadataFormat::Text,
            _ => MetadataFormat::Jsonb,
        };

        let mapping = Self {
            table: config.table.clone(),
            id: config.id_column.clone(),
            title: config.title_column.clone(),
            user_id: config.user_id_column.clone(),
            organization_id: config.organization_id_column.clone(),
            tenant_id: config.tenant_id_column.clone(),
            metadata: config.metadata_column.clone(),
            created_at: config.created_at_column.clone(),
            updated_at: config.updated_at_column.clone(),
            metadata_format,
        };

        mapping.validate()?;
        Ok(mapping)
    }

    /// Reject any name that is unsafe to interpolate into SQL
    pub fn validate(&self) -> Result<(), StorageError> {
        for name in [
            &self.table,
            &self.id,
            &self.title,
            &self.user_id,
            &self.organization_id,
            &self.tenant_id,
            &self.metadata,
            &self.created_at,
            &self.updated_at,
        ] {
            if !SQL_IDENTIFIER_REGEX.is_match(name) {
                return Err(StorageError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(())
    }
}
