use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::IdentifierConfig;
use crate::errors::ServiceError;
use crate::repositories::{AssetStore, NewAssetRecord};
use crate::tags::{AssetTag, TagGenerator, TagSettings};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterAssetRequest {
    pub location_id: Uuid,
    #[validate(length(min = 1, max = 255), custom = "validate_asset_name")]
    pub name: String,
}

fn validate_asset_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank_asset_name"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredAsset {
    pub id: Uuid,
    pub tag: AssetTag,
    /// Insert attempts it took, 1 when no collision occurred.
    pub attempts: u32,
}

/// Registers assets under freshly generated tags.
///
/// The tag sequence comes from counting the tags already stored under the
/// category prefix, which two concurrent callers may read identically. The
/// store's unique constraint rejects the loser, who recounts and tries again.
#[derive(Clone)]
pub struct AssetTagService {
    store: Arc<dyn AssetStore>,
    generator: TagGenerator,
    max_attempts: u32,
}

impl AssetTagService {
    pub fn new(store: Arc<dyn AssetStore>, generator: TagGenerator, max_attempts: u32) -> Self {
        Self {
            store,
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn AssetStore>, cfg: &IdentifierConfig) -> Self {
        Self::new(
            store,
            TagGenerator::new(TagSettings::from(cfg)),
            cfg.max_insert_attempts,
        )
    }

    pub fn generator(&self) -> &TagGenerator {
        &self.generator
    }

    /// Tag an asset would receive given how many tags already share its prefix.
    pub fn preview_tag(
        &self,
        asset_name: &str,
        floor_name: &str,
        location_name: &str,
        existing_tag_count: u64,
    ) -> AssetTag {
        self.generator
            .generate(asset_name, floor_name, location_name, existing_tag_count)
    }

    #[instrument(skip(self, request), fields(location_id = %request.location_id))]
    pub async fn register_asset(
        &self,
        request: RegisterAssetRequest,
    ) -> Result<RegisteredAsset, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        let placement = self
            .store
            .resolve_location(request.location_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("location {}", request.location_id)))?;

        let prefix = self.generator.category_prefix(&name);
        let count_prefix = TagGenerator::count_prefix(prefix);
        let id = Uuid::new_v4();

        for attempt in 1..=self.max_attempts {
            let existing = self.store.count_tags_with_prefix(&count_prefix).await?;
            let tag = self.generator.generate(
                &name,
                &placement.floor_name,
                &placement.location_name,
                existing,
            );

            let record = NewAssetRecord {
                id,
                location_id: placement.location_id,
                name: name.clone(),
                tag: tag.clone(),
            };

            match self.store.insert_asset(record).await {
                Ok(()) => {
                    counter!("facility_codes.asset_tags.allocated", 1);
                    info!(%tag, attempt, "Asset tag allocated");
                    return Ok(RegisteredAsset {
                        id,
                        tag,
                        attempts: attempt,
                    });
                }
                Err(err) if err.is_duplicate() => {
                    counter!("facility_codes.asset_tags.collisions", 1);
                    warn!(%tag, attempt, "Asset tag already taken; recounting");
                }
                Err(err) => return Err(err),
            }
        }

        error!(
            prefix,
            attempts = self.max_attempts,
            "Asset tag allocation kept colliding"
        );
        Err(ServiceError::Conflict(format!(
            "could not allocate a unique {} tag after {} attempts",
            prefix, self.max_attempts
        )))
    }
}
