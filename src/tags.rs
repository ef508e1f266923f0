//! Asset tag generation.
//!
//! A tag reads `{CategoryPrefix}-{FloorToken}-{LocationToken}-{Sequence}`,
//! e.g. `BBA-T-CASA-DE-BOMBAS-0007`. The sequence is derived from the number
//! of tags already stored under the same prefix, so the generated tag is only
//! a candidate: the store's unique constraint decides whether it sticks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::IdentifierConfig;
use crate::floors::FloorTokenRules;
use crate::text::{fold, normalize, SEPARATOR};

pub const DEFAULT_GENERIC_PREFIX: &str = "EQP";
pub const DEFAULT_LOCATION_TOKEN_MAX_LEN: usize = 15;
pub const DEFAULT_TAG_SEQUENCE_DIGITS: usize = 4;

/// Equipment keywords (already folded) and their tag prefixes.
///
/// Matching walks this table top to bottom and the first keyword found
/// anywhere in the folded asset name wins, so order is significant.
pub const CATEGORY_PREFIXES: &[(&str, &str)] = &[
    ("ESCADA-ROLANTE", "ESR"),
    ("ELEVADOR", "ELV"),
    ("QUADRO", "QDR"),
    ("PAINEL", "QDR"),
    ("BOMBA", "BBA"),
    ("GERADOR", "GER"),
    ("NOBREAK", "UPS"),
    ("TRANSFORMADOR", "TRF"),
    ("CHILLER", "CHL"),
    ("FANCOIL", "FCL"),
    ("SPLIT", "ACS"),
    ("AR-CONDICIONADO", "ACS"),
    ("EXAUSTOR", "EXA"),
    ("VENTILADOR", "VEN"),
    ("EXTINTOR", "EXT"),
    ("HIDRANTE", "HID"),
    ("CAMERA", "CFTV"),
    ("RESERVATORIO", "RES"),
    ("CAIXA-D-AGUA", "RES"),
    ("PORTAO", "PRT"),
    ("LUMINARIA", "ILU"),
];

/// Unique, human-readable identifier of a physical asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetTag(String);

impl AssetTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Category prefix segment.
    pub fn prefix(&self) -> &str {
        self.0.split(SEPARATOR).next().unwrap_or_default()
    }
}

impl fmt::Display for AssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSettings {
    pub generic_prefix: String,
    pub floor: FloorTokenRules,
    pub location_max_len: usize,
    pub sequence_digits: usize,
}

impl Default for TagSettings {
    fn default() -> Self {
        Self {
            generic_prefix: DEFAULT_GENERIC_PREFIX.to_string(),
            floor: FloorTokenRules::default(),
            location_max_len: DEFAULT_LOCATION_TOKEN_MAX_LEN,
            sequence_digits: DEFAULT_TAG_SEQUENCE_DIGITS,
        }
    }
}

impl From<&IdentifierConfig> for TagSettings {
    fn from(cfg: &IdentifierConfig) -> Self {
        Self {
            generic_prefix: cfg.generic_prefix.clone(),
            floor: FloorTokenRules {
                ground_token: cfg.ground_floor_token.clone(),
                fallback_len: cfg.floor_fallback_len,
            },
            location_max_len: cfg.location_token_max_len,
            sequence_digits: cfg.tag_sequence_digits,
        }
    }
}

/// Deterministic tag composer. Holds no state besides its settings.
#[derive(Debug, Clone, Default)]
pub struct TagGenerator {
    settings: TagSettings,
}

impl TagGenerator {
    pub fn new(settings: TagSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TagSettings {
        &self.settings
    }

    /// Category prefix for an asset name, falling back to the generic prefix.
    pub fn category_prefix<'a>(&'a self, asset_name: &str) -> &'a str {
        lookup_category(asset_name).unwrap_or(self.settings.generic_prefix.as_str())
    }

    /// Identifier prefix used to count tags already issued for `category_prefix`.
    ///
    /// The trailing separator keeps `ACS` from also counting a hypothetical `ACSX`.
    pub fn count_prefix(category_prefix: &str) -> String {
        format!("{category_prefix}{SEPARATOR}")
    }

    /// Composes a tag from names and the number of tags already sharing the prefix.
    pub fn generate(
        &self,
        asset_name: &str,
        floor_name: &str,
        location_name: &str,
        existing_tag_count: u64,
    ) -> AssetTag {
        let prefix = self.category_prefix(asset_name);
        let floor = self.settings.floor.token(floor_name);
        let location = normalize(location_name, self.settings.location_max_len);
        let sequence = existing_tag_count.saturating_add(1);

        AssetTag(format!(
            "{prefix}{sep}{floor}{sep}{location}{sep}{sequence:0width$}",
            sep = SEPARATOR,
            width = self.settings.sequence_digits,
        ))
    }
}

fn lookup_category(asset_name: &str) -> Option<&'static str> {
    let folded = fold(asset_name);
    CATEGORY_PREFIXES
        .iter()
        .find(|(keyword, _)| folded.contains(keyword))
        .map(|(_, prefix)| *prefix)
}

/// Category prefix with default settings.
pub fn category_prefix(asset_name: &str) -> &'static str {
    lookup_category(asset_name).unwrap_or(DEFAULT_GENERIC_PREFIX)
}

/// Generates a tag with default settings.
pub fn generate_tag(
    asset_name: &str,
    floor_name: &str,
    location_name: &str,
    existing_tag_count: u64,
) -> AssetTag {
    TagGenerator::default().generate(asset_name, floor_name, location_name, existing_tag_count)
}
