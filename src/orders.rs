//! Maintenance order codes.
//!
//! Preventive (`OMP`) and corrective (`OMC`) orders receive a code built from
//! the contract acronym, a kind marker and a sequence number that increases
//! per contract. The layout is a template so it can match whatever format
//! existing records already use.

use regex::Regex;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::IdentifierConfig;
use crate::text::fold;

pub const ACRONYM_PLACEHOLDER: &str = "{acronym}";
pub const MARKER_PLACEHOLDER: &str = "{marker}";
pub const NUMBER_PLACEHOLDER: &str = "{number}";

pub const DEFAULT_ORDER_CODE_TEMPLATE: &str = "{marker}-{acronym}-{number}";
pub const DEFAULT_ORDER_NUMBER_DIGITS: usize = 5;
pub const DEFAULT_PREVENTIVE_MARKER: &str = "OMP";
pub const DEFAULT_CORRECTIVE_MARKER: &str = "OMC";

/// Kind of maintenance record an order code is issued for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OrderKind {
    /// Scheduled task generated from a maintenance plan.
    #[sea_orm(string_value = "preventive")]
    Preventive,
    /// Ticket opened for a failure.
    #[sea_orm(string_value = "corrective")]
    Corrective,
}

/// Human-readable code of a maintenance order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendering rules for order codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCodeFormat {
    pub template: String,
    pub digits: usize,
    pub preventive_marker: String,
    pub corrective_marker: String,
}

impl Default for OrderCodeFormat {
    fn default() -> Self {
        Self {
            template: DEFAULT_ORDER_CODE_TEMPLATE.to_string(),
            digits: DEFAULT_ORDER_NUMBER_DIGITS,
            preventive_marker: DEFAULT_PREVENTIVE_MARKER.to_string(),
            corrective_marker: DEFAULT_CORRECTIVE_MARKER.to_string(),
        }
    }
}

impl From<&IdentifierConfig> for OrderCodeFormat {
    fn from(cfg: &IdentifierConfig) -> Self {
        Self {
            template: cfg.order_code_template.clone(),
            digits: cfg.order_number_digits,
            preventive_marker: cfg.preventive_marker.clone(),
            corrective_marker: cfg.corrective_marker.clone(),
        }
    }
}

impl OrderCodeFormat {
    pub fn marker(&self, kind: OrderKind) -> &str {
        match kind {
            OrderKind::Preventive => &self.preventive_marker,
            OrderKind::Corrective => &self.corrective_marker,
        }
    }

    /// Renders a code. Numbers wider than `digits` are kept whole.
    pub fn render(&self, acronym: &str, kind: OrderKind, number: i64) -> OrderCode {
        let number = format!("{number:0width$}", width = self.digits);
        OrderCode(
            self.template
                .replace(ACRONYM_PLACEHOLDER, &fold(acronym))
                .replace(MARKER_PLACEHOLDER, self.marker(kind))
                .replace(NUMBER_PLACEHOLDER, &number),
        )
    }

    /// Matcher for the codes this format renders for one contract and kind.
    ///
    /// Template text, acronym and marker are matched literally and `{number}`
    /// captures the digits, so an acronym ending in a digit is never mistaken
    /// for the sequence number.
    pub fn pattern(&self, acronym: &str, kind: OrderKind) -> Result<OrderCodePattern, regex::Error> {
        let number = regex::escape(NUMBER_PLACEHOLDER);
        let body = regex::escape(&self.template)
            .replace(&regex::escape(ACRONYM_PLACEHOLDER), &regex::escape(&fold(acronym)))
            .replace(&regex::escape(MARKER_PLACEHOLDER), &regex::escape(self.marker(kind)))
            .replacen(&number, r"(\d+)", 1)
            .replace(&number, r"\d+");
        Regex::new(&format!("^{body}$")).map(OrderCodePattern)
    }
}

/// Compiled form of [`OrderCodeFormat::pattern`].
#[derive(Debug, Clone)]
pub struct OrderCodePattern(Regex);

impl OrderCodePattern {
    /// Sequence number embedded in `code`, or `None` when the code was not
    /// rendered for this contract and kind.
    pub fn parse(&self, code: &str) -> Option<i64> {
        self.0.captures(code)?.get(1)?.as_str().parse().ok()
    }
}

/// Checks that a template can produce distinct, parseable codes.
///
/// Counters run per contract and kind, so the marker is required to keep
/// preventive and corrective codes apart.
pub fn validate_template(template: &str) -> Result<(), String> {
    for placeholder in [ACRONYM_PLACEHOLDER, MARKER_PLACEHOLDER, NUMBER_PLACEHOLDER] {
        if !template.contains(placeholder) {
            return Err(format!("order code template must contain {placeholder}"));
        }
    }
    Ok(())
}
