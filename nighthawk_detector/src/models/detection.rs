//! One row of a Nighthawk detection CSV file.

use serde::{Deserialize, Serialize};

/// Fields are kept as text so annotations carry Nighthawk's own formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRow {
    pub start_sec: String,
    pub end_sec: String,
    pub class: String,
    pub prob: String,
    pub order: String,
    pub prob_order: String,
    pub family: String,
    pub prob_family: String,
    pub group: String,
    pub prob_group: String,
    pub species: String,
    pub prob_species: String,
}

/// Column header written by Nighthawk.
pub const HEADER: [&str; 12] = [
    "start_sec",
    "end_sec",
    "class",
    "prob",
    "order",
    "prob_order",
    "family",
    "prob_family",
    "group",
    "prob_group",
    "species",
    "prob_species",
];
