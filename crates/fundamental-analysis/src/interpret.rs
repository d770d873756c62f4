//! Score bands. A value sitting exactly on a threshold falls into the lower band.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! zone_display {
    ($zone:ty) => {
        impl fmt::Display for $zone {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Altman Z-Score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreZone {
    Safe,
    Grey,
    Distress,
}

impl ZScoreZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZScoreZone::Safe => "safe",
            ZScoreZone::Grey => "grey",
            ZScoreZone::Distress => "distress",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ZScoreZone::Safe => "Low bankruptcy risk",
            ZScoreZone::Grey => "Moderate risk",
            ZScoreZone::Distress => "High bankruptcy risk",
        }
    }
}

/// Piotroski F-Score band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FScoreZone {
    Strong,
    Average,
    Weak,
}

impl FScoreZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            FScoreZone::Strong => "strong",
            FScoreZone::Average => "average",
            FScoreZone::Weak => "weak",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FScoreZone::Strong => "Excellent financial health",
            FScoreZone::Average => "Moderate financial health",
            FScoreZone::Weak => "Poor financial health",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PegZone {
    Undervalued,
    Fair,
    High,
    Overvalued,
}

impl PegZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            PegZone::Undervalued => "undervalued",
            PegZone::Fair => "fair",
            PegZone::High => "high",
            PegZone::Overvalued => "overvalued",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PegZone::Undervalued => "Growing faster than P/E suggests",
            PegZone::Fair => "Reasonably valued",
            PegZone::High => "May be overvalued",
            PegZone::Overvalued => "Price exceeds growth rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutZone {
    VerySafe,
    Safe,
    Moderate,
    AtRisk,
}

impl PayoutZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutZone::VerySafe => "very_safe",
            PayoutZone::Safe => "safe",
            PayoutZone::Moderate => "moderate",
            PayoutZone::AtRisk => "at_risk",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PayoutZone::VerySafe => "Room for dividend growth",
            PayoutZone::Safe => "Sustainable payout",
            PayoutZone::Moderate => "Limited room for growth",
            PayoutZone::AtRisk => "May not be sustainable",
        }
    }
}

zone_display!(ZScoreZone);
zone_display!(FScoreZone);
zone_display!(PegZone);
zone_display!(PayoutZone);

pub fn z_score_interpretation(score: f64) -> (ZScoreZone, &'static str) {
    let zone = if score > 2.99 {
        ZScoreZone::Safe
    } else if score > 1.81 {
        ZScoreZone::Grey
    } else {
        ZScoreZone::Distress
    };
    (zone, zone.description())
}

pub fn f_score_interpretation(score: i32) -> (FScoreZone, &'static str) {
    let zone = if score >= 8 {
        FScoreZone::Strong
    } else if score >= 5 {
        FScoreZone::Average
    } else {
        FScoreZone::Weak
    };
    (zone, zone.description())
}

pub fn peg_interpretation(peg: f64) -> (PegZone, &'static str) {
    let zone = if peg < 1.0 {
        PegZone::Undervalued
    } else if peg <= 1.5 {
        PegZone::Fair
    } else if peg <= 2.0 {
        PegZone::High
    } else {
        PegZone::Overvalued
    };
    (zone, zone.description())
}

/// `ratio` is a percentage (45.0, not 0.45).
pub fn payout_ratio_interpretation(ratio: f64) -> (PayoutZone, &'static str) {
    let zone = if ratio < 30.0 {
        PayoutZone::VerySafe
    } else if ratio < 50.0 {
        PayoutZone::Safe
    } else if ratio < 75.0 {
        PayoutZone::Moderate
    } else {
        PayoutZone::AtRisk
    };
    (zone, zone.description())
}
