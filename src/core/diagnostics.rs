use serde::Serialize;

use super::tables::{MAN, WEALTH_TIERS, percentile_brackets};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FireKind {
    Lean,
    Standard,
    Side,
    Fat,
}

impl FireKind {
    pub const ALL: [FireKind; 4] = [
        FireKind::Lean,
        FireKind::Standard,
        FireKind::Side,
        FireKind::Fat,
    ];

    /// Multiple of annual spending that counts as "enough".
    pub fn multiple(self) -> f64 {
        match self {
            FireKind::Lean => 20.0,
            FireKind::Standard | FireKind::Side => 25.0,
            FireKind::Fat => 33.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireThreshold {
    pub kind: FireKind,
    pub target: f64,
    pub achieved: bool,
    /// Percent of the target reached, capped at 100.
    pub progress: f64,
    pub gap: f64,
}

/// Side FIRE nets the side income off the spending before applying its
/// multiple; every other kind uses the full spending.
pub fn fire_thresholds(annual_expense: f64, side_income: f64, assets: f64) -> Vec<FireThreshold> {
    FireKind::ALL
        .iter()
        .map(|&kind| {
            let spending = match kind {
                FireKind::Side => annual_expense - side_income,
                _ => annual_expense,
            };
            let target = spending * kind.multiple();
            FireThreshold {
                kind,
                target,
                achieved: assets >= target,
                progress: (assets / target.max(MAN) * 100.0).min(100.0),
                gap: (target - assets).max(0.0),
            }
        })
        .collect()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthTier {
    pub label: &'static str,
    /// Lower bound in man-yen.
    pub floor: u32,
}

pub fn wealth_tier(assets: f64) -> WealthTier {
    let man = assets / MAN;
    let (label, floor) = WEALTH_TIERS
        .iter()
        .copied()
        .find(|&(_, floor)| man >= floor)
        .unwrap_or(WEALTH_TIERS[WEALTH_TIERS.len() - 1]);
    WealthTier {
        label,
        floor: floor as u32,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PercentileLabel {
    Top10,
    Top20,
    Top30,
    Top40,
    Top50,
    BottomHalf,
}

impl PercentileLabel {
    fn from_rank(rank: u32) -> Self {
        match rank {
            90.. => PercentileLabel::Top10,
            80..=89 => PercentileLabel::Top20,
            70..=79 => PercentileLabel::Top30,
            60..=69 => PercentileLabel::Top40,
            50..=59 => PercentileLabel::Top50,
            _ => PercentileLabel::BottomHalf,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentilePlacement {
    /// Interpolated position among households of the same age band, 0..=99.
    pub rank: u32,
    pub label: PercentileLabel,
}

/// Places `assets` (yen) against the decile table for the household's age.
pub fn percentile_rank(age: u32, assets: f64) -> PercentilePlacement {
    let brackets = percentile_brackets(age);
    let man = assets / MAN;
    if man.is_nan() || man <= 0.0 {
        return PercentilePlacement {
            rank: 0,
            label: PercentileLabel::BottomHalf,
        };
    }
    if man >= brackets[9] {
        return PercentilePlacement {
            rank: 99,
            label: PercentileLabel::Top10,
        };
    }

    let idx = (1..10)
        .find(|&i| man < brackets[i])
        .map(|i| i - 1)
        .unwrap_or(9);
    let lo = brackets[idx];
    let hi = brackets.get(idx + 1).copied().unwrap_or(brackets[9]);
    let frac = if hi > lo { (man - lo) / (hi - lo) } else { 0.0 };
    let rank = (((idx as f64 + frac) * 10.0).round() as u32).min(99);
    PercentilePlacement {
        rank,
        label: PercentileLabel::from_rank(rank),
    }
}
