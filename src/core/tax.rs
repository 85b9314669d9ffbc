use serde::Serialize;

use super::tables::{
    DEFAULT_HEIRS, INHERITANCE_BASE_DEDUCTION, INHERITANCE_BRACKETS,
    INHERITANCE_PER_HEIR_DEDUCTION, MAN, TAKE_HOME_BRACKETS,
};
use super::types::{GiftPlan, InheritanceReceipt};

pub fn inheritance_deduction(heirs: u32) -> f64 {
    (INHERITANCE_BASE_DEDUCTION + INHERITANCE_PER_HEIR_DEDUCTION * heirs as f64) * MAN
}

/// Inheritance (and gift-at-death) tax on `estate` yen shared by `heirs`
/// legal heirs, rounded to the man-yen like the official quick table.
pub fn inheritance_tax(estate: f64, heirs: u32) -> f64 {
    let base = (estate - inheritance_deduction(heirs)).max(0.0) / MAN;
    if base <= 0.0 {
        return 0.0;
    }
    let (_, rate, subtraction) = INHERITANCE_BRACKETS
        .iter()
        .copied()
        .find(|&(upper, _, _)| base <= upper)
        .unwrap_or(INHERITANCE_BRACKETS[INHERITANCE_BRACKETS.len() - 1]);
    (base * rate - subtraction).round() * MAN
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceSettlement {
    pub heirs: u32,
    pub share: f64,
    pub debt_share: f64,
    pub tax: f64,
    /// Share less debt, before tax; what stays in the household's estate.
    pub net_of_debt: f64,
    /// Share less debt and tax; the cash actually received.
    pub net_received: f64,
    pub invested_portion: f64,
    pub cash_portion: f64,
}

pub fn settle_inheritance(receipt: &InheritanceReceipt) -> InheritanceSettlement {
    let heirs = receipt.siblings.saturating_add(1);
    let share = round_man(receipt.estate / heirs as f64);
    let debt_share = receipt
        .debt
        .map(|debt| round_man(debt / heirs as f64))
        .unwrap_or(0.0);
    let tax = if share > 0.0 {
        inheritance_tax(share, heirs)
    } else {
        0.0
    };
    let ratio = receipt.invest_ratio.clamp(0.0, 1.0);
    let invested_portion = round_man(share * ratio);

    InheritanceSettlement {
        heirs,
        share,
        debt_share,
        tax,
        net_of_debt: (share - debt_share).max(0.0),
        net_received: (share - debt_share - tax).max(0.0),
        invested_portion,
        cash_portion: round_man(share * (1.0 - ratio)),
    }
}

/// Estate tax avoided by handing `plan` out during life instead of at death.
pub fn gift_tax_saving(estate: f64, plan: &GiftPlan) -> f64 {
    let gifted = plan.annual_amount * plan.recipients as f64 * plan.years as f64;
    let with_gifts = inheritance_tax((estate - gifted).max(0.0), DEFAULT_HEIRS);
    (inheritance_tax(estate, DEFAULT_HEIRS) - with_gifts).max(0.0)
}

/// Approximate take-home pay for an annual gross income.
pub fn gross_to_net(gross: f64) -> f64 {
    let gross_man = gross / MAN;
    let ratio = TAKE_HOME_BRACKETS
        .iter()
        .find(|&&(upper, _)| gross_man <= upper)
        .map(|&(_, ratio)| ratio)
        .unwrap_or(TAKE_HOME_BRACKETS[TAKE_HOME_BRACKETS.len() - 1].1);
    (gross_man * ratio).round() * MAN
}

fn round_man(yen: f64) -> f64 {
    (yen / MAN).round() * MAN
}
