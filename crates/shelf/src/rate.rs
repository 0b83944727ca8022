//! Rate schedules and the rate recorded on a shelf product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pim_core::ValueObject;

/// Parse user-typed numeric text; blank or non-numeric input becomes zero.
pub fn coerce_decimal(text: &str) -> Decimal {
    text.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Increment used by the adjustment stepper (0.25 percentage points).
pub fn adjustment_step() -> Decimal {
    Decimal::new(25, 2)
}

/// Rate stored on a product once a schedule has been saved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRate {
    pub base_rate_percent: Decimal,
    pub ceiling_rate: Option<Decimal>,
    pub floor_rate: Option<Decimal>,
    pub target_rate: Option<Decimal>,
}

impl ValueObject for ProductRate {}

impl ProductRate {
    pub fn new(base_rate_percent: Decimal) -> Self {
        Self {
            base_rate_percent,
            ceiling_rate: None,
            floor_rate: None,
            target_rate: None,
        }
    }

    /// A floor above the ceiling cannot be honoured.
    pub fn is_consistent(&self) -> bool {
        match (self.floor_rate, self.ceiling_rate) {
            (Some(floor), Some(ceiling)) => floor <= ceiling,
            _ => true,
        }
    }
}

/// Market reference a relative base rate is pegged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRate {
    pub id: String,
    pub label: String,
    pub value: Decimal,
}

impl AnchorRate {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value: Decimal) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value,
        }
    }
}

pub fn default_anchor_rates() -> Vec<AnchorRate> {
    vec![
        AnchorRate::new("prime", "Prime rate (4.95%)", Decimal::new(495, 2)),
        AnchorRate::new("lender", "Lender base (4.20%)", Decimal::new(420, 2)),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BaseRate {
    Static { rate: Decimal },
    Relative { anchor: String, adjustment: Decimal },
}

impl BaseRate {
    /// Unknown anchors count as zero.
    pub fn value(&self, anchors: &[AnchorRate]) -> Decimal {
        match self {
            BaseRate::Static { rate } => *rate,
            BaseRate::Relative { anchor, adjustment } => {
                let anchor_value = anchors
                    .iter()
                    .find(|a| a.id == *anchor)
                    .map(|a| a.value)
                    .unwrap_or(Decimal::ZERO);
                anchor_value + *adjustment
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubrateKind {
    Target,
    Ceiling,
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SubrateValue {
    Static(Decimal),
    RelativeToBase(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subrate {
    pub id: u32,
    pub kind: SubrateKind,
    pub value: SubrateValue,
}

/// Editable schedule from which a [`ProductRate`] is resolved.
///
/// Net rate is `base + lender_spread + investor_spread` unless `net_override`
/// is set. Sub-rates resolve against the base rate, not the net rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub base: BaseRate,
    pub lender_spread: Decimal,
    pub investor_spread: Decimal,
    pub net_override: Option<Decimal>,
    subrates: Vec<Subrate>,
    next_subrate_id: u32,
}

impl Default for RateSchedule {
    fn default() -> Self {
        let standard = SubrateValue::Static(Decimal::new(445, 2));
        let mut schedule = Self {
            base: BaseRate::Static {
                rate: Decimal::new(440, 2),
            },
            lender_spread: Decimal::ZERO,
            investor_spread: Decimal::ZERO,
            net_override: None,
            subrates: Vec::new(),
            next_subrate_id: 1,
        };
        schedule.add_subrate(SubrateKind::Floor, standard);
        schedule.add_subrate(SubrateKind::Ceiling, standard);
        schedule.add_subrate(SubrateKind::Target, standard);
        schedule
    }
}

impl RateSchedule {
    /// A schedule with no sub-rates.
    pub fn new(base: BaseRate) -> Self {
        Self {
            base,
            lender_spread: Decimal::ZERO,
            investor_spread: Decimal::ZERO,
            net_override: None,
            subrates: Vec::new(),
            next_subrate_id: 1,
        }
    }

    pub fn subrates(&self) -> &[Subrate] {
        &self.subrates
    }

    pub fn add_subrate(&mut self, kind: SubrateKind, value: SubrateValue) -> u32 {
        let id = self.next_subrate_id;
        self.next_subrate_id += 1;
        self.subrates.push(Subrate { id, kind, value });
        id
    }

    pub fn remove_subrate(&mut self, id: u32) -> bool {
        let before = self.subrates.len();
        self.subrates.retain(|s| s.id != id);
        self.subrates.len() != before
    }

    pub fn update_subrate(&mut self, id: u32, kind: SubrateKind, value: SubrateValue) -> bool {
        match self.subrates.iter_mut().find(|s| s.id == id) {
            Some(sub) => {
                sub.kind = kind;
                sub.value = value;
                true
            }
            None => false,
        }
    }

    /// Nudge the relative base adjustment by `steps` increments of 0.25.
    ///
    /// No effect on a static base.
    pub fn step_base_adjustment(&mut self, steps: i64) {
        if let BaseRate::Relative { adjustment, .. } = &mut self.base {
            *adjustment += adjustment_step() * Decimal::from(steps);
        }
    }

    pub fn step_up(&mut self) {
        self.step_base_adjustment(1);
    }

    pub fn step_down(&mut self) {
        self.step_base_adjustment(-1);
    }

    pub fn base_rate(&self, anchors: &[AnchorRate]) -> Decimal {
        self.base.value(anchors)
    }

    pub fn calculated_net_rate(&self, anchors: &[AnchorRate]) -> Decimal {
        self.base_rate(anchors) + self.lender_spread + self.investor_spread
    }

    pub fn effective_net_rate(&self, anchors: &[AnchorRate]) -> Decimal {
        self.net_override
            .unwrap_or_else(|| self.calculated_net_rate(anchors))
    }

    pub fn subrate_value(&self, subrate: &Subrate, anchors: &[AnchorRate]) -> Decimal {
        match subrate.value {
            SubrateValue::Static(rate) => rate,
            SubrateValue::RelativeToBase(adjustment) => self.base_rate(anchors) + adjustment,
        }
    }

    /// Later rows of the same kind win.
    pub fn resolve(&self, anchors: &[AnchorRate]) -> ProductRate {
        let mut rate = ProductRate::new(self.effective_net_rate(anchors));
        for sub in &self.subrates {
            let value = Some(self.subrate_value(sub, anchors));
            match sub.kind {
                SubrateKind::Target => rate.target_rate = value,
                SubrateKind::Ceiling => rate.ceiling_rate = value,
                SubrateKind::Floor => rate.floor_rate = value,
            }
        }
        rate
    }
}
