use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Add,
    Subtract,
    Equals,
    Total,
}

/// One line of a cash-flow waterfall.
///
/// Amounts are stored unsigned; `kind` carries the direction. Steps with
/// `indent == 0` form the running balance, indented steps are detail lines
/// explaining the step that follows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    pub amount: Decimal,
    pub kind: StepKind,
    pub indent: u8,
    pub highlight: bool,
}

impl WaterfallStep {
    fn new(
        label: impl Into<String>,
        amount: Decimal,
        kind: StepKind,
    ) -> Self {
        Self {
            label: label.into(),
            amount,
            kind,
            indent: 0,
            highlight: false,
        }
    }

    pub fn add(
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::new(label, amount, StepKind::Add)
    }

    pub fn subtract(
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::new(label, amount, StepKind::Subtract)
    }

    pub fn equals(
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::new(label, amount, StepKind::Equals)
    }

    pub fn total(
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::new(label, amount, StepKind::Total).highlighted()
    }

    pub fn indented(mut self) -> Self {
        self.indent += 1;
        self
    }

    pub fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }
}

/// Nets the top-level add/subtract steps of a waterfall.
pub fn net_movement(steps: &[WaterfallStep]) -> Decimal {
    steps
        .iter()
        .filter(|step| step.indent == 0)
        .fold(Decimal::ZERO, |acc, step| match step.kind {
            StepKind::Add => acc + step.amount,
            StepKind::Subtract => acc - step.amount,
            StepKind::Equals | StepKind::Total => acc,
        })
}

/// Amount of the last `Total` step, if any.
pub fn final_total(steps: &[WaterfallStep]) -> Option<Decimal> {
    steps
        .iter()
        .rev()
        .find(|step| step.kind == StepKind::Total)
        .map(|step| step.amount)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn net_movement_ignores_indented_and_summary_steps() {
        let steps = vec![
            WaterfallStep::add("Profit", dec!(1000)),
            WaterfallStep::subtract("Reliefs", dec!(400)).indented(),
            WaterfallStep::equals("Subtotal", dec!(1000)),
            WaterfallStep::subtract("Tax", dec!(100)),
            WaterfallStep::total("Net", dec!(900)),
        ];

        assert_eq!(net_movement(&steps), dec!(900));
        assert_eq!(final_total(&steps), Some(dec!(900)));
    }

    #[test]
    fn total_steps_are_highlighted() {
        let step = WaterfallStep::total("Net Cash", dec!(1));

        assert!(step.highlight);
        assert_eq!(step.indent, 0);
    }
}
