use crate::assessment::explain::Explanation;
use serde::Serialize;

/// Sign of a contribution as rendered to the user: positive contributions
/// favor approval, negative ones weigh against it. The signs come straight
/// from the attribution; nothing is reinterpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionDirection {
    FavorsApproval,
    WeighsAgainst,
}

impl ContributionDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FavorsApproval => "favors approval",
            Self::WeighsAgainst => "weighs against approval",
        }
    }

    fn of(contribution: f64) -> Self {
        if contribution >= 0.0 {
            Self::FavorsApproval
        } else {
            Self::WeighsAgainst
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartBar {
    pub feature: String,
    /// Transformed input value for the explained record.
    pub value: f64,
    pub contribution: f64,
    pub direction: ContributionDirection,
}

/// Waterfall-style rendering data: bars ordered by contribution magnitude,
/// walking from the background base value to the record's margin.
#[derive(Debug, Clone, Serialize)]
pub struct WaterfallChart {
    pub base_value: f64,
    pub final_value: f64,
    pub bars: Vec<ChartBar>,
}

impl WaterfallChart {
    pub fn from_explanation(explanation: &Explanation) -> Self {
        let mut bars: Vec<ChartBar> = explanation
            .contributions
            .iter()
            .map(|entry| ChartBar {
                feature: entry.feature.clone(),
                value: entry.value,
                contribution: entry.contribution,
                direction: ContributionDirection::of(entry.contribution),
            })
            .collect();

        bars.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.feature.cmp(&b.feature))
        });

        Self {
            base_value: explanation.base_value,
            final_value: explanation.prediction_value,
            bars,
        }
    }
}
