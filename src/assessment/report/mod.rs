//! Natural-language rendering of a decision and its attribution. This is
//! templated prose over the explanation, grouped by source form field and
//! scaled back to the units the applicant entered.

mod chart;

pub use chart::{ChartBar, ContributionDirection, WaterfallChart};

use crate::artifacts::EligibilityLabel;
use crate::assessment::applicant::{ApplicantRecord, YesNo, LOAN_AMOUNT_UNIT};
use crate::assessment::explain::Explanation;
use serde::Serialize;

/// Fixed note appended to every report, carried over from the original
/// decision page.
pub const CLOSING_NOTE: &str = "While we do our best to make every decision as fair as \
    possible, we understand that you may not agree with it. Please feel free to contact \
    one of our agents.";

const TOP_FACTORS: usize = 3;

/// One-hot feature names are prefixed with their source column; everything
/// else maps one to one.
const CATEGORICAL_COLUMNS: [&str; 3] = ["Gender", "Self_Employed", "Property_Area"];

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub headline: String,
    pub overview: String,
    pub favorable: Vec<String>,
    pub unfavorable: Vec<String>,
    pub closing_note: String,
}

impl AssessmentReport {
    /// Full report as a single block of prose.
    pub fn text(&self) -> String {
        let mut sections = vec![self.headline.clone(), self.overview.clone()];

        if !self.favorable.is_empty() {
            let mut block = String::from("Factors favoring approval:");
            for entry in &self.favorable {
                block.push_str("\n- ");
                block.push_str(entry);
            }
            sections.push(block);
        }

        if !self.unfavorable.is_empty() {
            let mut block = String::from("Factors weighing against approval:");
            for entry in &self.unfavorable {
                block.push_str("\n- ");
                block.push_str(entry);
            }
            sections.push(block);
        }

        sections.push(self.closing_note.clone());
        sections.join("\n\n")
    }
}

pub(crate) fn generate(
    record: &ApplicantRecord,
    label: EligibilityLabel,
    explanation: &Explanation,
    reference_rows: usize,
) -> AssessmentReport {
    let headline = headline_for(label);
    let overview = format!(
        "The application was assessed against {reference_rows} comparable prior applications. \
         The model score moved from a baseline of {:.2} to {:.2} for this applicant.",
        explanation.base_value, explanation.prediction_value
    );

    let mut grouped: Vec<(String, f64)> = Vec::new();
    for entry in &explanation.contributions {
        let field = source_field(&entry.feature);
        match grouped.iter_mut().find(|(name, _)| name == field) {
            Some((_, sum)) => *sum += entry.contribution,
            None => grouped.push((field.to_string(), entry.contribution)),
        }
    }

    grouped.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut favorable = Vec::new();
    let mut unfavorable = Vec::new();
    for (field, sum) in &grouped {
        if sum.abs() < 1e-6 {
            continue;
        }
        let entry = format!("{} ({:+.2})", describe_field(field, record), sum);
        if *sum > 0.0 {
            if favorable.len() < TOP_FACTORS {
                favorable.push(entry);
            }
        } else if unfavorable.len() < TOP_FACTORS {
            unfavorable.push(entry);
        }
    }

    AssessmentReport {
        headline,
        overview,
        favorable,
        unfavorable,
        closing_note: CLOSING_NOTE.to_string(),
    }
}

fn headline_for(label: EligibilityLabel) -> String {
    match label {
        EligibilityLabel::Eligible => {
            "Congratulations! Your loan application has been approved. Find more details below."
                .to_string()
        }
        EligibilityLabel::NeedsReview => {
            "Your loan will need further investigation before it can be approved. \
             Please find more details below."
                .to_string()
        }
    }
}

fn source_field(feature: &str) -> &str {
    for column in CATEGORICAL_COLUMNS {
        if feature
            .strip_prefix(column)
            .is_some_and(|rest| rest.starts_with('_'))
        {
            return column;
        }
    }
    feature
}

fn describe_field(field: &str, record: &ApplicantRecord) -> String {
    match field {
        "ApplicantIncome" => format!("an applicant income of {:.0}", record.applicant_income),
        "CoapplicantIncome" => {
            format!("a co-applicant income of {:.0}", record.coapplicant_income)
        }
        // Scale back to the amount the applicant actually entered.
        "LoanAmount" => format!(
            "a requested amount of {:.0}",
            record.loan_amount * LOAN_AMOUNT_UNIT
        ),
        "Loan_Amount_Term" => format!("a {} month repayment term", record.loan_amount_term),
        "Dependents" => match record.dependents {
            0 => "no dependents".to_string(),
            1 => "one dependent".to_string(),
            n => format!("{n} dependents"),
        },
        "Credit_History" => {
            if record.credit_history == 1 {
                "an established credit history".to_string()
            } else {
                "no credit history on record".to_string()
            }
        }
        "Gender" => format!("gender recorded as {}", record.gender.as_str()),
        "Self_Employed" => match record.self_employed {
            YesNo::Yes => "self-employment".to_string(),
            YesNo::No => "salaried employment".to_string(),
        },
        "Property_Area" => format!(
            "a property in a {} area",
            record.property_area.as_str().to_ascii_lowercase()
        ),
        other => other.to_string(),
    }
}
