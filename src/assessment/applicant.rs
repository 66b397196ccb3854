use serde::{Deserialize, Serialize};

/// Training-time unit for the loan amount: the form collects the amount in
/// currency units, the fitted artifacts expect thousands.
pub const LOAN_AMOUNT_UNIT: f64 = 1000.0;

/// Slider bounds as presented on the form. Submissions are clamped to these,
/// matching what the original closed-choice widgets enforced.
pub mod limits {
    use std::ops::RangeInclusive;

    pub const APPLICANT_INCOME: RangeInclusive<u32> = 0..=100_000;
    pub const COAPPLICANT_INCOME: RangeInclusive<u32> = 0..=100_000;
    pub const LOAN_AMOUNT: RangeInclusive<u32> = 9..=700_000;
    pub const LOAN_TERM_MONTHS: RangeInclusive<u32> = 12..=480;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    /// Fixed business encoding: Yes -> 1, No -> 0.
    pub const fn as_flag(self) -> u8 {
        match self {
            Self::Yes => 1,
            Self::No => 0,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyArea {
    Urban,
    Rural,
    Semiurban,
}

impl PropertyArea {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Rural => "Rural",
            Self::Semiurban => "Semiurban",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Urban" => Some(Self::Urban),
            "Rural" => Some(Self::Rural),
            "Semiurban" => Some(Self::Semiurban),
            _ => None,
        }
    }
}

/// Closed dependents choice exactly as the form presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependentsChoice {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3 or more")]
    ThreeOrMore,
}

impl DependentsChoice {
    /// Fixed business mapping: "3 or more" collapses to 3.
    pub const fn as_count(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::ThreeOrMore => 3,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0" => Some(Self::Zero),
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            "3 or more" | "3+" => Some(Self::ThreeOrMore),
            _ => None,
        }
    }
}

/// Raw form submission. Field names on the wire match the training columns;
/// omitted fields take the documented form defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplicantForm {
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Dependents")]
    pub dependents: DependentsChoice,
    #[serde(rename = "Self_Employed")]
    pub self_employed: YesNo,
    #[serde(rename = "ApplicantIncome")]
    pub applicant_income: u32,
    #[serde(rename = "CoapplicantIncome")]
    pub coapplicant_income: u32,
    #[serde(rename = "LoanAmount")]
    pub loan_amount: u32,
    #[serde(rename = "Loan_Amount_Term")]
    pub loan_amount_term: u32,
    #[serde(rename = "Credit_History")]
    pub credit_history: YesNo,
    #[serde(rename = "Property_Area")]
    pub property_area: PropertyArea,
}

impl Default for ApplicantForm {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            dependents: DependentsChoice::Zero,
            self_employed: YesNo::Yes,
            applicant_income: 20_000,
            coapplicant_income: 5_000,
            loan_amount: 100_000,
            loan_amount_term: 360,
            credit_history: YesNo::Yes,
            property_area: PropertyArea::Urban,
        }
    }
}

impl ApplicantForm {
    /// Builds the single mapped record for this submission. Numeric fields
    /// are clamped to the form bounds; the loan amount is converted to the
    /// thousands the artifacts were fitted on.
    pub fn into_record(self) -> ApplicantRecord {
        let applicant_income = clamp(self.applicant_income, limits::APPLICANT_INCOME);
        let coapplicant_income = clamp(self.coapplicant_income, limits::COAPPLICANT_INCOME);
        let loan_amount = clamp(self.loan_amount, limits::LOAN_AMOUNT);
        let loan_amount_term = clamp(self.loan_amount_term, limits::LOAN_TERM_MONTHS);

        ApplicantRecord {
            gender: self.gender,
            dependents: self.dependents.as_count(),
            self_employed: self.self_employed,
            applicant_income: f64::from(applicant_income),
            coapplicant_income: f64::from(coapplicant_income),
            loan_amount: f64::from(loan_amount) / LOAN_AMOUNT_UNIT,
            loan_amount_term,
            credit_history: self.credit_history.as_flag(),
            property_area: self.property_area,
        }
    }
}

fn clamp(value: u32, range: std::ops::RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// One mapped applicant row, immutable once built and discarded after the
/// request completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantRecord {
    pub gender: Gender,
    pub dependents: u8,
    pub self_employed: YesNo,
    pub applicant_income: f64,
    pub coapplicant_income: f64,
    /// Stored in thousands, matching the training data.
    pub loan_amount: f64,
    pub loan_amount_term: u32,
    pub credit_history: u8,
    pub property_area: PropertyArea,
}

impl ApplicantRecord {
    /// Resolves a numeric training column against this record.
    pub(crate) fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            "ApplicantIncome" => Some(self.applicant_income),
            "CoapplicantIncome" => Some(self.coapplicant_income),
            "LoanAmount" => Some(self.loan_amount),
            "Loan_Amount_Term" => Some(f64::from(self.loan_amount_term)),
            "Dependents" => Some(f64::from(self.dependents)),
            "Credit_History" => Some(f64::from(self.credit_history)),
            _ => None,
        }
    }

    /// Resolves a categorical training column against this record.
    pub(crate) fn categorical_value(&self, column: &str) -> Option<&'static str> {
        match column {
            "Gender" => Some(self.gender.as_str()),
            "Self_Employed" => Some(self.self_employed.as_str()),
            "Property_Area" => Some(self.property_area.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_maps_exactly() {
        let form = ApplicantForm {
            gender: Gender::Female,
            dependents: DependentsChoice::Two,
            self_employed: YesNo::No,
            applicant_income: 20_000,
            coapplicant_income: 5_000,
            loan_amount: 100_000,
            loan_amount_term: 360,
            credit_history: YesNo::Yes,
            property_area: PropertyArea::Urban,
        };

        let record = form.into_record();
        assert_eq!(record.dependents, 2);
        assert_eq!(record.credit_history, 1);
        assert!((record.loan_amount - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn three_or_more_always_maps_to_three() {
        let form = ApplicantForm {
            dependents: DependentsChoice::ThreeOrMore,
            gender: Gender::Female,
            credit_history: YesNo::No,
            ..ApplicantForm::default()
        };
        assert_eq!(form.into_record().dependents, 3);
    }

    #[test]
    fn no_credit_history_encodes_as_zero() {
        let form = ApplicantForm {
            credit_history: YesNo::No,
            ..ApplicantForm::default()
        };
        assert_eq!(form.into_record().credit_history, 0);
    }

    #[test]
    fn numeric_fields_clamp_to_form_bounds() {
        let form = ApplicantForm {
            applicant_income: 250_000,
            loan_amount: 1,
            loan_amount_term: 6,
            ..ApplicantForm::default()
        };

        let record = form.into_record();
        assert!((record.applicant_income - 100_000.0).abs() < f64::EPSILON);
        assert!((record.loan_amount - 9.0 / LOAN_AMOUNT_UNIT).abs() < f64::EPSILON);
        assert_eq!(record.loan_amount_term, 12);
    }

    #[test]
    fn defaults_match_the_documented_form() {
        let record = ApplicantForm::default().into_record();
        assert_eq!(record.gender, Gender::Male);
        assert_eq!(record.dependents, 0);
        assert_eq!(record.self_employed, YesNo::Yes);
        assert!((record.applicant_income - 20_000.0).abs() < f64::EPSILON);
        assert!((record.coapplicant_income - 5_000.0).abs() < f64::EPSILON);
        assert!((record.loan_amount - 100.0).abs() < f64::EPSILON);
        assert_eq!(record.loan_amount_term, 360);
        assert_eq!(record.credit_history, 1);
        assert_eq!(record.property_area, PropertyArea::Urban);
    }

    #[test]
    fn form_deserializes_with_wire_names_and_defaults() {
        let form: ApplicantForm =
            serde_json::from_str(r#"{"Gender": "Female", "Dependents": "3 or more"}"#)
                .expect("partial form deserializes");
        assert_eq!(form.gender, Gender::Female);
        assert_eq!(form.dependents, DependentsChoice::ThreeOrMore);
        assert_eq!(form.applicant_income, 20_000);
    }
}
