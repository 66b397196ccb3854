use super::ArtifactError;
use crate::assessment::applicant::{ApplicantRecord, Gender, PropertyArea, YesNo};
use serde::Deserialize;
use std::io::Read;

/// Held-out applicant rows used only as the background distribution for the
/// attribution computation. Loaded once, never mutated.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Vec<ApplicantRecord>,
}

impl ReferenceDataset {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.deserialize::<ReferenceRow>().enumerate() {
            let row = row?;
            records.push(row.into_record(index + 1)?);
        }

        if records.is_empty() {
            return Err(ArtifactError::EmptyReference);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ApplicantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Raw CSV row. The identifier column is accepted and dropped; everything
/// else must map onto the applicant schema.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "Loan_ID", default)]
    _loan_id: Option<String>,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Dependents")]
    dependents: String,
    #[serde(rename = "Self_Employed")]
    self_employed: String,
    #[serde(rename = "ApplicantIncome")]
    applicant_income: f64,
    #[serde(rename = "CoapplicantIncome")]
    coapplicant_income: f64,
    #[serde(rename = "LoanAmount")]
    loan_amount: f64,
    #[serde(rename = "Loan_Amount_Term")]
    loan_amount_term: f64,
    #[serde(rename = "Credit_History")]
    credit_history: f64,
    #[serde(rename = "Property_Area")]
    property_area: String,
}

impl ReferenceRow {
    fn into_record(self, row: usize) -> Result<ApplicantRecord, ArtifactError> {
        let gender = Gender::parse(&self.gender)
            .ok_or_else(|| bad_row(row, format!("unknown gender {}", self.gender)))?;
        let self_employed = YesNo::parse(&self.self_employed).ok_or_else(|| {
            bad_row(row, format!("unknown self-employment flag {}", self.self_employed))
        })?;
        let property_area = PropertyArea::parse(&self.property_area)
            .ok_or_else(|| bad_row(row, format!("unknown property area {}", self.property_area)))?;

        // Historical exports write the top bucket as "3+".
        let dependents = match self.dependents.as_str() {
            "3+" | "3 or more" => 3,
            other => other
                .parse::<u8>()
                .map_err(|_| bad_row(row, format!("unparseable dependents value {other}")))?,
        };

        let credit_history = if self.credit_history >= 0.5 { 1 } else { 0 };

        Ok(ApplicantRecord {
            gender,
            dependents,
            self_employed,
            applicant_income: self.applicant_income,
            coapplicant_income: self.coapplicant_income,
            loan_amount: self.loan_amount,
            loan_amount_term: self.loan_amount_term.round() as u32,
            credit_history,
            property_area,
        })
    }
}

fn bad_row(row: usize, detail: String) -> ArtifactError {
    ArtifactError::ReferenceRow { row, detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Loan_ID,Gender,Dependents,Self_Employed,ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area\n";

    #[test]
    fn parses_rows_and_drops_the_identifier() {
        let csv = format!(
            "{HEADER}LP001002,Male,0,No,5849,0,128,360,1,Urban\nLP001003,Female,3+,Yes,4583,1508,128,360,1,Rural\n"
        );
        let dataset = ReferenceDataset::from_reader(csv.as_bytes()).expect("dataset parses");

        assert_eq!(dataset.len(), 2);
        let second = &dataset.records()[1];
        assert_eq!(second.gender, Gender::Female);
        assert_eq!(second.dependents, 3, "3+ collapses to 3");
        assert_eq!(second.credit_history, 1);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let result = ReferenceDataset::from_reader(HEADER.as_bytes());
        assert!(matches!(result, Err(ArtifactError::EmptyReference)));
    }

    #[test]
    fn unknown_enum_value_names_the_offending_row() {
        let csv = format!("{HEADER}LP001002,Other,0,No,5849,0,128,360,1,Urban\n");
        let result = ReferenceDataset::from_reader(csv.as_bytes());
        assert!(matches!(
            result,
            Err(ArtifactError::ReferenceRow { row: 1, .. })
        ));
    }
}
