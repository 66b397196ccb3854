use loansight::artifacts::{
    ArtifactBundle, ArtifactError, EligibilityLabel, FittedPreprocessor, LogisticClassifier,
    ReferenceDataset,
};
use loansight::assessment::applicant::{
    ApplicantForm, DependentsChoice, Gender, PropertyArea, YesNo,
};
use loansight::assessment::AssessmentEngine;

const PREPROCESSOR: &str = r#"{
    "numeric": [
        { "column": "ApplicantIncome", "mean": 5403.46, "scale": 6109.04 },
        { "column": "CoapplicantIncome", "mean": 1621.25, "scale": 2926.25 },
        { "column": "LoanAmount", "mean": 146.41, "scale": 85.59 },
        { "column": "Loan_Amount_Term", "mean": 342.0, "scale": 65.12 },
        { "column": "Dependents", "mean": 0.76, "scale": 1.01 },
        { "column": "Credit_History", "mean": 0.842, "scale": 0.364 }
    ],
    "categorical": [
        { "column": "Gender", "categories": ["Female", "Male"] },
        { "column": "Self_Employed", "categories": ["No", "Yes"] },
        { "column": "Property_Area", "categories": ["Rural", "Semiurban", "Urban"] }
    ]
}"#;

const CLASSIFIER: &str = r#"{
    "features": [
        "ApplicantIncome", "CoapplicantIncome", "LoanAmount", "Loan_Amount_Term",
        "Dependents", "Credit_History",
        "Gender_Female", "Gender_Male",
        "Self_Employed_No", "Self_Employed_Yes",
        "Property_Area_Rural", "Property_Area_Semiurban", "Property_Area_Urban"
    ],
    "coefficients": [-0.05, -0.1, -0.35, -0.1, -0.05, 1.6, -0.02, 0.02, 0.03, -0.03, -0.25, 0.3, 0.05],
    "intercept": 0.45,
    "threshold": 0.5
}"#;

const REFERENCE: &str = "\
Loan_ID,Gender,Dependents,Self_Employed,ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area
LP001015,Male,0,No,5720,0,110,360,1,Urban
LP001055,Female,1,No,2226,0,59,360,1,Semiurban
LP001056,Male,2,No,3881,0,147,360,0,Rural
LP001083,Male,3+,No,4166,0,40,180,1,Urban
LP001094,Male,2,No,12173,0,166,360,0,Semiurban
";

fn engine() -> AssessmentEngine {
    let bundle = ArtifactBundle::from_parts(
        FittedPreprocessor::from_reader(PREPROCESSOR.as_bytes()).expect("preprocessor parses"),
        LogisticClassifier::from_reader(CLASSIFIER.as_bytes()).expect("classifier parses"),
        ReferenceDataset::from_reader(REFERENCE.as_bytes()).expect("reference parses"),
    );
    AssessmentEngine::from_bundle(bundle).expect("engine builds")
}

fn worked_example() -> ApplicantForm {
    ApplicantForm {
        gender: Gender::Female,
        dependents: DependentsChoice::Two,
        self_employed: YesNo::No,
        applicant_income: 20_000,
        coapplicant_income: 5_000,
        loan_amount: 100_000,
        loan_amount_term: 360,
        credit_history: YesNo::Yes,
        property_area: PropertyArea::Urban,
    }
}

#[test]
fn pipeline_maps_the_worked_example_record() {
    let assessment = engine().assess(worked_example()).expect("assessment runs");

    assert_eq!(assessment.record.dependents, 2);
    assert_eq!(assessment.record.credit_history, 1);
    assert!((assessment.record.loan_amount - 100.0).abs() < f64::EPSILON);
}

#[test]
fn explanation_covers_the_full_transformed_representation() {
    let engine = engine();
    let assessment = engine.assess(worked_example()).expect("assessment runs");

    assert_eq!(engine.feature_count(), 13);
    assert_eq!(assessment.explanation.contributions.len(), 13);
    assert_eq!(assessment.chart.bars.len(), 13);
}

#[test]
fn explanation_is_additive_in_margin_space() {
    let assessment = engine().assess(worked_example()).expect("assessment runs");
    let explanation = &assessment.explanation;

    let total: f64 = explanation
        .contributions
        .iter()
        .map(|entry| entry.contribution)
        .sum();
    assert!((explanation.base_value + total - explanation.prediction_value).abs() < 1e-9);
    assert!((assessment.chart.final_value - explanation.prediction_value).abs() < 1e-12);
}

#[test]
fn repeated_assessments_are_identical() {
    let engine = engine();
    let first = engine.assess(worked_example()).expect("assessment runs");
    let second = engine.assess(worked_example()).expect("assessment runs");

    assert_eq!(first.label, second.label);
    assert_eq!(first.explanation, second.explanation);
    assert_eq!(first.record, second.record);
}

#[test]
fn established_credit_history_approves_the_default_applicant() {
    let assessment = engine()
        .assess(ApplicantForm::default())
        .expect("assessment runs");
    assert_eq!(assessment.label, EligibilityLabel::Eligible);
    assert!(assessment.report.headline.contains("approved"));
}

#[test]
fn missing_credit_history_sends_the_default_applicant_to_review() {
    let form = ApplicantForm {
        credit_history: YesNo::No,
        ..ApplicantForm::default()
    };
    let assessment = engine().assess(form).expect("assessment runs");

    assert_eq!(assessment.label, EligibilityLabel::NeedsReview);
    assert!(assessment.report.headline.contains("further investigation"));
    assert!(assessment
        .report
        .unfavorable
        .iter()
        .any(|entry| entry.contains("no credit history")));
}

#[test]
fn artifact_layout_disagreement_fails_at_engine_construction() {
    let classifier = r#"{
        "features": ["ApplicantIncome", "LoanAmount"],
        "coefficients": [0.1, -0.2],
        "intercept": 0.0,
        "threshold": 0.5
    }"#;

    let bundle = ArtifactBundle::from_parts(
        FittedPreprocessor::from_reader(PREPROCESSOR.as_bytes()).expect("preprocessor parses"),
        LogisticClassifier::from_reader(classifier.as_bytes()).expect("classifier parses"),
        ReferenceDataset::from_reader(REFERENCE.as_bytes()).expect("reference parses"),
    );

    let result = AssessmentEngine::from_bundle(bundle);
    assert!(matches!(result, Err(ArtifactError::SchemaMismatch { .. })));
}
