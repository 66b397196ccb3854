use axum::extract::{FromRef, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use loansight::artifacts::{ArtifactBundle, EligibilityLabel};
use loansight::assessment::applicant::{
    ApplicantForm, DependentsChoice, Gender, PropertyArea, YesNo,
};
use loansight::assessment::{Assessment, AssessmentEngine, Explanation, WaterfallChart};
use loansight::config::AppConfig;
use loansight::error::AppError;
use loansight::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    engine: Arc<AssessmentEngine>,
}

impl FromRef<AppState> for Arc<AssessmentEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "Loan Eligibility Assessor",
    about = "Score a loan application and explain the decision, from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assess a single application and print the report
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Override the configured artifact directory
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Override the configured artifact directory
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
    /// Applicant gender (Male or Female)
    #[arg(long, default_value = "Male", value_parser = parse_gender)]
    gender: Gender,
    /// Number of dependents (0, 1, 2, or "3 or more")
    #[arg(long, default_value = "0", value_parser = parse_dependents)]
    dependents: DependentsChoice,
    /// Whether the applicant is self-employed (Yes or No)
    #[arg(long, default_value = "Yes", value_parser = parse_yes_no)]
    self_employed: YesNo,
    /// Applicant income
    #[arg(long, default_value_t = 20_000)]
    applicant_income: u32,
    /// Co-applicant income
    #[arg(long, default_value_t = 5_000)]
    coapplicant_income: u32,
    /// Requested loan amount
    #[arg(long, default_value_t = 100_000)]
    loan_amount: u32,
    /// Loan term in months
    #[arg(long, default_value_t = 360)]
    loan_term: u32,
    /// Whether the applicant has a credit history (Yes or No)
    #[arg(long, default_value = "Yes", value_parser = parse_yes_no)]
    credit_history: YesNo,
    /// Property area (Urban, Rural, or Semiurban)
    #[arg(long, default_value = "Urban", value_parser = parse_property_area)]
    property_area: PropertyArea,
}

impl AssessArgs {
    fn form(&self) -> ApplicantForm {
        ApplicantForm {
            gender: self.gender,
            dependents: self.dependents,
            self_employed: self.self_employed,
            applicant_income: self.applicant_income,
            coapplicant_income: self.coapplicant_income,
            loan_amount: self.loan_amount,
            loan_amount_term: self.loan_term,
            credit_history: self.credit_history,
            property_area: self.property_area,
        }
    }
}

#[derive(Debug, Serialize)]
struct AssessmentResponse {
    decision: EligibilityLabel,
    headline: String,
    report: String,
    explanation: Explanation,
    chart: WaterfallChart,
    generated_on: NaiveDate,
}

impl From<Assessment> for AssessmentResponse {
    fn from(assessment: Assessment) -> Self {
        Self {
            decision: assessment.label,
            headline: assessment.report.headline.clone(),
            report: assessment.report.text(),
            explanation: assessment.explanation,
            chart: assessment.chart,
            generated_on: Local::now().date_naive(),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Assess(args) => run_assess(args),
    }
}

fn parse_gender(raw: &str) -> Result<Gender, String> {
    Gender::parse(raw).ok_or_else(|| format!("'{raw}' is not one of Male, Female"))
}

fn parse_yes_no(raw: &str) -> Result<YesNo, String> {
    YesNo::parse(raw).ok_or_else(|| format!("'{raw}' is not one of Yes, No"))
}

fn parse_dependents(raw: &str) -> Result<DependentsChoice, String> {
    DependentsChoice::parse(raw).ok_or_else(|| format!("'{raw}' is not one of 0, 1, 2, '3 or more'"))
}

fn parse_property_area(raw: &str) -> Result<PropertyArea, String> {
    PropertyArea::parse(raw).ok_or_else(|| format!("'{raw}' is not one of Urban, Rural, Semiurban"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.artifact_dir.take() {
        config.artifacts.dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    // Missing or unreadable artifacts abort here; the process never serves
    // a request it cannot complete.
    let bundle = ArtifactBundle::load(&config.artifacts.dir)?;
    let engine = Arc::new(AssessmentEngine::from_bundle(bundle)?);
    info!(
        artifact_dir = %config.artifacts.dir.display(),
        features = engine.feature_count(),
        reference_rows = engine.reference_rows(),
        "artifacts loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        engine,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/assessments", post(assessment_endpoint))
        .layer(prometheus_layer)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan eligibility service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = args.artifact_dir.as_ref() {
        config.artifacts.dir = dir.clone();
    }

    let bundle = ArtifactBundle::load(&config.artifacts.dir)?;
    let engine = AssessmentEngine::from_bundle(bundle)?;
    let assessment = engine.assess(args.form())?;

    render_assessment(&assessment, Local::now().date_naive());
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn assessment_endpoint(
    State(engine): State<Arc<AssessmentEngine>>,
    Json(form): Json<ApplicantForm>,
) -> Result<Json<AssessmentResponse>, AppError> {
    let assessment = engine.assess(form)?;
    Ok(Json(AssessmentResponse::from(assessment)))
}

fn render_assessment(assessment: &Assessment, today: NaiveDate) {
    println!("Loan eligibility assessment ({today})");
    println!("Decision: {}", assessment.label.label());

    println!("\n{}", assessment.report.text());

    println!("\nImpact of each variable on the prediction");
    println!("Positive contributions favor approval; negative ones weigh against it.");
    println!("Baseline score: {:+.3}", assessment.chart.base_value);
    for bar in &assessment.chart.bars {
        println!(
            "- {:<28} {:+.3}  ({})",
            bar.feature,
            bar.contribution,
            bar.direction.label()
        );
    }
    println!("Final score: {:+.3}", assessment.chart.final_value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use loansight::artifacts::{FittedPreprocessor, LogisticClassifier, ReferenceDataset};

    fn fixture_engine() -> Arc<AssessmentEngine> {
        let preprocessor = FittedPreprocessor::from_reader(
            r#"{
                "numeric": [
                    {"column": "ApplicantIncome", "mean": 5000.0, "scale": 2500.0},
                    {"column": "Credit_History", "mean": 0.8, "scale": 0.4}
                ],
                "categorical": [
                    {"column": "Property_Area", "categories": ["Rural", "Semiurban", "Urban"]}
                ]
            }"#
            .as_bytes(),
        )
        .expect("preprocessor parses");

        let classifier = LogisticClassifier::from_reader(
            r#"{
                "features": [
                    "ApplicantIncome", "Credit_History",
                    "Property_Area_Rural", "Property_Area_Semiurban", "Property_Area_Urban"
                ],
                "coefficients": [0.1, 1.5, -0.2, 0.3, 0.1],
                "intercept": 0.4,
                "threshold": 0.5
            }"#
            .as_bytes(),
        )
        .expect("classifier parses");

        let reference = ReferenceDataset::from_reader(
            "Loan_ID,Gender,Dependents,Self_Employed,ApplicantIncome,CoapplicantIncome,LoanAmount,Loan_Amount_Term,Credit_History,Property_Area\n\
             LP1,Male,0,No,4000,0,120,360,1,Urban\n\
             LP2,Female,2,No,6000,1500,150,360,0,Rural\n"
                .as_bytes(),
        )
        .expect("reference parses");

        let bundle = ArtifactBundle::from_parts(preprocessor, classifier, reference);
        Arc::new(AssessmentEngine::from_bundle(bundle).expect("engine builds"))
    }

    #[test]
    fn dependents_parser_accepts_both_top_bucket_spellings() {
        assert_eq!(
            parse_dependents("3 or more").expect("parses"),
            DependentsChoice::ThreeOrMore
        );
        assert_eq!(
            parse_dependents("3+").expect("parses"),
            DependentsChoice::ThreeOrMore
        );
        assert!(parse_dependents("4").is_err());
    }

    #[tokio::test]
    async fn assessment_endpoint_returns_decision_and_explanation() {
        let engine = fixture_engine();
        let form = ApplicantForm::default();

        let Json(body) = assessment_endpoint(State(engine.clone()), Json(form))
            .await
            .expect("assessment succeeds");

        assert_eq!(body.decision, EligibilityLabel::Eligible);
        assert_eq!(body.explanation.contributions.len(), engine.feature_count());
        assert!(body.report.contains("Factors favoring approval:"));
    }

    #[tokio::test]
    async fn repeated_requests_yield_identical_results() {
        let engine = fixture_engine();

        let Json(first) =
            assessment_endpoint(State(engine.clone()), Json(ApplicantForm::default()))
                .await
                .expect("assessment succeeds");
        let Json(second) = assessment_endpoint(State(engine), Json(ApplicantForm::default()))
            .await
            .expect("assessment succeeds");

        assert_eq!(first.decision, second.decision);
        assert_eq!(first.explanation, second.explanation);
    }
}
