use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Datelike;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ChildProfile, DefinedContribution, Fund, FundAllocation, FundCatalog, GiftPlan, GiftReceipt,
    HouseholdProfile, InheritanceReceipt, LifeEvent, PartnerProfile, PensionProfile,
    PensionScheme, PlanReport, RealEstate, SchoolTrack, SchoolingPlan, UniversityTrack,
    format_yen, gross_to_net, run_plan, tables::DEFAULT_DC_RATE, to_man, to_yen,
};

const MAX_AGE: u32 = 120;
const MAX_CONTRIBUTION_YEARS: u32 = 60;
const MAX_YEARS_AHEAD: u32 = 120;
const CHILD_BIRTH_YEAR_SPAN: i64 = 30;
const EARLIEST_YEAR: i32 = 1900;
const LATEST_YEAR: i32 = 2200;

#[derive(Parser, Debug)]
#[command(
    name = "fire-compass",
    about = "Monte Carlo FIRE planner for Japanese households (pension, education, inheritance tax)"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one plan and print the JSON report.
    Simulate(ProfileArgs),
    /// Serve the JSON HTTP API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPensionScheme {
    /// Company employee: basic plus earnings-linked pension.
    Employee,
    /// Self-employed: basic pension only.
    National,
}

impl From<CliPensionScheme> for PensionScheme {
    fn from(value: CliPensionScheme) -> Self {
        match value {
            CliPensionScheme::Employee => PensionScheme::EarningsLinked,
            CliPensionScheme::National => PensionScheme::FlatRate,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPensionScheme {
    Employee,
    National,
}

impl From<ApiPensionScheme> for CliPensionScheme {
    fn from(value: ApiPensionScheme) -> Self {
        match value {
            ApiPensionScheme::Employee => CliPensionScheme::Employee,
            ApiPensionScheme::National => CliPensionScheme::National,
        }
    }
}

/// One-off life event as entered, cost in man-yen.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct EventArg {
    pub year: i32,
    pub cost: f64,
}

/// Every household field, in display units: money in man-yen, rates in
/// percent. Converted to core units by `build_profile`.
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long, help = "Calendar year of age --current-age; defaults to this year")]
    pub current_year: Option<i32>,
    #[arg(long, default_value_t = 35)]
    pub current_age: u32,
    #[arg(long, default_value_t = 55)]
    pub retire_age: u32,
    #[arg(long, default_value_t = 90)]
    pub life_expectancy: u32,

    #[arg(long, default_value_t = 1_000.0, help = "Invested assets in man-yen")]
    pub invest_asset: f64,
    #[arg(long, default_value_t = 300.0, help = "Uninvested emergency fund in man-yen")]
    pub emergency_fund: f64,
    #[arg(long, help = "Draw on the emergency fund in years returning below -15%")]
    pub use_emergency_on_crash: bool,
    #[arg(long, help = "Home value in man-yen")]
    pub home_value: Option<f64>,
    #[arg(long, default_value_t = 0.0, help = "Outstanding mortgage in man-yen")]
    pub home_loan: f64,

    #[arg(long, default_value_t = 10.0, help = "Monthly investment in man-yen")]
    pub monthly_invest: f64,
    #[arg(long, default_value_t = 600.0, help = "Annual income in man-yen")]
    pub annual_income: f64,
    #[arg(long, help = "Treat --annual-income and --partner-income as gross pay")]
    pub income_is_gross: bool,
    #[arg(long, default_value_t = 300.0, help = "Current annual spending in man-yen")]
    pub annual_expense: f64,
    #[arg(long, default_value_t = 240.0, help = "Annual withdrawal after retirement in man-yen")]
    pub annual_withdraw: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual side income in man-yen")]
    pub side_income: f64,
    #[arg(long, default_value_t = 1.5, help = "Inflation in percent")]
    pub inflation_rate: f64,
    #[arg(long, default_value_t = true, action = ArgAction::Set, help = "Apply 20.315% tax to gains")]
    pub apply_tax: bool,

    #[arg(long, value_enum, default_value_t = CliPensionScheme::Employee)]
    pub pension_scheme: CliPensionScheme,
    #[arg(long, default_value_t = 65)]
    pub pension_start_age: u32,
    #[arg(long, default_value_t = 35, help = "Years in the earnings-linked scheme")]
    pub pension_years: u32,
    #[arg(long, help = "Salary basis for the earnings-linked pension in man-yen")]
    pub last_salary: Option<f64>,
    #[arg(long, default_value_t = 0, help = "Voluntary contribution years after retirement")]
    pub extension_years: u32,
    #[arg(long, help = "Pay the supplemental flat-rate premium")]
    pub supplemental_pension: bool,
    #[arg(long, help = "Defined-contribution monthly amount in man-yen")]
    pub dc_monthly: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_DC_RATE * 100.0, help = "Defined-contribution return in percent")]
    pub dc_rate: f64,

    #[arg(long)]
    pub has_partner: bool,
    #[arg(long, default_value_t = 33)]
    pub partner_age: u32,
    #[arg(long, default_value_t = 55)]
    pub partner_retire_age: u32,
    #[arg(long, help = "Partner has no independent income history")]
    pub partner_dependent: bool,
    #[arg(long, default_value_t = 0.0, help = "Partner annual income in man-yen")]
    pub partner_income: f64,
    #[arg(long, value_enum, default_value_t = CliPensionScheme::Employee)]
    pub partner_scheme: CliPensionScheme,
    #[arg(long, default_value_t = 0, help = "Partner earnings-linked years; 0 assumes 20")]
    pub partner_years: u32,

    #[arg(
        long = "fund",
        value_name = "ID=WEIGHT",
        value_parser = parse_allocation,
        default_values = ["orcan=70", "sp500=30"]
    )]
    pub funds: Vec<FundAllocation>,
    #[arg(long = "custom-fund", value_name = "ID:RATE:RISK", value_parser = parse_custom_fund)]
    pub custom_funds: Vec<Fund>,
    #[arg(long = "child", value_name = "BIRTH_YEAR[:KG,EL,JH,HS,UNIV]", value_parser = parse_child)]
    pub children: Vec<ChildProfile>,
    #[arg(long = "event", value_name = "YEAR:COST", value_parser = parse_event)]
    pub life_events: Vec<EventArg>,

    #[arg(long, help = "Annual gift per recipient in man-yen")]
    pub gift_amount: Option<f64>,
    #[arg(long, default_value_t = 2)]
    pub gift_people: u32,
    #[arg(long, default_value_t = 10)]
    pub gift_years: u32,
    #[arg(long, help = "Annual gift received in man-yen")]
    pub gift_receive_amount: Option<f64>,
    #[arg(long, default_value_t = 5)]
    pub gift_receive_years: u32,

    #[arg(long, help = "Parent's estate in man-yen")]
    pub inherit_amount: Option<f64>,
    #[arg(long)]
    pub inherit_year: Option<i32>,
    #[arg(long, default_value_t = 0)]
    pub inherit_siblings: u32,
    #[arg(long, help = "Parent's debt in man-yen")]
    pub inherit_debt: Option<f64>,
    #[arg(long, default_value_t = 50.0, help = "Share of the inheritance to invest, percent")]
    pub inherit_invest_ratio: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    current_year: Option<i32>,
    current_age: Option<u32>,
    retire_age: Option<u32>,
    life_expectancy: Option<u32>,

    invest_asset: Option<f64>,
    emergency_fund: Option<f64>,
    use_emergency_on_crash: Option<bool>,
    home_value: Option<f64>,
    home_loan: Option<f64>,

    monthly_invest: Option<f64>,
    annual_income: Option<f64>,
    income_is_gross: Option<bool>,
    annual_expense: Option<f64>,
    annual_withdraw: Option<f64>,
    side_income: Option<f64>,
    inflation_rate: Option<f64>,
    apply_tax: Option<bool>,

    pension_scheme: Option<ApiPensionScheme>,
    pension_start_age: Option<u32>,
    pension_years: Option<u32>,
    last_salary: Option<f64>,
    extension_years: Option<u32>,
    supplemental_pension: Option<bool>,
    dc_monthly: Option<f64>,
    dc_rate: Option<f64>,

    has_partner: Option<bool>,
    partner_age: Option<u32>,
    partner_retire_age: Option<u32>,
    partner_dependent: Option<bool>,
    partner_income: Option<f64>,
    partner_scheme: Option<ApiPensionScheme>,
    partner_years: Option<u32>,

    funds: Option<Vec<FundAllocation>>,
    custom_funds: Option<Vec<Fund>>,
    children: Option<Vec<ChildProfile>>,
    life_events: Option<Vec<EventArg>>,

    gift_amount: Option<f64>,
    gift_people: Option<u32>,
    gift_years: Option<u32>,
    gift_receive_amount: Option<f64>,
    gift_receive_years: Option<u32>,

    inherit_amount: Option<f64>,
    inherit_year: Option<i32>,
    inherit_siblings: Option<u32>,
    inherit_debt: Option<f64>,
    inherit_invest_ratio: Option<f64>,

    seed: Option<u64>,
}

/// Headline figures in man-yen alongside their display strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanSummary {
    blended_rate: f64,
    blended_risk: f64,
    final_survival_percent: f64,
    retirement_median_man: f64,
    final_median_man: f64,
    final_p10_man: f64,
    pension_annual_man: f64,
    pension_monthly_man: f64,
    dc_balance_man: f64,
    estate_at_death_man: f64,
    estate_tax_man: f64,
    safe_withdrawal_man: Option<f64>,
    safe_side_income_man: Option<f64>,
    display: DisplaySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplaySummary {
    retirement_median: String,
    final_median: String,
    estate_at_death: String,
    estate_tax: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    summary: PlanSummary,
    report: PlanReport,
}

#[derive(Debug, Serialize)]
struct FundsResponse<'a> {
    categories: Vec<&'a str>,
    funds: &'a [Fund],
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_profile(args: ProfileArgs) -> Result<HouseholdProfile, String> {
    if args.retire_age < args.current_age {
        return Err("--retire-age must be >= --current-age".to_string());
    }
    if args.life_expectancy <= args.retire_age {
        return Err("--life-expectancy must be > --retire-age".to_string());
    }
    if args.life_expectancy > MAX_AGE {
        return Err(format!("--life-expectancy must be <= {MAX_AGE}"));
    }

    for (name, value) in [
        ("--invest-asset", args.invest_asset),
        ("--emergency-fund", args.emergency_fund),
        ("--home-loan", args.home_loan),
        ("--monthly-invest", args.monthly_invest),
        ("--annual-income", args.annual_income),
        ("--annual-expense", args.annual_expense),
        ("--annual-withdraw", args.annual_withdraw),
        ("--side-income", args.side_income),
        ("--partner-income", args.partner_income),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }
    for (name, value) in [
        ("--home-value", args.home_value),
        ("--last-salary", args.last_salary),
        ("--dc-monthly", args.dc_monthly),
        ("--gift-amount", args.gift_amount),
        ("--gift-receive-amount", args.gift_receive_amount),
        ("--inherit-amount", args.inherit_amount),
        ("--inherit-debt", args.inherit_debt),
    ] {
        if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if !(-10.0..=20.0).contains(&args.inflation_rate) {
        return Err("--inflation-rate must be between -10 and 20".to_string());
    }
    if !args.dc_rate.is_finite() || args.dc_rate <= -100.0 {
        return Err("--dc-rate must be > -100".to_string());
    }
    if !(0.0..=100.0).contains(&args.inherit_invest_ratio) {
        return Err("--inherit-invest-ratio must be between 0 and 100".to_string());
    }
    if args.pension_start_age < 60 || args.pension_start_age > 75 {
        return Err("--pension-start-age must be between 60 and 75".to_string());
    }
    if args.has_partner && args.partner_retire_age < args.partner_age {
        return Err("--partner-retire-age must be >= --partner-age".to_string());
    }
    if args.has_partner && args.partner_retire_age > MAX_AGE {
        return Err(format!("--partner-retire-age must be <= {MAX_AGE}"));
    }
    for (name, years) in [
        ("--pension-years", args.pension_years),
        ("--extension-years", args.extension_years),
        ("--partner-years", args.partner_years),
    ] {
        if years > MAX_CONTRIBUTION_YEARS {
            return Err(format!("{name} must be <= {MAX_CONTRIBUTION_YEARS}"));
        }
    }
    for (name, count) in [
        ("--gift-people", args.gift_people),
        ("--gift-years", args.gift_years),
        ("--gift-receive-years", args.gift_receive_years),
        ("--inherit-siblings", args.inherit_siblings),
    ] {
        if count > MAX_YEARS_AHEAD {
            return Err(format!("{name} must be <= {MAX_YEARS_AHEAD}"));
        }
    }

    if args.funds.iter().any(|a| !a.weight.is_finite() || a.weight < 0.0) {
        return Err("--fund weights must be >= 0".to_string());
    }
    let total: f64 = args.funds.iter().map(|a| a.weight).sum();
    if (total - 100.0).abs() > 1e-9 {
        return Err(format!("--fund weights must total 100 (got {total})"));
    }
    for fund in &args.custom_funds {
        if !fund.rate.is_finite() || !fund.risk.is_finite() || fund.risk < 0.0 {
            return Err(format!("--custom-fund {} needs a finite rate and risk >= 0", fund.id));
        }
    }

    let current_year = args
        .current_year
        .unwrap_or_else(|| chrono::Local::now().year());
    if !(EARLIEST_YEAR..=LATEST_YEAR).contains(&current_year) {
        return Err(format!(
            "--current-year must be between {EARLIEST_YEAR} and {LATEST_YEAR}"
        ));
    }
    let last_year = current_year + MAX_YEARS_AHEAD as i32;

    for child in &args.children {
        if (child.birth_year as i64 - current_year as i64).abs() > CHILD_BIRTH_YEAR_SPAN {
            return Err(format!(
                "--child birth year {} must be within {CHILD_BIRTH_YEAR_SPAN} years of {current_year}",
                child.birth_year
            ));
        }
    }
    for event in &args.life_events {
        if !(current_year..=last_year).contains(&event.year) {
            return Err(format!(
                "--event year {} must be between {current_year} and {last_year}",
                event.year
            ));
        }
        if !event.cost.is_finite() {
            return Err("--event cost must be a finite number".to_string());
        }
    }

    let inheritance = match args.inherit_amount {
        Some(amount) => {
            let Some(year) = args.inherit_year else {
                return Err("--inherit-year is required when --inherit-amount is set".to_string());
            };
            if !(current_year..=last_year).contains(&year) {
                return Err(format!(
                    "--inherit-year must be between {current_year} and {last_year}"
                ));
            }
            Some(InheritanceReceipt {
                estate: to_yen(amount),
                year,
                siblings: args.inherit_siblings,
                debt: args.inherit_debt.map(to_yen),
                invest_ratio: args.inherit_invest_ratio / 100.0,
            })
        }
        None => None,
    };

    let (annual_income, salary_basis) = if args.income_is_gross {
        let gross = to_yen(args.annual_income);
        (gross_to_net(gross), Some(gross))
    } else {
        (to_yen(args.annual_income), None)
    };

    let partner = args.has_partner.then(|| {
        let (income, salary) = if args.income_is_gross {
            let gross = to_yen(args.partner_income);
            (gross_to_net(gross), Some(gross))
        } else {
            (to_yen(args.partner_income), None)
        };
        PartnerProfile {
            age: args.partner_age,
            retire_age: args.partner_retire_age,
            is_dependent: args.partner_dependent,
            income,
            salary,
            scheme: args.partner_scheme.into(),
            earnings_years: args.partner_years,
        }
    });

    Ok(HouseholdProfile {
        current_year,
        current_age: args.current_age,
        retire_age: args.retire_age,
        life_expectancy: args.life_expectancy,
        partner,
        investable_assets: to_yen(args.invest_asset),
        emergency_reserve: to_yen(args.emergency_fund),
        use_reserve_on_crash: args.use_emergency_on_crash,
        real_estate: args.home_value.map(|value| RealEstate {
            value: to_yen(value),
            loan: to_yen(args.home_loan),
        }),
        monthly_contribution: to_yen(args.monthly_invest),
        annual_income,
        annual_expense: to_yen(args.annual_expense),
        annual_withdrawal: to_yen(args.annual_withdraw),
        side_income: to_yen(args.side_income),
        inflation_rate: args.inflation_rate / 100.0,
        apply_capital_gains_tax: args.apply_tax,
        pension: PensionProfile {
            scheme: args.pension_scheme.into(),
            start_age: args.pension_start_age,
            earnings_years: args.pension_years,
            last_salary: args.last_salary.map(to_yen).or(salary_basis),
            extension_years: args.extension_years,
            supplemental: args.supplemental_pension,
            defined_contribution: args.dc_monthly.map(|monthly| DefinedContribution {
                monthly: to_yen(monthly),
                annual_rate: args.dc_rate / 100.0,
            }),
        },
        allocations: args.funds,
        custom_funds: args.custom_funds,
        children: args.children,
        gifts_given: args.gift_amount.map(|amount| GiftPlan {
            annual_amount: to_yen(amount),
            recipients: args.gift_people,
            years: args.gift_years,
        }),
        gifts_received: args.gift_receive_amount.map(|amount| GiftReceipt {
            annual_amount: to_yen(amount),
            years: args.gift_receive_years,
        }),
        inheritance,
        life_events: args
            .life_events
            .iter()
            .map(|event| LifeEvent {
                year: event.year,
                cost: to_yen(event.cost),
            })
            .collect(),
        seed: args.seed,
    })
}

/// Runs one plan from command-line arguments and renders the JSON response.
pub fn simulate_json(args: ProfileArgs) -> Result<String, String> {
    let profile = build_profile(args)?;
    let catalog = FundCatalog::with_custom(&profile.custom_funds);
    let report = run_plan(&profile, &catalog).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&build_simulate_response(report))
        .map_err(|e| format!("failed to serialize report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/funds", get(funds_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn funds_handler() -> Response {
    let catalog = FundCatalog::built_in();
    json_response(
        StatusCode::OK,
        FundsResponse {
            categories: catalog.categories(),
            funds: catalog.funds(),
        },
    )
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let profile = match profile_from_payload(payload) {
        Ok(profile) => profile,
        Err(msg) => {
            warn!(error = %msg, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let result = tokio::task::spawn_blocking(move || {
        let catalog = FundCatalog::with_custom(&profile.custom_funds);
        run_plan(&profile, &catalog)
    })
    .await;

    match result {
        Ok(Ok(report)) => json_response(StatusCode::OK, build_simulate_response(report)),
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            warn!(error = %e, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn profile_from_json(json: &str) -> Result<HouseholdProfile, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    profile_from_payload(payload)
}

fn profile_from_payload(payload: SimulatePayload) -> Result<HouseholdProfile, String> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.current_year {
        args.current_year = Some(v);
    }
    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.retire_age {
        args.retire_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        args.life_expectancy = v;
    }

    if let Some(v) = payload.invest_asset {
        args.invest_asset = v;
    }
    if let Some(v) = payload.emergency_fund {
        args.emergency_fund = v;
    }
    if let Some(v) = payload.use_emergency_on_crash {
        args.use_emergency_on_crash = v;
    }
    if payload.home_value.is_some() {
        args.home_value = payload.home_value;
    }
    if let Some(v) = payload.home_loan {
        args.home_loan = v;
    }

    if let Some(v) = payload.monthly_invest {
        args.monthly_invest = v;
    }
    if let Some(v) = payload.annual_income {
        args.annual_income = v;
    }
    if let Some(v) = payload.income_is_gross {
        args.income_is_gross = v;
    }
    if let Some(v) = payload.annual_expense {
        args.annual_expense = v;
    }
    if let Some(v) = payload.annual_withdraw {
        args.annual_withdraw = v;
    }
    if let Some(v) = payload.side_income {
        args.side_income = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.apply_tax {
        args.apply_tax = v;
    }

    if let Some(v) = payload.pension_scheme {
        args.pension_scheme = v.into();
    }
    if let Some(v) = payload.pension_start_age {
        args.pension_start_age = v;
    }
    if let Some(v) = payload.pension_years {
        args.pension_years = v;
    }
    if payload.last_salary.is_some() {
        args.last_salary = payload.last_salary;
    }
    if let Some(v) = payload.extension_years {
        args.extension_years = v;
    }
    if let Some(v) = payload.supplemental_pension {
        args.supplemental_pension = v;
    }
    if payload.dc_monthly.is_some() {
        args.dc_monthly = payload.dc_monthly;
    }
    if let Some(v) = payload.dc_rate {
        args.dc_rate = v;
    }

    if let Some(v) = payload.has_partner {
        args.has_partner = v;
    }
    if let Some(v) = payload.partner_age {
        args.partner_age = v;
    }
    if let Some(v) = payload.partner_retire_age {
        args.partner_retire_age = v;
    }
    if let Some(v) = payload.partner_dependent {
        args.partner_dependent = v;
    }
    if let Some(v) = payload.partner_income {
        args.partner_income = v;
    }
    if let Some(v) = payload.partner_scheme {
        args.partner_scheme = v.into();
    }
    if let Some(v) = payload.partner_years {
        args.partner_years = v;
    }

    if let Some(v) = payload.funds {
        args.funds = v;
    }
    if let Some(v) = payload.custom_funds {
        args.custom_funds = v;
    }
    if let Some(v) = payload.children {
        args.children = v;
    }
    if let Some(v) = payload.life_events {
        args.life_events = v;
    }

    if payload.gift_amount.is_some() {
        args.gift_amount = payload.gift_amount;
    }
    if let Some(v) = payload.gift_people {
        args.gift_people = v;
    }
    if let Some(v) = payload.gift_years {
        args.gift_years = v;
    }
    if payload.gift_receive_amount.is_some() {
        args.gift_receive_amount = payload.gift_receive_amount;
    }
    if let Some(v) = payload.gift_receive_years {
        args.gift_receive_years = v;
    }

    if payload.inherit_amount.is_some() {
        args.inherit_amount = payload.inherit_amount;
    }
    if payload.inherit_year.is_some() {
        args.inherit_year = payload.inherit_year;
    }
    if let Some(v) = payload.inherit_siblings {
        args.inherit_siblings = v;
    }
    if payload.inherit_debt.is_some() {
        args.inherit_debt = payload.inherit_debt;
    }
    if let Some(v) = payload.inherit_invest_ratio {
        args.inherit_invest_ratio = v;
    }

    if let Some(v) = payload.seed {
        args.seed = v;
    }

    build_profile(args)
}

fn default_args_for_api() -> ProfileArgs {
    ProfileArgs {
        current_year: None,
        current_age: 35,
        retire_age: 55,
        life_expectancy: 90,
        invest_asset: 1_000.0,
        emergency_fund: 300.0,
        use_emergency_on_crash: false,
        home_value: None,
        home_loan: 0.0,
        monthly_invest: 10.0,
        annual_income: 600.0,
        income_is_gross: false,
        annual_expense: 300.0,
        annual_withdraw: 240.0,
        side_income: 0.0,
        inflation_rate: 1.5,
        apply_tax: true,
        pension_scheme: CliPensionScheme::Employee,
        pension_start_age: 65,
        pension_years: 35,
        last_salary: None,
        extension_years: 0,
        supplemental_pension: false,
        dc_monthly: None,
        dc_rate: DEFAULT_DC_RATE * 100.0,
        has_partner: false,
        partner_age: 33,
        partner_retire_age: 55,
        partner_dependent: false,
        partner_income: 0.0,
        partner_scheme: CliPensionScheme::Employee,
        partner_years: 0,
        funds: vec![
            FundAllocation::new("orcan", 70.0),
            FundAllocation::new("sp500", 30.0),
        ],
        custom_funds: Vec::new(),
        children: Vec::new(),
        life_events: Vec::new(),
        gift_amount: None,
        gift_people: 2,
        gift_years: 10,
        gift_receive_amount: None,
        gift_receive_years: 5,
        inherit_amount: None,
        inherit_year: None,
        inherit_siblings: 0,
        inherit_debt: None,
        inherit_invest_ratio: 50.0,
        seed: 42,
    }
}

fn build_simulate_response(report: PlanReport) -> SimulateResponse {
    let man = |yen: f64| to_man(yen).round();
    let summary = PlanSummary {
        blended_rate: report.blend.rate,
        blended_risk: report.blend.risk,
        final_survival_percent: (report.final_survival_rate * 100.0).round(),
        retirement_median_man: man(report.retirement_median),
        final_median_man: man(report.post_retirement.final_median()),
        final_p10_man: man(report.post_retirement.final_p10()),
        pension_annual_man: man(report.pension.total_annual),
        pension_monthly_man: (to_man(report.pension.total_annual / 12.0) * 10.0).round() / 10.0,
        dc_balance_man: man(report.pension.primary.defined_contribution_balance),
        estate_at_death_man: man(report.estate.estate_at_death),
        estate_tax_man: man(report.estate.estate_tax),
        safe_withdrawal_man: report
            .safe_withdrawal
            .as_ref()
            .map(|r| to_man(r.solved_value).floor()),
        safe_side_income_man: report
            .safe_side_income
            .as_ref()
            .map(|r| to_man(r.solved_value).ceil()),
        display: DisplaySummary {
            retirement_median: format_yen(report.retirement_median),
            final_median: format_yen(report.post_retirement.final_median()),
            estate_at_death: format_yen(report.estate.estate_at_death),
            estate_tax: format_yen(report.estate.estate_tax),
        },
    };
    SimulateResponse { summary, report }
}

fn parse_allocation(raw: &str) -> Result<FundAllocation, String> {
    let (id, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=WEIGHT, got '{raw}'"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid weight in '{raw}'"))?;
    Ok(FundAllocation::new(id.trim(), weight))
}

fn parse_custom_fund(raw: &str) -> Result<Fund, String> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let [id, rate, risk] = parts.as_slice() else {
        return Err(format!("expected ID:RATE:RISK, got '{raw}'"));
    };
    let rate = rate
        .parse::<f64>()
        .map_err(|_| format!("invalid rate in '{raw}'"))?;
    let risk = risk
        .parse::<f64>()
        .map_err(|_| format!("invalid risk in '{raw}'"))?;
    Ok(Fund {
        id: id.to_string(),
        category: String::new(),
        name: id.to_string(),
        rate,
        risk,
        backtest: Default::default(),
        description: String::new(),
    })
}

fn parse_event(raw: &str) -> Result<EventArg, String> {
    let (year, cost) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected YEAR:COST, got '{raw}'"))?;
    Ok(EventArg {
        year: year
            .trim()
            .parse()
            .map_err(|_| format!("invalid year in '{raw}'"))?,
        cost: cost
            .trim()
            .parse()
            .map_err(|_| format!("invalid cost in '{raw}'"))?,
    })
}

fn parse_child(raw: &str) -> Result<ChildProfile, String> {
    let (year, tracks) = match raw.split_once(':') {
        Some((year, tracks)) => (year, Some(tracks)),
        None => (raw, None),
    };
    let birth_year = year
        .trim()
        .parse::<i32>()
        .map_err(|_| format!("invalid birth year in '{raw}'"))?;

    let mut schooling = SchoolingPlan::default();
    if let Some(tracks) = tracks {
        let parts: Vec<&str> = tracks.split(',').map(str::trim).collect();
        let [kg, el, jh, hs, univ] = parts.as_slice() else {
            return Err(format!(
                "expected 5 tracks (kindergarten to university) in '{raw}'"
            ));
        };
        schooling = SchoolingPlan {
            early_childhood: parse_school_track(kg)?,
            elementary: parse_school_track(el)?,
            junior_high: parse_school_track(jh)?,
            senior_high: parse_school_track(hs)?,
            university: parse_university_track(univ)?,
        };
    }
    Ok(ChildProfile {
        birth_year,
        schooling,
    })
}

fn parse_school_track(raw: &str) -> Result<SchoolTrack, String> {
    match raw {
        "public" => Ok(SchoolTrack::Public),
        "private" => Ok(SchoolTrack::Private),
        other => Err(format!("unknown school track '{other}' (public, private)")),
    }
}

fn parse_university_track(raw: &str) -> Result<UniversityTrack, String> {
    match raw {
        "public" => Ok(UniversityTrack::Public),
        "private" => Ok(UniversityTrack::Private),
        "science" => Ok(UniversityTrack::Science),
        "medical" => Ok(UniversityTrack::Medical),
        other => Err(format!(
            "unknown university track '{other}' (public, private, science, medical)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::MAN;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_args() -> ProfileArgs {
        ProfileArgs {
            current_year: Some(2025),
            ..default_args_for_api()
        }
    }

    #[test]
    fn build_profile_converts_display_units() {
        let profile = build_profile(sample_args()).expect("valid profile");
        assert_eq!(profile.current_year, 2025);
        assert_approx(profile.investable_assets, 1_000.0 * MAN);
        assert_approx(profile.emergency_reserve, 300.0 * MAN);
        assert_approx(profile.monthly_contribution, 10.0 * MAN);
        assert_approx(profile.inflation_rate, 0.015);
        assert_eq!(profile.pension.scheme, PensionScheme::EarningsLinked);
        assert!(profile.pension.defined_contribution.is_none());
        assert_eq!(profile.allocations.len(), 2);
    }

    #[test]
    fn build_profile_rejects_retirement_before_current_age() {
        let mut args = sample_args();
        args.retire_age = 30;
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--retire-age"));
    }

    #[test]
    fn build_profile_rejects_allocation_not_totalling_100() {
        let mut args = sample_args();
        args.funds = vec![FundAllocation::new("sp500", 60.0)];
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--fund"));
        assert!(err.contains("60"));
    }

    #[test]
    fn build_profile_requires_inheritance_year() {
        let mut args = sample_args();
        args.inherit_amount = Some(5_000.0);
        let err = build_profile(args).expect_err("must require year");
        assert!(err.contains("--inherit-year"));
    }

    #[test]
    fn build_profile_rejects_contribution_years_that_overflow_months() {
        let err = profile_from_json(r#"{"pensionYears": 400000000}"#).expect_err("must reject");
        assert!(err.contains("--pension-years"));

        let mut args = sample_args();
        args.extension_years = 61;
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--extension-years"));

        let mut args = sample_args();
        args.partner_years = u32::MAX;
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--partner-years"));

        let mut args = sample_args();
        args.pension_years = 60;
        assert!(build_profile(args).is_ok());
    }

    #[test]
    fn build_profile_rejects_years_far_from_today() {
        let err = profile_from_json(r#"{"currentYear": 2025, "children": [{"birthYear": 2147483647}]}"#)
            .expect_err("must reject");
        assert!(err.contains("--child"));

        let mut args = sample_args();
        args.children = vec![parse_child("1990").expect("valid child")];
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--child"));

        let mut args = sample_args();
        args.life_events = vec![EventArg {
            year: i32::MIN,
            cost: 100.0,
        }];
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--event"));

        let mut args = sample_args();
        args.life_events = vec![EventArg {
            year: 2145,
            cost: 100.0,
        }];
        assert!(build_profile(args).is_ok());

        let mut args = sample_args();
        args.inherit_amount = Some(5_000.0);
        args.inherit_year = Some(i32::MAX);
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--inherit-year"));

        let mut args = sample_args();
        args.current_year = Some(i32::MAX);
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--current-year"));
    }

    #[test]
    fn build_profile_rejects_oversized_counts() {
        let mut args = sample_args();
        args.inherit_siblings = u32::MAX;
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--inherit-siblings"));

        let mut args = sample_args();
        args.gift_years = 1_000;
        let err = build_profile(args).expect_err("must reject");
        assert!(err.contains("--gift-years"));
    }

    #[test]
    fn gross_income_becomes_net_and_salary_basis() {
        let mut args = sample_args();
        args.income_is_gross = true;
        args.annual_income = 700.0;
        args.has_partner = true;
        args.partner_income = 300.0;
        let profile = build_profile(args).expect("valid profile");
        assert_approx(profile.annual_income, 539.0 * MAN);
        assert_eq!(profile.pension.last_salary, Some(700.0 * MAN));
        let partner = profile.partner.expect("partner");
        assert_approx(partner.income, 249.0 * MAN);
        assert_eq!(partner.salary, Some(300.0 * MAN));
    }

    #[test]
    fn defined_contribution_uses_default_rate() {
        let mut args = sample_args();
        args.dc_monthly = Some(2.3);
        let profile = build_profile(args).expect("valid profile");
        let dc = profile.pension.defined_contribution.expect("dc set");
        assert_approx(dc.monthly, 23_000.0);
        assert_approx(dc.annual_rate, 0.04);
    }

    #[test]
    fn profile_from_json_parses_web_keys() {
        let json = r#"{
          "currentYear": 2030,
          "currentAge": 40,
          "retireAge": 60,
          "lifeExpectancy": 95,
          "investAsset": 2500,
          "emergencyFund": 100,
          "useEmergencyOnCrash": true,
          "homeValue": 4000,
          "homeLoan": 1500,
          "inflationRate": 2,
          "pensionScheme": "national",
          "funds": [{"fundId": "nasdaq", "weight": 40}, {"fundId": "mine", "weight": 60}],
          "customFunds": [{"id": "mine", "rate": 9, "risk": 21}],
          "children": [{"birthYear": 2028, "schooling": {"university": "medical"}}],
          "lifeEvents": [{"year": 2035, "cost": 300}],
          "giftAmount": 110,
          "inheritAmount": 8000,
          "inheritYear": 2045,
          "inheritSiblings": 1,
          "seed": 9
        }"#;
        let profile = profile_from_json(json).expect("json should parse");

        assert_eq!(profile.current_year, 2030);
        assert_eq!(profile.current_age, 40);
        assert_eq!(profile.life_expectancy, 95);
        assert_approx(profile.investable_assets, 2_500.0 * MAN);
        assert!(profile.use_reserve_on_crash);
        assert_approx(profile.net_real_estate(), 2_500.0 * MAN);
        assert_approx(profile.inflation_rate, 0.02);
        assert_eq!(profile.pension.scheme, PensionScheme::FlatRate);
        assert_eq!(profile.allocations[1].fund_id, "mine");
        assert_eq!(profile.custom_funds[0].rate, 9.0);
        assert_eq!(
            profile.children[0].schooling.university,
            UniversityTrack::Medical
        );
        assert_eq!(profile.life_events[0].cost, 300.0 * MAN);
        assert_eq!(profile.gifts_given.map(|g| g.recipients), Some(2));
        let inheritance = profile.inheritance.expect("inheritance");
        assert_eq!(inheritance.siblings, 1);
        assert_approx(inheritance.invest_ratio, 0.5);
        assert_eq!(profile.seed, 9);
    }

    #[test]
    fn profile_from_json_rejects_bad_payload() {
        let err = profile_from_json(r#"{"currentAge": "old"}"#).expect_err("must reject");
        assert!(err.contains("Invalid API JSON payload"));

        let err = profile_from_json(r#"{"annualExpense": -1}"#).expect_err("must reject");
        assert!(err.contains("--annual-expense"));
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "fire-compass",
            "--verbose",
            "simulate",
            "--current-year",
            "2025",
            "--fund",
            "sp500=60",
            "--fund",
            "bond=40",
            "--child",
            "2024:private,public,public,private,science",
            "--event",
            "2030:500",
            "--apply-tax",
            "false",
        ])
        .expect("flags parse");
        assert!(cli.verbose);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.funds.len(), 2);
        assert_eq!(args.children[0].schooling.early_childhood, SchoolTrack::Private);
        assert_eq!(args.children[0].schooling.university, UniversityTrack::Science);
        assert_eq!(args.life_events[0], EventArg { year: 2030, cost: 500.0 });
        assert!(!args.apply_tax);

        let profile = build_profile(args).expect("valid profile");
        assert!(!profile.apply_capital_gains_tax);
        assert_approx(profile.life_events[0].cost, 500.0 * MAN);
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let cli = Cli::try_parse_from(["fire-compass", "simulate"]).expect("flags parse");
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let from_cli = build_profile(ProfileArgs {
            current_year: Some(2025),
            ..args
        })
        .expect("valid profile");
        let from_api = build_profile(sample_args()).expect("valid profile");
        assert_eq!(from_cli, from_api);
        // net income without a salary basis; the pension falls back to it
        let expected = HouseholdProfile::default().revise(|p| p.pension.last_salary = None);
        assert_eq!(from_cli, expected);
    }

    #[test]
    fn cli_serve_takes_port() {
        let cli = Cli::try_parse_from(["fire-compass", "serve", "--port", "9000"]).expect("parse");
        assert!(matches!(cli.command, Command::Serve { port: 9000 }));
    }

    #[test]
    fn list_parsers_reject_malformed_values() {
        assert!(parse_allocation("sp500").is_err());
        assert!(parse_allocation("sp500=lots").is_err());
        assert!(parse_child("2020:public,public").is_err());
        assert!(parse_child("2020:public,public,public,public,online").is_err());
        assert!(parse_event("2030").is_err());
        assert!(parse_custom_fund("mine:9").is_err());
        let fund = parse_custom_fund("mine:9:21").expect("valid fund");
        assert_eq!((fund.rate, fund.risk), (9.0, 21.0));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let mut args = sample_args();
        args.current_age = 60;
        args.retire_age = 62;
        args.life_expectancy = 70;
        let profile = build_profile(args).expect("valid profile");
        let report = run_plan(&profile, &FundCatalog::built_in()).expect("plan runs");
        let response = build_simulate_response(report);

        assert_eq!(
            response.summary.pension_annual_man,
            to_man(response.report.pension.total_annual).round()
        );
        let json = serde_json::to_string(&response).expect("response should serialize");
        for key in [
            "\"summary\"",
            "\"report\"",
            "\"finalSurvivalPercent\"",
            "\"retirementMedianMan\"",
            "\"display\"",
            "\"preRetirement\"",
            "\"postRetirement\"",
            "\"survival\"",
            "\"lifecycle\"",
            "\"fire\"",
            "\"liquidTier\"",
            "\"percentile\"",
            "\"estateTax\"",
        ] {
            assert!(json.contains(key), "missing {key}");
        }
    }

    #[test]
    fn funds_response_lists_catalog() {
        let catalog = FundCatalog::built_in();
        let json = serde_json::to_string(&FundsResponse {
            categories: catalog.categories(),
            funds: catalog.funds(),
        })
        .expect("serialize");
        assert!(json.contains("\"orcan\""));
        assert!(json.contains("\"categories\""));
    }
}
