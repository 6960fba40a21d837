//! CausalPanel CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cp_estimators::{
    average_treatment_effect, cate_all_history, cate_matched_years, correlation_matrix,
    did_for_doctrine_year, fit_fe_model, significance_test, MatchedYears,
};
use cp_panel::{Column, Covariate, Outcome, Panel};

#[derive(Parser)]
#[command(name = "causalpanel")]
#[command(about = "CausalPanel - treatment-effect estimation for state crime panels")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

fn default_corr_columns() -> Vec<Column> {
    vec![
        Column::Post,
        Column::Outcome(Outcome::Homicide),
        Column::Outcome(Outcome::Robbery),
        Column::Outcome(Outcome::Larceny),
        Column::Outcome(Outcome::Assault),
        Column::Outcome(Outcome::Burglary),
        Column::Outcome(Outcome::Murder),
        Column::Covariate(Covariate::Unemployment),
        Column::Covariate(Covariate::LogPubWelfare),
        Column::Covariate(Covariate::LogPolice),
        Column::Covariate(Covariate::LogIncome),
        Column::Covariate(Covariate::Poverty),
        Column::Covariate(Covariate::BlackMale1524),
        Column::Covariate(Covariate::WhiteMale1524),
    ]
}

fn default_fit_covariates() -> Vec<Covariate> {
    vec![
        Covariate::Unemployment,
        Covariate::Poverty,
        Covariate::LogIncome,
        Covariate::LogPubWelfare,
        Covariate::LogPolice,
    ]
}

fn default_did_outcomes() -> Vec<Outcome> {
    vec![
        Outcome::Homicide,
        Outcome::Murder,
        Outcome::Robbery,
        Outcome::Larceny,
        Outcome::Assault,
    ]
}

#[derive(Subcommand)]
enum Commands {
    /// Pairwise-complete Pearson correlations over selected columns
    Corr {
        /// Input panel (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Columns to correlate (repeatable)
        #[arg(long = "column", default_values_t = default_corr_columns())]
        columns: Vec<Column>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Naive pooled pre/post ATE with a Welch significance test
    Ate {
        /// Input panel (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Outcome column
        #[arg(long, default_value = "homicide")]
        outcome: Outcome,

        /// Most recent observations per phase entering the t-test
        #[arg(long, default_value = "50")]
        sample_size: usize,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Per-state conditional average treatment effects
    Cate {
        /// Input panel (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Outcome column
        #[arg(long, default_value = "homicide")]
        outcome: Outcome,

        /// Matched-year mode: year whose phase flag defines the treated set
        #[arg(long, requires_all = ["pre_year", "post_year"])]
        treat_year: Option<i32>,

        /// Matched-year mode: calendar year for every pre-treatment mean
        #[arg(long, requires_all = ["treat_year", "post_year"])]
        pre_year: Option<i32>,

        /// Matched-year mode: calendar year for every post-treatment mean
        #[arg(long, requires_all = ["treat_year", "pre_year"])]
        post_year: Option<i32>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Four-cell difference-in-differences, one estimate per outcome
    Did {
        /// Input panel (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Outcome columns (repeatable)
        #[arg(long = "outcome", default_values_t = default_did_outcomes())]
        outcomes: Vec<Outcome>,

        /// Year whose phase flag partitions states into treated/control
        #[arg(long, default_value = "2010")]
        doctrine_year: i32,

        /// Reference pre year
        #[arg(long, default_value = "2005")]
        year_pre: i32,

        /// Reference post year
        #[arg(long, default_value = "2010")]
        year_post: i32,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fixed-effects OLS with cluster-robust standard errors
    Fit {
        /// Input panel (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Outcome column
        #[arg(long, default_value = "homicide")]
        outcome: Outcome,

        /// Covariate columns (repeatable)
        #[arg(long = "covariate", default_values_t = default_fit_covariates())]
        covariates: Vec<Covariate>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Corr { input, columns, output } => cmd_corr(&input, &columns, output.as_ref()),
        Commands::Ate { input, outcome, sample_size, output } => {
            cmd_ate(&input, outcome, sample_size, output.as_ref())
        }
        Commands::Cate { input, outcome, treat_year, pre_year, post_year, output } => {
            cmd_cate(&input, outcome, treat_year, pre_year, post_year, output.as_ref())
        }
        Commands::Did { input, outcomes, doctrine_year, year_pre, year_post, output } => {
            cmd_did(&input, &outcomes, doctrine_year, year_pre, year_post, output.as_ref())
        }
        Commands::Fit { input, outcome, covariates, output } => {
            cmd_fit(&input, outcome, &covariates, output.as_ref())
        }
    }
}

fn load_panel(input: &PathBuf) -> Result<Panel> {
    let panel = cp_panel::from_csv_path(input)
        .with_context(|| format!("failed to load panel from {}", input.display()))?;
    tracing::info!(
        rows = panel.len(),
        states = panel.states().len(),
        years = panel.years().len(),
        "panel loaded"
    );
    Ok(panel)
}

fn cmd_corr(input: &PathBuf, columns: &[Column], output: Option<&PathBuf>) -> Result<()> {
    let panel = load_panel(input)?;
    let matrix = correlation_matrix(&panel, columns);
    write_json(output, serde_json::json!({ "correlation": matrix }))
}

fn cmd_ate(
    input: &PathBuf,
    outcome: Outcome,
    sample_size: usize,
    output: Option<&PathBuf>,
) -> Result<()> {
    let panel = load_panel(input)?;
    let ate = average_treatment_effect(&panel, outcome)?;
    let test = significance_test(&panel, outcome, sample_size)?;
    tracing::info!(outcome = %outcome, ate, t_stat = test.t_stat, "naive ATE computed");
    write_json(
        output,
        serde_json::json!({
            "outcome": outcome,
            "ate": ate,
            "significance": test,
        }),
    )
}

fn cmd_cate(
    input: &PathBuf,
    outcome: Outcome,
    treat_year: Option<i32>,
    pre_year: Option<i32>,
    post_year: Option<i32>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let panel = load_panel(input)?;
    let value = match (treat_year, pre_year, post_year) {
        (Some(treat_year), Some(pre_year), Some(post_year)) => {
            let years = MatchedYears { treat_year, pre_year, post_year };
            let res = cate_matched_years(&panel, outcome, years)?;
            tracing::info!(outcome = %outcome, cate = res.cate, "matched-year CATE computed");
            serde_json::json!({ "outcome": outcome, "mode": "matched-year", "years": years, "result": res })
        }
        _ => {
            let res = cate_all_history(&panel, outcome)?;
            tracing::info!(outcome = %outcome, cate = res.cate, "all-history CATE computed");
            serde_json::json!({ "outcome": outcome, "mode": "all-history", "result": res })
        }
    };
    write_json(output, value)
}

fn cmd_did(
    input: &PathBuf,
    outcomes: &[Outcome],
    doctrine_year: i32,
    year_pre: i32,
    year_post: i32,
    output: Option<&PathBuf>,
) -> Result<()> {
    let panel = load_panel(input)?;
    let mut results = serde_json::Map::new();
    for &outcome in outcomes {
        let res = did_for_doctrine_year(&panel, outcome, doctrine_year, year_pre, year_post)?;
        tracing::info!(outcome = %outcome, estimate = res.estimate, "DiD computed");
        results.insert(outcome.name().to_string(), serde_json::to_value(&res)?);
    }
    write_json(
        output,
        serde_json::json!({
            "doctrine_year": doctrine_year,
            "year_pre": year_pre,
            "year_post": year_post,
            "did": results,
        }),
    )
}

fn cmd_fit(
    input: &PathBuf,
    outcome: Outcome,
    covariates: &[Covariate],
    output: Option<&PathBuf>,
) -> Result<()> {
    let panel = load_panel(input)?;
    let fit = fit_fe_model(&panel, outcome, covariates)?;
    if let Some(post) = fit.coefficient("post") {
        tracing::info!(
            outcome = %outcome,
            estimate = post.estimate,
            std_error = post.std_error,
            "fixed-effects fit complete"
        );
    }
    write_json(output, serde_json::json!({ "outcome": outcome, "fit": fit }))
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
