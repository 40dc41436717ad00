//! Embodia CLI - embodied carbon, GHG scopes and compliance from the terminal

// Output invariants:
// - Results go to stdout, logs and errors to stderr
// - Identical input yields byte-for-byte identical JSON output

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

use carbon_core::calculations::scopes::WasteDiversion;
use carbon_core::calculations::{
    aggregate_project_lca, carbon_intensity, CrossCheckPolicy, EmissionsSummary, MaterialEntry, ProjectLcaResult,
};
use carbon_core::compliance::{classify, ClassificationInput, CompanySize, ProjectType, StandardReport};
use carbon_core::file_io::{load_project_with_lock_check, save_project, FileLock};
use carbon_core::narrative::{NarrativeWriter, TemplateNarrative};
use carbon_core::registry::{EmissionFactorRegistry, Factor, FactorKind, FactorSource, LayeredSource, MaterialCatalog};
use carbon_core::units::{KgCo2e, SquareMeters};
use carbon_core::{Advisory, CalcError, EngineConfig, ProjectComplianceReport};

#[derive(Parser)]
#[command(name = "embodia")]
#[command(about = "Embodied carbon, GHG scope totals and building compliance classification")]
#[command(version)]
struct Cli {
    /// Path to config file (default: embodia.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Life-cycle assessment of a bill of materials (JSON array of entries)
    Lca {
        /// Path to materials JSON
        materials: PathBuf,

        /// Design life in years (overrides config file)
        #[arg(long)]
        design_life: Option<f64>,

        /// Extra material factors (JSON array), consulted after the built-in table
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Gross floor area in m², to report carbon intensity
        #[arg(long)]
        floor_area: Option<f64>,

        /// fail or flag (overrides config file)
        #[arg(long)]
        cross_check: Option<String>,
    },
    /// Classify a carbon intensity against every standard
    Classify {
        /// kg CO2-e per m²
        #[arg(long)]
        intensity: f64,

        /// residential, commercial, industrial or infrastructure
        #[arg(long)]
        project_type: String,

        /// Gross floor area in m²
        #[arg(long)]
        floor_area: f64,

        /// Total kg CO2-e (default: intensity × floor area)
        #[arg(long)]
        total_carbon: Option<f64>,

        /// large, medium or small (overrides config file)
        #[arg(long)]
        company_size: Option<String>,

        /// Recycled content of the bill of materials, percent
        #[arg(long)]
        recycled_content: Option<f64>,
    },
    /// Evaluate a saved project: compliance, Scope 1/2/3 totals and advisories
    Report {
        /// Path to .emb project file
        project: PathBuf,

        /// Append the written narrative
        #[arg(long)]
        narrative: bool,

        /// Store the refreshed totals back into the project file
        #[arg(long)]
        save: bool,
    },
    /// List built-in emission factors
    Factors {
        /// Factor kind (material, fuel, equipment, grid, ...)
        #[arg(long)]
        kind: Option<String>,

        /// Key category (e.g. concrete, earthmoving)
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(calc) = e.downcast_ref::<CalcError>() {
                if let Ok(json) = serde_json::to_string(calc) {
                    eprintln!("{json}");
                }
            }
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config = EngineConfig::resolve(cli.config.as_deref(), &cwd).context("failed to load config")?;
    if let Some(path) = &config.source_path {
        tracing::info!(path = %path.display(), "using config file");
    }

    match cli.command {
        Commands::Lca {
            materials,
            design_life,
            catalog,
            floor_area,
            cross_check,
        } => {
            let policy = match cross_check {
                Some(s) => CrossCheckPolicy::from_str_flexible(&s)?,
                None => config.cross_check,
            };
            run_lca(
                &materials,
                catalog.as_deref(),
                design_life.unwrap_or(config.design_life_years),
                floor_area,
                policy,
                cli.format,
            )
        }
        Commands::Classify {
            intensity,
            project_type,
            floor_area,
            total_carbon,
            company_size,
            recycled_content,
        } => {
            let company_size = match company_size {
                Some(s) => CompanySize::from_str_flexible(&s)?,
                None => config.company_size,
            };
            let input = classification_input(
                intensity,
                ProjectType::from_str_flexible(&project_type)?,
                floor_area,
                total_carbon,
                company_size,
                recycled_content,
            )?;
            let reports = classify(&input);
            match cli.format {
                OutputFormat::Json => print_json(&reports),
                OutputFormat::Text => {
                    for report in &reports {
                        print_standard(report);
                    }
                    Ok(())
                }
            }
        }
        Commands::Report {
            project,
            narrative,
            save,
        } => run_report(&project, narrative, save, &config, cli.format),
        Commands::Factors { kind, category } => run_factors(kind.as_deref(), category.as_deref(), cli.format),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// lca
// ============================================================================

#[derive(Serialize)]
struct LcaOutput<'a> {
    #[serde(flatten)]
    lca: &'a ProjectLcaResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    carbon_intensity: Option<f64>,
}

fn run_lca(
    materials_path: &Path,
    catalog_path: Option<&Path>,
    design_life: f64,
    floor_area: Option<f64>,
    policy: CrossCheckPolicy,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(materials_path)
        .with_context(|| format!("failed to read materials: {}", materials_path.display()))?;
    let entries: Vec<MaterialEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid materials JSON: {}", materials_path.display()))?;

    let layered;
    let source: &dyn FactorSource = match catalog_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog: {}", path.display()))?;
            let catalog = MaterialCatalog::from_json(&json)
                .with_context(|| format!("invalid catalog: {}", path.display()))?;
            tracing::info!(records = catalog.len(), "loaded material catalog");
            layered = LayeredSource::new(EmissionFactorRegistry::builtin(), catalog);
            &layered
        }
        None => EmissionFactorRegistry::builtin(),
    };

    let lca = aggregate_project_lca(&entries, source, design_life, policy)?;
    let intensity = match floor_area {
        Some(area) => Some(carbon_intensity(lca.embodied_carbon, SquareMeters(area))?),
        None => None,
    };

    if format == OutputFormat::Json {
        return print_json(&LcaOutput {
            lca: &lca,
            carbon_intensity: intensity,
        });
    }

    println!("Life-cycle assessment ({design_life} year design life)");
    println!();
    println!("{:<32} {:>14} {:>14} {:>14}", "Material", "A1-A5 kg", "Whole life kg", "Net kg");
    for m in &lca.materials {
        println!(
            "{:<32} {:>14.1} {:>14.1} {:>14.1}",
            m.material_name, m.embodied_carbon.0, m.whole_life_carbon.0, m.net_carbon.0
        );
    }
    println!();
    println!("A1-A3   {:>14.1} kg CO2-e", lca.a1a3_total.0);
    println!("A4-A5   {:>14.1} kg CO2-e", lca.a4a5_total.0);
    println!("B1-B7   {:>14.1} kg CO2-e", lca.b1b7_total.0);
    println!("C1-C4   {:>14.1} kg CO2-e", lca.c1c4_total.0);
    println!("D       {:>14.1} kg CO2-e", lca.d_total.0);
    println!("Embodied    {:>10.1} kg CO2-e", lca.embodied_carbon.0);
    println!("Whole life  {:>10.1} kg CO2-e", lca.whole_life_carbon.0);
    println!("Net         {:>10.1} kg CO2-e", lca.net_carbon.0);
    if let Some(intensity) = intensity {
        println!("Intensity   {intensity:>10.1} kg CO2-e/m²");
    }
    for flagged in &lca.flagged {
        println!();
        println!(
            "EXCLUDED entry {} ({}): {}",
            flagged.entry_index, flagged.material_id, flagged.reason
        );
    }
    Ok(())
}

// ============================================================================
// classify / report
// ============================================================================

fn classification_input(
    intensity: f64,
    project_type: ProjectType,
    floor_area: f64,
    total_carbon: Option<f64>,
    company_size: CompanySize,
    recycled_content: Option<f64>,
) -> anyhow::Result<ClassificationInput> {
    let input = ClassificationInput {
        carbon_intensity: intensity,
        project_type,
        floor_area: SquareMeters(floor_area),
        total_carbon: KgCo2e(total_carbon.unwrap_or(intensity * floor_area)),
        company_size: Some(company_size),
        recycled_content_pct: recycled_content,
    };
    input.validate()?;
    Ok(input)
}

fn print_standard(report: &StandardReport) {
    let status = if report.compliant { "PASS" } else { "FAIL" };
    println!("{} [{status}]", report.standard_name);
    println!("  Rating:    {}", report.rating_tier);
    println!("  Benchmark: {}", report.benchmark_used);
    for (name, value) in &report.metrics {
        println!("  {name}: {value:.2}");
    }
    for recommendation in &report.recommendations {
        println!("  - {recommendation}");
    }
    println!();
}

fn print_compliance(report: &ProjectComplianceReport) {
    println!("{} ({})", report.project_name, report.project_type);
    println!(
        "Embodied carbon {:.0} kg CO2-e over {:.0} m² = {:.1} kg CO2-e/m² ({})",
        report.total_carbon.0, report.floor_area.0, report.carbon_intensity, report.industry_percentile
    );
    println!(
        "Overall: {}",
        if report.overall_compliant { "COMPLIANT" } else { "NON-COMPLIANT" }
    );
    println!();
    for standard in &report.standards {
        print_standard(standard);
    }
}

fn print_emissions(emissions: &EmissionsSummary, waste: Option<&WasteDiversion>) {
    println!("GHG emissions (t CO2-e)");
    for totals in [&emissions.scope1, &emissions.scope2, &emissions.scope3] {
        println!(
            "  {}  {:>12.3}  {:>5.1}%  ({} entries)",
            totals.scope, totals.total.0, totals.percentage_of_grand_total, totals.entry_count
        );
        for (category, tonnes) in &totals.by_category {
            println!("    {:<24} {:>12.3}", category.display_name(), tonnes.0);
        }
    }
    println!("  Total    {:>12.3}", emissions.grand_total.0);
    if let Some(waste) = waste {
        println!(
            "  Waste diverted from landfill: {:.1}% of {:.1} t (target {:.0}%)",
            waste.diversion_pct, waste.total_tonnes, waste.target_pct
        );
    }
    println!();
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    report: &'a ProjectComplianceReport,
    emissions: &'a EmissionsSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    waste_diversion: Option<&'a WasteDiversion>,
    advisories: &'a [Advisory],
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative: Option<String>,
}

fn run_report(
    path: &Path,
    narrative: bool,
    save: bool,
    config: &EngineConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let (mut project, holder) = load_project_with_lock_check(path)
        .with_context(|| format!("failed to load project: {}", path.display()))?;
    if let Some(holder) = &holder {
        tracing::warn!(
            user = %holder.user_id,
            machine = %holder.machine,
            "project is open elsewhere; treating as read-only"
        );
    }

    let registry = EmissionFactorRegistry::builtin();
    let totals = if save {
        let _lock = FileLock::acquire(path, whoami::username()).context("cannot save project")?;
        let totals = project.refresh_totals(registry, config.cross_check)?.clone();
        save_project(&project, path)?;
        totals
    } else {
        project.evaluate(registry, config.cross_check)?
    };
    let report = &totals.compliance;
    let prose = narrative
        .then(|| TemplateNarrative.narrate_checked(report))
        .transpose()?;

    match format {
        OutputFormat::Json => print_json(&ReportOutput {
            report,
            emissions: &totals.emissions,
            waste_diversion: totals.waste_diversion.as_ref(),
            advisories: &totals.advisories,
            narrative: prose,
        }),
        OutputFormat::Text => {
            print_compliance(report);
            print_emissions(&totals.emissions, totals.waste_diversion.as_ref());
            if !totals.advisories.is_empty() {
                println!("Advisories");
                for advisory in &totals.advisories {
                    println!("  - {advisory}");
                }
                println!();
            }
            if let Some(prose) = prose {
                println!("{prose}");
            }
            Ok(())
        }
    }
}

// ============================================================================
// factors
// ============================================================================

fn parse_kind(s: &str) -> anyhow::Result<FactorKind> {
    let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .with_context(|| format!("unknown factor kind: {s}"))
}

fn describe(factor: &Factor) -> String {
    match factor {
        Factor::Material(m) => format!(
            "{} kg CO2-e/{} ({})",
            m.embodied_carbon_per_unit,
            m.unit.symbol(),
            m.name
        ),
        Factor::Fuel(f) => format!("{} kg CO2-e/{}", f.kg_co2e_per_unit, f.basis.symbol()),
        Factor::Equipment(rate) | Factor::Vehicle(rate) => {
            format!("{} per unit of use ({})", rate.per_unit, rate.fuel.code())
        }
        Factor::Refrigerant(gwp) => format!("GWP {gwp}"),
        Factor::Grid(kg) => format!("{kg} kg CO2-e/kWh"),
        Factor::SiteFacility(kwh) => format!("{kwh} kWh/day"),
        Factor::Transport(kg) => format!("{kg} kg CO2-e/t.km"),
        Factor::Waste(kg) => format!("{kg} kg CO2-e/t"),
        Factor::Water(kg) => format!("{kg} kg CO2-e/kL"),
        Factor::Commuting(kg) => format!("{kg} kg CO2-e/passenger.km"),
        Factor::TemporaryWorks(t) => format!(
            "{} kg CO2-e/m² over {} uses",
            t.embodied_kg_per_m2, t.typical_reuses
        ),
    }
}

#[derive(Serialize)]
struct FactorRow<'a> {
    key: String,
    #[serde(flatten)]
    factor: &'a Factor,
}

fn run_factors(kind: Option<&str>, category: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let kind = kind.map(parse_kind).transpose()?;
    let category = category.map(|c| c.trim().to_lowercase());

    let rows: Vec<_> = EmissionFactorRegistry::builtin()
        .iter()
        .filter(|(key, _)| kind.map_or(true, |k| key.kind == k))
        .filter(|(key, _)| category.is_none() || key.category == category)
        .collect();

    match format {
        OutputFormat::Json => print_json(
            &rows
                .iter()
                .map(|(key, factor)| FactorRow {
                    key: key.to_string(),
                    factor,
                })
                .collect::<Vec<_>>(),
        ),
        OutputFormat::Text => {
            for (key, factor) in &rows {
                println!("{:<44} {}", key.to_string(), describe(factor));
            }
            println!("\n{} factors", rows.len());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_field(err: anyhow::Error) -> String {
        match err.downcast::<CalcError>() {
            Ok(CalcError::InvalidInput { field, .. }) => field,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classification_input_defaults_total() {
        let input =
            classification_input(450.0, ProjectType::Commercial, 2_000.0, None, CompanySize::Large, None).unwrap();
        assert_eq!(input.total_carbon, KgCo2e(900_000.0));
        assert_eq!(input.company_size, Some(CompanySize::Large));
    }

    #[test]
    fn test_classification_input_rejects_bad_values() {
        let build = |intensity: f64, area: f64| {
            classification_input(intensity, ProjectType::Residential, area, None, CompanySize::Medium, None)
        };
        assert_eq!(error_field(build(400.0, 0.0).unwrap_err()), "floor_area");
        assert_eq!(error_field(build(400.0, -15.0).unwrap_err()), "floor_area");
        assert_eq!(error_field(build(f64::NAN, 1_000.0).unwrap_err()), "carbon_intensity");
    }

    #[test]
    fn test_report_json_carries_scopes_and_diversion() {
        use carbon_core::registry::WasteMethod;
        use carbon_core::Project;

        let registry = EmissionFactorRegistry::builtin();
        let mut project = Project::new("Depot", "26-090", "Assessor");
        project.settings.floor_area = SquareMeters(500.0);
        let mut session = project.session(registry);
        session.add_electricity("nsw", 2_000.0, 0.0).unwrap();
        session.add_waste_stream(WasteMethod::Landfill, 5.0, "").unwrap();
        project.store_session(&session);
        let totals = project.evaluate(registry, CrossCheckPolicy::Flag).unwrap();

        let value = serde_json::to_value(ReportOutput {
            report: &totals.compliance,
            emissions: &totals.emissions,
            waste_diversion: totals.waste_diversion.as_ref(),
            advisories: &totals.advisories,
            narrative: None,
        })
        .unwrap();

        assert!(value["emissions"]["scope2"]["total"].as_f64().unwrap() > 0.0);
        assert_eq!(value["waste_diversion"]["diversion_pct"], 0.0);
        assert_eq!(value["advisories"][0]["type"], "waste_diversion_below_target");
        assert!(value.get("narrative").is_none());
    }
}
