//! Practice directory CLI
//!
//! Browses the joined practice data and views or edits the organisation
//! charts stored in the organisation document.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use practice_directory::org::{self, parse_reports, reports_of, DeleteMode, RoleInfo};
use practice_directory::practice::{self, read_name_list, PracticeRecord};
use practice_directory::{DirectoryConfig, OrgManager, PracticeDirectory};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "practice-dir", version, about = "Practice directory CLI")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "PRACTICE_DIR_CONFIG")]
    config: Option<PathBuf>,

    /// Practice table (CSV), overrides the configuration
    #[arg(long, global = true)]
    practices: Option<PathBuf>,

    /// Coordinates table (CSV), overrides the configuration
    #[arg(long, global = true)]
    coordinates: Option<PathBuf>,

    /// Organisation document (JSON), overrides the configuration
    #[arg(long, global = true)]
    org_document: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up practices and produce reports
    Practices {
        #[command(subcommand)]
        command: PracticeCommand,
    },
    /// View and edit organisation charts
    Org {
        #[command(subcommand)]
        command: OrgCommand,
    },
}

#[derive(Subcommand)]
enum PracticeCommand {
    /// Filter practices by name prefix, free-text criteria or a name list
    Search {
        /// List practice names starting with these letters
        #[arg(long)]
        prefix: Option<String>,

        /// Free-text criterion; every criterion must match
        #[arg(long = "criterion")]
        criteria: Vec<String>,

        /// CSV file whose first column lists practice names
        #[arg(long)]
        names_file: Option<PathBuf>,

        /// Columns to output (comma-separated, default all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Show details for one practice
    Show { name: String },
    /// Acquisition reports
    Report {
        #[command(subcommand)]
        report: ReportCommand,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Acquisitions per year
    Years,
    /// Acquisitions per month of a year
    Months { year: i32 },
    /// Practices acquired in a year
    Year { year: i32 },
    /// Practices without an acquisition date
    NoDate,
}

#[derive(Subcommand)]
enum OrgCommand {
    /// Show a practice's chart
    Show {
        practice: String,
        /// Print Graphviz DOT instead
        #[arg(long)]
        dot: bool,
    },
    /// Walk the chart from a role
    Traverse { practice: String, role: String },
    /// List reports that name missing roles
    Validate { practice: String },
    /// Add a role (overwrites an existing role of the same name)
    Add {
        practice: String,
        role: String,
        holder: String,
        /// Comma-separated related roles
        #[arg(long, default_value = "")]
        reports: String,
    },
    /// Replace the holder and reports of an existing role
    Edit {
        practice: String,
        role: String,
        holder: String,
        #[arg(long, default_value = "")]
        reports: String,
    },
    /// Delete a role
    Delete {
        practice: String,
        role: String,
        /// Also remove the role from other roles' reports
        #[arg(long)]
        cascade: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Practices { command } => {
            let (directory, _warnings) = PracticeDirectory::load(&config)
                .context("failed to load practice data")?;
            run_practices(&directory, command, cli.format)
        }
        Commands::Org { command } => run_org(&config, command, cli.format),
    }
}

fn load_config(cli: &Cli) -> Result<DirectoryConfig> {
    let mut config = match &cli.config {
        Some(path) => DirectoryConfig::from_yaml_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => DirectoryConfig::default(),
    };
    if let Some(path) = &cli.practices {
        config.practices_path = path.clone();
    }
    if let Some(path) = &cli.coordinates {
        config.coordinates_path = path.clone();
    }
    if let Some(path) = &cli.org_document {
        config.org_document_path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_practices(
    directory: &PracticeDirectory,
    command: PracticeCommand,
    format: OutputFormat,
) -> Result<()> {
    match command {
        PracticeCommand::Search {
            prefix,
            criteria,
            names_file,
            columns,
        } => {
            if let Some(prefix) = prefix {
                for name in directory.names_with_prefix(&prefix) {
                    println!("{}", name);
                }
                return Ok(());
            }

            let records = if let Some(path) = names_file {
                let names = read_name_list(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                directory.select_names(&names)
            } else {
                match directory.search(&criteria) {
                    Some(records) => records,
                    None => bail!("give --prefix, --criterion or --names-file"),
                }
            };

            let columns = if columns.is_empty() {
                directory.columns().to_vec()
            } else {
                columns
            };
            print_records(&records, &columns, format)
        }
        PracticeCommand::Show { name } => {
            let Some(record) = directory.find(&name) else {
                bail!("no practice named '{}'", name);
            };
            print_details(record, format)
        }
        PracticeCommand::Report { report } => run_report(directory.records(), report, format),
    }
}

fn run_report(
    records: &[PracticeRecord],
    report: ReportCommand,
    format: OutputFormat,
) -> Result<()> {
    match report {
        ReportCommand::Years => {
            let by_year = practice::acquisitions_by_year(records);
            let rows: Vec<Vec<String>> = by_year
                .iter()
                .map(|(year, count)| vec![year.to_string(), count.to_string()])
                .collect();
            print_rows(&["Year", "Acquisitions"], &rows, format)
        }
        ReportCommand::Months { year } => {
            let rows: Vec<Vec<String>> = practice::acquisitions_by_month(records, year)
                .into_iter()
                .map(|m| vec![m.month.to_string(), m.count.to_string()])
                .collect();
            print_rows(&["Month", "Count"], &rows, format)
        }
        ReportCommand::Year { year } => {
            print_acquisitions(&practice::acquisitions_in_year(records, year), format)
        }
        ReportCommand::NoDate => {
            print_acquisitions(&practice::without_acquisition_date(records), format)
        }
    }
}

fn run_org(config: &DirectoryConfig, command: OrgCommand, format: OutputFormat) -> Result<()> {
    let mut manager =
        OrgManager::from_config(config).context("failed to load organisation document")?;

    match command {
        OrgCommand::Show { practice, dot } => {
            let Some(chart) = manager.get_chart(&practice) else {
                println!("No organisational structure data available for this practice.");
                return Ok(());
            };
            let graph = org::render_graph(chart);
            if dot {
                print!("{}", graph.to_dot());
            } else if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&graph.to_json())?);
            } else {
                let rows: Vec<Vec<String>> = chart
                    .roles()
                    .map(|(role, info)| role_row(role, info))
                    .collect();
                print_rows(&["Role", "Name", "Reports"], &rows, format)?;
            }
        }
        OrgCommand::Traverse { practice, role } => {
            let chart = manager.store().require_chart(&practice)?;
            if reports_of(chart, &role).is_none() {
                bail!("role '{}' not found for '{}'", role, practice);
            }
            let rows: Vec<Vec<String>> = org::traverse(chart, &role)
                .map(|(role, info)| role_row(role, info))
                .collect();
            print_rows(&["Role", "Name", "Reports"], &rows, format)?;
        }
        OrgCommand::Validate { practice } => {
            let chart = manager.store().require_chart(&practice)?;
            let dangling = chart.dangling_reports();
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&dangling)?);
            } else if dangling.is_empty() {
                println!("No dangling references.");
            } else {
                let rows: Vec<Vec<String>> = dangling
                    .iter()
                    .map(|d| vec![d.role.clone(), d.target.clone()])
                    .collect();
                print_rows(&["Role", "Missing report target"], &rows, format)?;
            }
        }
        OrgCommand::Add {
            practice,
            role,
            holder,
            reports,
        } => {
            manager.add_role(&practice, &role, &holder, parse_reports(&reports))?;
            println!("Added {} to {}", role, practice);
        }
        OrgCommand::Edit {
            practice,
            role,
            holder,
            reports,
        } => {
            manager.edit_role(&practice, &role, &holder, parse_reports(&reports))?;
            println!("Updated {} in {}", role, practice);
        }
        OrgCommand::Delete {
            practice,
            role,
            cascade,
        } => {
            let mode = if cascade {
                DeleteMode::Cascade
            } else {
                DeleteMode::Preserve
            };
            manager.delete_role(&practice, &role, mode)?;
            println!("Deleted {} from {}", role, practice);
        }
    }

    Ok(())
}

fn print_records(
    records: &[&PracticeRecord],
    columns: &[String],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            practice::export_csv(std::io::stdout().lock(), records.iter().copied(), columns)?;
        }
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    let object: serde_json::Map<String, serde_json::Value> = columns
                        .iter()
                        .map(|c| (c.clone(), r.column_value(c).into()))
                        .collect();
                    serde_json::Value::Object(object)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| columns.iter().map(|c| r.column_value(c).to_string()).collect())
                .collect();
            let header: Vec<&str> = columns.iter().map(String::as_str).collect();
            print_rows(&header, &rows, format)?;
        }
    }
    Ok(())
}

fn print_details(record: &PracticeRecord, format: OutputFormat) -> Result<()> {
    let info = [
        ("Practice Name", record.name.clone()),
        ("Address", record.full_address.clone()),
        ("Legal Entity", record.legal_entity().unwrap_or_default().to_string()),
        ("Company No", record.company_number().unwrap_or_default().to_string()),
        ("VAT Number", record.vat_number().unwrap_or_default().to_string()),
        ("Acquisition date", record.acquisition_display()),
        ("Country", record.country().unwrap_or_default().to_string()),
        ("Telephone No", record.telephone().unwrap_or_default().to_string()),
        (
            "Website",
            if record.website.is_empty() {
                "N/A".to_string()
            } else {
                record.website.clone()
            },
        ),
        ("Practice email", record.email().unwrap_or_default().to_string()),
        ("Group Shares (%)", record.group_shares().unwrap_or_default().to_string()),
        (
            "Location",
            format!("{}, {}", record.coordinates.latitude, record.coordinates.longitude),
        ),
    ];
    let management = record.management_details();

    if format == OutputFormat::Json {
        let mut object = serde_json::Map::new();
        for (label, value) in info.iter() {
            object.insert(label.to_string(), value.clone().into());
        }
        for (label, value) in &management {
            object.insert(label.clone(), value.clone().into());
        }
        println!("{}", serde_json::to_string_pretty(&object)?);
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = info
        .iter()
        .map(|(label, value)| vec![label.to_string(), value.clone()])
        .collect();
    rows.extend(management.into_iter().map(|(label, value)| vec![label, value]));
    print_rows(&["Field", "Value"], &rows, format)
}

fn print_acquisitions(rows: &[practice::AcquisitionRow], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| vec![r.practice_name.clone(), r.acquisition_date.clone(), r.country.clone()])
        .collect();
    print_rows(&["Practice Name", "Acquisition date", "Country"], &rows, format)
}

fn print_rows(header: &[&str], rows: &[Vec<String>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let objects: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| {
                    let object: serde_json::Map<String, serde_json::Value> = header
                        .iter()
                        .zip(row)
                        .map(|(h, v)| (h.to_string(), v.clone().into()))
                        .collect();
                    serde_json::Value::Object(object)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&objects)?);
        }
        OutputFormat::Csv => write_csv_rows(std::io::stdout().lock(), header, rows)?,
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("(no results)");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(header);
            for row in rows {
                table.add_row(row);
            }

            println!("{}", table);
            println!("{} row(s)", rows.len());
        }
    }
    Ok(())
}

fn role_row(role: &str, info: &RoleInfo) -> Vec<String> {
    vec![role.to_string(), info.name.clone(), info.reports.join(", ")]
}

fn write_csv_rows<W: std::io::Write>(
    writer: W,
    header: &[&str],
    rows: &[Vec<String>],
) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
