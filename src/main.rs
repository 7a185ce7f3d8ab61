use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jagi_analytics::analytics::{brand, coverage, redistribution, restock, stock};
use jagi_analytics::cli_style::{self, get_styles, TableBuilder};
use jagi_analytics::config::{AppConfig, CliConfig, FileConfig};
use jagi_analytics::ingest::run_full_reload;
use jagi_analytics::report::{
    apply_filters, brand_products_table, brand_stores_table, coverage_table, export_per_store,
    redistribution_table, restock_table, stock_table, to_json_string, to_picking, write_csv,
    ReportFilters, TabularReport,
};
use jagi_analytics::{PlanningStore, SnapshotStore, SqlitePlanningStore, SqliteSnapshotStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "jagi-analytics", styles = get_styles())]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Retail analytics over the Mahalo ERP exports")]
struct CliArgs {
    /// Directory holding snapshots.db and planning.db.
    #[clap(long, global = true, default_value = "./data", value_parser = parse_path)]
    pub data_dir: PathBuf,

    /// Directory holding the CSV exports. Defaults to the data directory.
    #[clap(long, global = true, value_parser = parse_path)]
    pub inputs_dir: Option<PathBuf>,

    /// Directory for per-store report files. Defaults to <data-dir>/reports.
    #[clap(long, global = true, value_parser = parse_path)]
    pub output_dir: Option<PathBuf>,

    /// Optional TOML config file; its values override the CLI flags.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drops and reloads the snapshot tables from the CSV exports.
    Reload,

    /// Shows snapshot table counts and recent reload runs.
    Status {
        /// Print the status as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Warehouse-to-store restock suggestions.
    Restock {
        /// Sales window in days used for demand.
        #[clap(long, default_value_t = 10)]
        window_days: i64,

        /// Sales window in days used for expansion candidates.
        #[clap(long, default_value_t = 60)]
        expansion_window_days: i64,

        /// Minimum sales over the expansion window to qualify.
        #[clap(long, default_value_t = 3)]
        expansion_min_sales: i64,

        /// New product to introduce everywhere, as BARCODE[:BRAND[:COLOR]].
        /// Repeatable.
        #[clap(long = "new-product", value_name = "BARCODE[:BRAND[:COLOR]]")]
        new_products: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Store-to-store transfer suggestions within a region.
    Redistribute {
        /// Sales window in days.
        #[clap(long, default_value_t = 30)]
        window_days: i64,

        /// Minimum sales a destination must have over the window.
        #[clap(long, default_value_t = 1)]
        min_sales: i64,

        /// Only suggest transfers out of this store.
        #[clap(long)]
        source_store: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Days-of-stock coverage and purchase need per (store, product).
    Coverage {
        /// Sales window in days (1-90).
        #[clap(long, default_value_t = 30)]
        window_days: i64,

        /// Coverage target in days (1-180, >= window).
        #[clap(long, default_value_t = 60)]
        target_days: i64,

        /// Explicit window start, DD/MM/YYYY. Overrides --window-days
        /// together with --to.
        #[clap(long)]
        from: Option<String>,

        /// Explicit window end, DD/MM/YYYY.
        #[clap(long)]
        to: Option<String>,

        /// Restrict to these stores. Repeatable.
        #[clap(long = "filter-store")]
        filter_stores: Vec<String>,

        /// Restrict to these barcodes. Repeatable.
        #[clap(long = "filter-product")]
        filter_products: Vec<String>,

        /// Keep rows with zero sales in the window.
        #[clap(long)]
        include_dormant: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Top-10 analysis for one brand.
    Brand {
        /// Brand name, matched case-insensitively as a substring.
        brand: String,

        /// Print the full report as JSON.
        #[clap(long)]
        json: bool,

        /// Write the product table to a CSV file.
        #[clap(long, value_parser = parse_path)]
        out: Option<PathBuf>,
    },

    /// Current stock per store, joined to the store directory.
    Stock {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Everything known about one barcode.
    Lookup {
        barcode: String,

        /// Print the lookup as JSON.
        #[clap(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// All report columns.
    Full,
    /// Warehouse picking sheet layout.
    Picking,
}

/// Presentation flags shared by the report subcommands.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Print the report as JSON instead of a console table.
    #[clap(long)]
    json: bool,

    /// Write the report to this CSV file.
    #[clap(long, value_parser = parse_path)]
    out: Option<PathBuf>,

    /// Write one CSV per store into the output directory.
    #[clap(long)]
    per_store: bool,

    /// Report layout.
    #[clap(long, value_enum, default_value_t = OutputFormat::Full)]
    format: OutputFormat,

    /// Keep only these columns, comma-separated, in the given order.
    #[clap(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Keep only rows for this store. Repeatable.
    #[clap(long = "store")]
    stores: Vec<String>,

    /// Keep only rows with this status. Repeatable.
    #[clap(long = "status")]
    statuses: Vec<String>,

    /// Drop rows with nothing assigned.
    #[clap(long)]
    drop_zero_assigned: bool,

    /// Keep only COMPRA rows.
    #[clap(long)]
    purchase_only: bool,
}

impl OutputArgs {
    fn filters(&self) -> ReportFilters {
        ReportFilters {
            columns: self.columns.clone(),
            stores: (!self.stores.is_empty()).then(|| self.stores.clone()),
            statuses: (!self.statuses.is_empty()).then(|| self.statuses.clone()),
            drop_zero_assigned: self.drop_zero_assigned,
            purchase_only: self.purchase_only,
        }
    }
}

fn print_console_table(table: &TabularReport) {
    cli_style::print_section_header(&table.title);
    if table.is_empty() {
        cli_style::print_empty_list("no rows");
    } else {
        let mut builder = TableBuilder::new(table.columns.iter().map(String::as_str).collect());
        for row in &table.rows {
            builder.add_row(row.iter().map(String::as_str).collect());
        }
        builder.print();
    }
    cli_style::print_section_footer();
}

/// Applies the presentation flags to a report and sends it wherever the
/// flags point: console (table or JSON), a CSV file, per-store files.
fn emit_report(table: TabularReport, args: &OutputArgs, config: &AppConfig) -> Result<()> {
    let table = apply_filters(table, &args.filters())?;
    let picking = args.format == OutputFormat::Picking;

    let flat = if picking && !args.per_store {
        to_picking(&table)?
    } else {
        table.clone()
    };

    if args.json {
        println!("{}", to_json_string(&flat)?);
    } else {
        print_console_table(&flat);
    }

    if let Some(out) = &args.out {
        write_csv(&flat, out)?;
        cli_style::print_success(&format!("Report written to {}", out.display()));
    }

    if args.per_store {
        let paths = export_per_store(&table, &config.output_dir, picking)?;
        cli_style::print_success(&format!(
            "{} store files written to {}",
            paths.len(),
            config.output_dir.display()
        ));
    }

    Ok(())
}

fn parse_new_product(raw: &str) -> Result<restock::NewProduct> {
    let mut parts = raw.splitn(3, ':');
    let barcode = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Invalid new product value: '{}'", raw))?
        .to_uppercase();
    let brand = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let color = parts.next().map(str::trim).filter(|s| !s.is_empty());
    Ok(restock::NewProduct {
        barcode,
        brand: brand.unwrap_or("SIN MARCA").to_uppercase(),
        color: color.unwrap_or("SIN COLOR").to_uppercase(),
    })
}

fn load_planning(config: &AppConfig) -> Result<jagi_analytics::Planning> {
    let store = SqlitePlanningStore::new(config.planning_db_path())?;
    Ok(store.load_planning()?)
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        data_dir: cli_args.data_dir.clone(),
        inputs_dir: cli_args.inputs_dir.clone(),
        output_dir: cli_args.output_dir.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite snapshot database at {:?}...",
        config.snapshots_db_path()
    );
    let snapshot = SqliteSnapshotStore::new(config.snapshots_db_path())?;

    match cli_args.command {
        Command::Reload => {
            let stats = run_full_reload(&snapshot, &config.inputs_dir)
                .with_context(|| format!("Reload from {:?} failed", config.inputs_dir))?;
            cli_style::print_section_header("Reload");
            cli_style::print_key_value("Store stock rows", &stats.counts.store_stock.to_string());
            cli_style::print_key_value(
                "Warehouse stock rows",
                &stats.counts.warehouse_stock.to_string(),
            );
            cli_style::print_key_value(
                "Sales history rows",
                &stats.counts.sales_history.to_string(),
            );
            cli_style::print_key_value("Skipped rows", &stats.skipped_rows.to_string());
            cli_style::print_key_value_highlight(
                "Elapsed",
                &format!("{:.2}s", stats.elapsed.as_secs_f64()),
            );
            cli_style::print_section_footer();
        }

        Command::Status { json } => {
            let counts = snapshot.table_counts()?;
            let runs = snapshot.reload_runs(10)?;
            if json {
                let status = serde_json::json!({ "counts": counts, "runs": runs });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                cli_style::print_section_header("Snapshot");
                cli_style::print_key_value("Store stock rows", &counts.store_stock.to_string());
                cli_style::print_key_value(
                    "Warehouse stock rows",
                    &counts.warehouse_stock.to_string(),
                );
                cli_style::print_key_value("Sales history rows", &counts.sales_history.to_string());
                cli_style::print_section_footer();

                if runs.is_empty() {
                    cli_style::print_empty_list("no reloads recorded yet");
                } else {
                    let mut table = TabularReport::new(
                        "Recent reloads",
                        &["started_at", "finished_at", "rows", "skipped", "outcome"],
                    );
                    for run in &runs {
                        let rows = run.counts.store_stock
                            + run.counts.warehouse_stock
                            + run.counts.sales_history;
                        table.rows.push(vec![
                            run.started_at.to_rfc3339(),
                            run.finished_at.to_rfc3339(),
                            rows.to_string(),
                            run.skipped_rows.to_string(),
                            run.outcome.to_db_str().to_string(),
                        ]);
                    }
                    print_console_table(&table);
                }
            }
        }

        Command::Restock {
            window_days,
            expansion_window_days,
            expansion_min_sales,
            new_products,
            output,
        } => {
            let planning = load_planning(&config)?;
            let params = restock::RestockParams {
                sales_window_days: window_days,
                expansion_window_days,
                expansion_min_sales,
                new_products: new_products
                    .iter()
                    .map(|raw| parse_new_product(raw))
                    .collect::<Result<Vec<_>>>()?,
            };
            let report = restock::run(&snapshot, &planning, &params)?;
            if !output.json {
                cli_style::print_key_value(
                    "Restock rows",
                    &report.summary.restock_rows.to_string(),
                );
                cli_style::print_key_value(
                    "Purchase rows",
                    &report.summary.purchase_rows.to_string(),
                );
                cli_style::print_key_value(
                    "Total assigned",
                    &report.summary.total_assigned.to_string(),
                );
                cli_style::print_key_value(
                    "Total requested",
                    &report.summary.total_requested.to_string(),
                );
            }
            emit_report(restock_table(&report), &output, &config)?;
        }

        Command::Redistribute {
            window_days,
            min_sales,
            source_store,
            output,
        } => {
            let planning = load_planning(&config)?;
            let params = redistribution::RedistributionParams {
                window_days,
                min_sales,
                source_store,
            };
            let lines = redistribution::run(&snapshot, &planning, &params)?;
            emit_report(redistribution_table(&lines), &output, &config)?;
        }

        Command::Coverage {
            window_days,
            target_days,
            from,
            to,
            filter_stores,
            filter_products,
            include_dormant,
            output,
        } => {
            let planning = load_planning(&config)?;
            let params = coverage::CoverageParams {
                sales_window_days: window_days,
                target_days,
                from,
                to,
                stores: filter_stores,
                products: filter_products,
                include_dormant,
            };
            let report = coverage::run(&snapshot, &planning, &params)?;
            if !output.json {
                cli_style::print_key_value("Items", &report.total_items.to_string());
                cli_style::print_key_value("Items with need", &report.items_with_need.to_string());
                cli_style::print_key_value("Units needed", &report.units_needed.to_string());
            }
            emit_report(coverage_table(&report), &output, &config)?;
        }

        Command::Brand { brand, json, out } => {
            let planning = load_planning(&config)?;
            let report = brand::run(&snapshot, &planning, &brand)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                cli_style::print_key_value("Brand", &report.brand);
                cli_style::print_key_value("Products", &report.summary.product_count.to_string());
                cli_style::print_key_value("Stores", &report.summary.store_count.to_string());
                cli_style::print_key_value(
                    "Stores with top products",
                    &report.summary.stores_with_top.to_string(),
                );
                cli_style::print_key_value(
                    "Redistribution opportunities",
                    &report.summary.redistribution_opportunities.to_string(),
                );
                print_console_table(&brand_products_table(&report));
                print_console_table(&brand_stores_table(&report));
                cli_style::print_key_value_highlight("Recommendation", &report.recommendation);
            }
            if let Some(out) = out {
                write_csv(&brand_products_table(&report), &out)?;
                cli_style::print_success(&format!("Report written to {}", out.display()));
            }
        }

        Command::Stock { output } => {
            let planning = load_planning(&config)?;
            let lines = stock::stock_by_store(&snapshot, &planning)?;
            emit_report(stock_table(&lines), &output, &config)?;
        }

        Command::Lookup { barcode, json } => {
            let planning = load_planning(&config)?;
            let lookup = stock::product_lookup(&snapshot, &planning, &barcode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else {
                cli_style::print_section_header(&lookup.barcode);
                cli_style::print_key_value("Brand", &lookup.brand);
                cli_style::print_key_value("Color", &lookup.color);
                cli_style::print_key_value("Warehouse stock", &lookup.warehouse_total.to_string());
                cli_style::print_key_value("Sold last 30 days", &lookup.sold_30d.to_string());
                if lookup.per_store.is_empty() {
                    cli_style::print_empty_list("no store carries this product");
                } else {
                    for (store, available) in &lookup.per_store {
                        cli_style::print_list_item(&format!("{}: {}", store, available), 1);
                    }
                }
                cli_style::print_section_footer();
            }
        }
    }

    Ok(())
}
