use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use jagi_analytics::cli_style::{self, get_styles, CommandHelp, TableBuilder};
use jagi_analytics::planning_store::StoreEntry;
use jagi_analytics::{PlanningStore, RuleKind, SqlitePlanningStore};

use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    history::FileHistory,
    validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the planning database. Defaults to ./data/planning.db.
    #[clap(value_parser = parse_path)]
    pub path: Option<PathBuf>,
}

#[derive(Parser)]
#[command(styles=get_styles(),name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Shows every rule kind with its effective quantity.
    Rules,

    /// Writes the built-in quantity for every rule kind that has no row
    /// yet. Existing overrides are kept.
    SeedRules,

    /// Sets the quantity of a rule kind (fixed-special, fixed-normal,
    /// multibrand, jgl, jgm, default).
    SetRule { kind: String, quantity: i64 },

    /// Removes the override of a rule kind, restoring the built-in
    /// quantity.
    UnsetRule { kind: String },

    /// Shows the store directory.
    Stores,

    /// Adds a store to the directory, or updates it if the ERP name is
    /// already mapped.
    AddStore {
        raw_name: String,
        clean_name: String,
        region: String,

        /// Free-form category, e.g. propia or franquicia.
        #[clap(long)]
        store_type: Option<String>,
    },

    /// Changes the region of a store.
    SetRegion { raw_name: String, region: String },

    /// Pins a store: it is always restocked and served first during
    /// warehouse allocation.
    PinStore { raw_name: String },

    /// Removes the pin of a store.
    UnpinStore { raw_name: String },

    /// Marks a store as active.
    ActivateStore { raw_name: String },

    /// Marks a store as inactive.
    DeactivateStore { raw_name: String },

    /// Deletes a store from the directory.
    RemoveStore { raw_name: String },

    /// Shows the pinned barcodes.
    Pins,

    /// Pins a barcode: it is restocked even without sales.
    AddPin { barcode: String },

    /// Removes a pinned barcode.
    RemovePin { barcode: String },

    /// Shows the multibrand brands.
    Multibrand,

    /// Adds a brand to the multibrand list.
    AddMultibrand { brand: String },

    /// Removes a brand from the multibrand list.
    RemoveMultibrand { brand: String },

    /// Shows the excluded barcodes.
    Exclusions,

    /// Excludes a barcode from restock suggestions.
    AddExclusion { barcode: String },

    /// Removes a barcode from the exclusion list.
    RemoveExclusion { barcode: String },

    /// Shows the path of the current planning db.
    Where,

    /// Close this program.
    Exit,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "rules",
        args: "",
        description: "show effective minimum-stock rules",
    },
    CommandHelp {
        name: "seed-rules",
        args: "",
        description: "write built-in quantities for missing rules",
    },
    CommandHelp {
        name: "set-rule",
        args: "<kind> <quantity>",
        description: "override the quantity of a rule kind",
    },
    CommandHelp {
        name: "unset-rule",
        args: "<kind>",
        description: "restore the built-in quantity",
    },
    CommandHelp {
        name: "stores",
        args: "",
        description: "show the store directory",
    },
    CommandHelp {
        name: "add-store",
        args: "<raw> <clean> <region>",
        description: "add or update a directory entry",
    },
    CommandHelp {
        name: "set-region",
        args: "<raw> <region>",
        description: "change the region of a store",
    },
    CommandHelp {
        name: "pin-store",
        args: "<raw>",
        description: "serve this store first during allocation",
    },
    CommandHelp {
        name: "unpin-store",
        args: "<raw>",
        description: "remove the pin of a store",
    },
    CommandHelp {
        name: "activate-store",
        args: "<raw>",
        description: "mark a store as active",
    },
    CommandHelp {
        name: "deactivate-store",
        args: "<raw>",
        description: "mark a store as inactive",
    },
    CommandHelp {
        name: "remove-store",
        args: "<raw>",
        description: "delete a store from the directory",
    },
    CommandHelp {
        name: "pins",
        args: "",
        description: "show pinned barcodes",
    },
    CommandHelp {
        name: "add-pin",
        args: "<barcode>",
        description: "restock this barcode even without sales",
    },
    CommandHelp {
        name: "remove-pin",
        args: "<barcode>",
        description: "remove a pinned barcode",
    },
    CommandHelp {
        name: "multibrand",
        args: "",
        description: "show multibrand brands",
    },
    CommandHelp {
        name: "add-multibrand",
        args: "<brand>",
        description: "apply the multibrand rule to this brand",
    },
    CommandHelp {
        name: "remove-multibrand",
        args: "<brand>",
        description: "remove a multibrand brand",
    },
    CommandHelp {
        name: "exclusions",
        args: "",
        description: "show excluded barcodes",
    },
    CommandHelp {
        name: "add-exclusion",
        args: "<barcode>",
        description: "never suggest restocking this barcode",
    },
    CommandHelp {
        name: "remove-exclusion",
        args: "<barcode>",
        description: "remove an excluded barcode",
    },
    CommandHelp {
        name: "where",
        args: "",
        description: "show the planning db path",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "show this help",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "close this program",
    },
];

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

fn parse_rule_kind(s: &str) -> Result<RuleKind, String> {
    let canon = s.trim().to_lowercase().replace('-', "_");
    RuleKind::from_db_str(&canon).ok_or_else(|| {
        format!(
            "Invalid rule kind '{}'. Valid kinds are: {}",
            s,
            RuleKind::ALL
                .iter()
                .map(|k| k.to_db_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn print_rules(store: &dyn PlanningStore) -> Result<(), String> {
    let overrides = store.rules().map_err(|e| e.to_string())?;
    let mut table = TableBuilder::new(vec!["kind", "quantity", "source"]);
    for kind in RuleKind::ALL {
        let (quantity, source) = match overrides.get(&kind) {
            Some(quantity) => (*quantity, "override"),
            None => (kind.fallback_quantity(), "built-in"),
        };
        let quantity = quantity.to_string();
        table.add_row(vec![kind.to_db_str(), quantity.as_str(), source]);
    }
    table.print();
    Ok(())
}

fn print_stores(store: &dyn PlanningStore) -> Result<(), String> {
    let entries = store.stores().map_err(|e| e.to_string())?;
    if entries.is_empty() {
        cli_style::print_empty_list("the store directory is empty");
        return Ok(());
    }
    let mut table = TableBuilder::new(vec![
        "raw name", "clean name", "region", "type", "pinned", "active",
    ]);
    for entry in &entries {
        table.add_row(vec![
            entry.raw_name.as_str(),
            entry.clean_name.as_str(),
            entry.region.as_str(),
            entry.store_type.as_deref().unwrap_or("-"),
            if entry.pinned { "yes" } else { "no" },
            if entry.active { "yes" } else { "no" },
        ]);
    }
    table.print();
    Ok(())
}

fn print_string_list(title: &str, values: &[String]) {
    cli_style::print_section_header(title);
    if values.is_empty() {
        cli_style::print_empty_list("nothing here yet");
    } else {
        for value in values {
            cli_style::print_list_item(value, 1);
        }
    }
    cli_style::print_section_footer();
}

fn execute_command(
    line: String,
    store: &dyn PlanningStore,
    db_path: &str,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    if line.trim() == "help" {
        cli_style::print_help(COMMANDS);
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            cli_style::print_command_echo(&line);
            match cli.command {
                InnerCommand::Rules => {
                    if let Err(err) = print_rules(store) {
                        return CommandExecutionResult::Error(err);
                    }
                }
                InnerCommand::SeedRules => {
                    if let Err(err) = store.seed_default_rules() {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success("Missing rules seeded with built-in quantities");
                }
                InnerCommand::SetRule { kind, quantity } => {
                    let kind = match parse_rule_kind(&kind) {
                        Ok(kind) => kind,
                        Err(err) => return CommandExecutionResult::Error(err),
                    };
                    if quantity < 0 {
                        return CommandExecutionResult::Error(format!(
                            "Quantity must not be negative, got {}",
                            quantity
                        ));
                    }
                    if let Err(err) = store.set_rule(kind, quantity) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!(
                        "Rule '{}' set to {}",
                        kind.to_db_str(),
                        quantity
                    ));
                }
                InnerCommand::UnsetRule { kind } => {
                    let kind = match parse_rule_kind(&kind) {
                        Ok(kind) => kind,
                        Err(err) => return CommandExecutionResult::Error(err),
                    };
                    match store.unset_rule(kind) {
                        Ok(true) => cli_style::print_success(&format!(
                            "Rule '{}' restored to its built-in quantity ({})",
                            kind.to_db_str(),
                            kind.fallback_quantity()
                        )),
                        Ok(false) => cli_style::print_warning(&format!(
                            "Rule '{}' had no override",
                            kind.to_db_str()
                        )),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Stores => {
                    if let Err(err) = print_stores(store) {
                        return CommandExecutionResult::Error(err);
                    }
                }
                InnerCommand::AddStore {
                    raw_name,
                    clean_name,
                    region,
                    store_type,
                } => {
                    let entry = StoreEntry {
                        raw_name: raw_name.clone(),
                        clean_name,
                        region,
                        pinned: false,
                        store_type,
                        active: true,
                    };
                    if let Err(err) = store.upsert_store(&entry) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' saved", raw_name));
                }
                InnerCommand::SetRegion { raw_name, region } => {
                    if let Err(err) = store.set_store_region(&raw_name, &region) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!(
                        "Store '{}' moved to region '{}'",
                        raw_name, region
                    ));
                }
                InnerCommand::PinStore { raw_name } => {
                    if let Err(err) = store.set_store_pinned(&raw_name, true) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' pinned", raw_name));
                }
                InnerCommand::UnpinStore { raw_name } => {
                    if let Err(err) = store.set_store_pinned(&raw_name, false) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' unpinned", raw_name));
                }
                InnerCommand::ActivateStore { raw_name } => {
                    if let Err(err) = store.set_store_active(&raw_name, true) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' activated", raw_name));
                }
                InnerCommand::DeactivateStore { raw_name } => {
                    if let Err(err) = store.set_store_active(&raw_name, false) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' deactivated", raw_name));
                }
                InnerCommand::RemoveStore { raw_name } => {
                    if let Err(err) = store.remove_store(&raw_name) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Store '{}' removed", raw_name));
                }
                InnerCommand::Pins => match store.pinned_barcodes() {
                    Ok(barcodes) => print_string_list("Pinned barcodes", &barcodes),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::AddPin { barcode } => {
                    if let Err(err) = store.add_pinned_barcode(&barcode) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Barcode '{}' pinned", barcode));
                }
                InnerCommand::RemovePin { barcode } => match store.remove_pinned_barcode(&barcode)
                {
                    Ok(true) => cli_style::print_success(&format!("Barcode '{}' unpinned", barcode)),
                    Ok(false) => {
                        cli_style::print_warning(&format!("Barcode '{}' was not pinned", barcode))
                    }
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::Multibrand => match store.multibrand_brands() {
                    Ok(brands) => print_string_list("Multibrand brands", &brands),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::AddMultibrand { brand } => {
                    if let Err(err) = store.add_multibrand_brand(&brand) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Brand '{}' marked as multibrand", brand));
                }
                InnerCommand::RemoveMultibrand { brand } => {
                    match store.remove_multibrand_brand(&brand) {
                        Ok(true) => cli_style::print_success(&format!(
                            "Brand '{}' removed from multibrand",
                            brand
                        )),
                        Ok(false) => cli_style::print_warning(&format!(
                            "Brand '{}' was not multibrand",
                            brand
                        )),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Exclusions => match store.excluded_barcodes() {
                    Ok(barcodes) => print_string_list("Excluded barcodes", &barcodes),
                    Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                },
                InnerCommand::AddExclusion { barcode } => {
                    if let Err(err) = store.add_excluded_barcode(&barcode) {
                        return CommandExecutionResult::Error(format!("{}", err));
                    }
                    cli_style::print_success(&format!("Barcode '{}' excluded", barcode));
                }
                InnerCommand::RemoveExclusion { barcode } => {
                    match store.remove_excluded_barcode(&barcode) {
                        Ok(true) => cli_style::print_success(&format!(
                            "Barcode '{}' no longer excluded",
                            barcode
                        )),
                        Ok(false) => cli_style::print_warning(&format!(
                            "Barcode '{}' was not excluded",
                            barcode
                        )),
                        Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
                    }
                }
                InnerCommand::Where => {
                    cli_style::print_key_value("Database", db_path);
                }
                InnerCommand::Exit => return CommandExecutionResult::Exit,
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct MyHelper {
    commands_names: Vec<String>,
}

impl MyHelper {
    pub fn new() -> Self {
        let mut commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();
        commands_names.push("help".to_string());

        MyHelper { commands_names }
    }
}

impl Completer for MyHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(" ") {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for MyHelper {}
impl Validator for MyHelper {}
impl Helper for MyHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let planning_db_path = match cli_args.path {
        Some(path) => path,
        None => parse_path("./data/planning.db")?,
    };
    let store = SqlitePlanningStore::new(&planning_db_path)?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<MyHelper, FileHistory>::with_config(config)?;

    let helper = MyHelper::new();
    rl.set_helper(Some(helper));
    let _ = rl.clear_screen();

    cli_style::print_welcome(&planning_db_path.display().to_string());

    loop {
        let readline = rl.readline(&cli_style::get_prompt());

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &store, &planning_db_path.display().to_string()) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        cli_style::print_goodbye();
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        cli_style::print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                cli_style::print_goodbye();
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                cli_style::print_goodbye();
                break;
            }
            Err(e) => {
                cli_style::print_error(&format!("{:?}", e));
                break;
            }
        }
    }
    Ok(())
}
