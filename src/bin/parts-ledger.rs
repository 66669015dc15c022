use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use parts_ledger::{
    Inventory,
    auth::{Caller, resolve_technician},
    config::LedgerConfig,
    part::{PartDraft, PartPatch},
    report::{MovementFilter, PartFilter, SortDirection, SortKey, SortState},
    status::Status,
    types::PartId,
};

#[derive(Parser, Debug)]
#[command(name = "parts-ledger", about = "Spare-parts stock and consumption ledger")]
struct Cli {
    /// Configuration file (toml, json, yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Identity recorded as the acting user
    #[arg(long, global = true, default_value = "operator")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show stock with optional filters
    List(ListArgs),
    /// Register a part at a location
    Add {
        #[arg(long)]
        model: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Correct fields of a part; not recorded in the movement history
    Update {
        id: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        quantity: Option<i64>,
    },
    /// Delete a part; its movement history is kept
    Remove { id: String },
    /// Take one unit out of stock
    Consume {
        id: String,
        /// Name from the configured roster
        #[arg(long)]
        technician: Option<String>,
        /// Free-text technician, overrides the roster choice
        #[arg(long)]
        other: Option<String>,
    },
    /// Movement history, newest first
    History {
        #[arg(long)]
        part: Option<String>,
        #[arg(long)]
        technician: Option<String>,
    },
    /// Write a CSV export
    Export {
        #[arg(value_enum)]
        what: ExportKind,
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long, value_enum)]
    sort: Option<SortColumn>,
    #[arg(long)]
    desc: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ExportKind {
    Parts,
    Movements,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SortColumn {
    Category,
    Model,
    Code,
    Location,
    Quantity,
    Status,
}

impl From<SortColumn> for SortKey {
    fn from(value: SortColumn) -> Self {
        match value {
            SortColumn::Category => SortKey::Category,
            SortColumn::Model => SortKey::Model,
            SortColumn::Code => SortKey::PartCode,
            SortColumn::Location => SortKey::Location,
            SortColumn::Quantity => SortKey::Quantity,
            SortColumn::Status => SortKey::Status,
        }
    }
}

impl ListArgs {
    fn filter(&self) -> Result<PartFilter> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<Status>)
            .transpose()?;
        Ok(PartFilter {
            model: self.model.clone(),
            part_code: self.code.clone(),
            location: self.location.clone(),
            status,
        })
    }

    fn sort(&self) -> SortState {
        match self.sort {
            Some(column) => {
                let direction = if self.desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                SortState::by(column.into(), direction)
            }
            None => SortState::default(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LedgerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.init_tracing();

    let inventory = Inventory::open(&config).context("Failed to open the ledger database")?;
    // the console operator is trusted with both capabilities
    let caller = Caller::admin(cli.user.clone());

    match cli.command {
        Command::List(args) => {
            let view = inventory.reports.parts_view(&args.filter()?, &args.sort())?;
            for part in &view.records {
                println!(
                    "{}  {:<10} {:<20} {:<12} {:<8} {:>5}  {}",
                    part.id,
                    part.category,
                    part.model,
                    part.part_code,
                    part.location,
                    part.quantity(),
                    part.status().label()
                );
            }
            println!(
                "{} parts: {} in stock, {} low, {} out",
                view.counts.total, view.counts.in_stock, view.counts.low_stock, view.counts.out_of_stock
            );
        }
        Command::Add {
            model,
            category,
            code,
            location,
            quantity,
        } => {
            let draft = PartDraft::new()
                .set_model(&model)
                .set_category(&category)
                .set_part_code(&code)
                .set_location(&location)
                .set_quantity(quantity);
            let part = inventory.admin.create(&caller, draft)?;
            println!("{} created with {} unit(s), {}", part.id, part.quantity(), part.status().label());
        }
        Command::Update {
            id,
            model,
            category,
            code,
            location,
            quantity,
        } => {
            let patch = PartPatch {
                model,
                category,
                part_code: code,
                location,
                quantity,
                image_ref: None,
            };
            let part = inventory.admin.update(&caller, &PartId::from(id), &patch)?;
            println!("{} now holds {} unit(s), {}", part.id, part.quantity(), part.status().label());
        }
        Command::Remove { id } => {
            inventory.admin.remove(&caller, &PartId::from(id.as_str()))?;
            println!("{id} removed");
        }
        Command::Consume {
            id,
            technician,
            other,
        } => {
            let technician =
                resolve_technician(&config.technicians, technician.as_deref(), other.as_deref())?;
            let movement = inventory
                .consumption
                .consume(&caller, &PartId::from(id), &technician)?;
            println!(
                "{} {}: {} -> {} for {}",
                movement.timestamp, movement.part_code, movement.quantity_before, movement.quantity_after, movement.technician
            );
        }
        Command::History { part, technician } => {
            let filter = MovementFilter {
                part_id: part.map(PartId::from),
                technician,
                acting_user: None,
            };
            for movement in inventory.reports.movements(&filter)? {
                println!(
                    "{}  {:<12} {:<12} {:<12} {:>4} -> {:<4} {}",
                    movement.timestamp,
                    movement.acting_user,
                    movement.technician,
                    movement.part_code,
                    movement.quantity_before,
                    movement.quantity_after,
                    movement.location
                );
            }
        }
        Command::Export { what, out, list } => {
            let csv = match what {
                ExportKind::Parts => inventory.reports.export_parts(&list.filter()?, &list.sort())?,
                ExportKind::Movements => inventory.reports.export_movements(&MovementFilter::default())?,
            };
            match out {
                Some(path) => std::fs::write(&path, csv)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{csv}"),
            }
        }
    }

    Ok(())
}
