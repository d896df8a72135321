//! Barfik CLI
//!
//! Command-line front end for the Barfik pet diet planner.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::Level;

use barfik::api::{AnimalFilter, DietFilter, ShoppingListFilter};
use barfik::models::{Id, ShoppingListCreate};
use barfik::session::FileStorage;
use barfik::shopping::{self, CompletionCheck, Progress};
use barfik::validation::{AnimalForm, DietForm};
use barfik::{load_config, Barfik, BarfikBuilder, BarfikError, Config};

#[derive(Parser)]
#[command(name = "barfik")]
#[command(about = "Plan pet diets and shopping lists")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL (overrides config file and environment)
    #[arg(long)]
    api_url: Option<String>,

    /// Session file (overrides config file)
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Keep the refresh token so the session can be renewed
        #[arg(long)]
        remember: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage animals
    Animals {
        #[command(subcommand)]
        command: AnimalsCommand,
    },
    /// Manage diets
    Diets {
        #[command(subcommand)]
        command: DietsCommand,
    },
    /// Work with shopping lists
    Shopping {
        #[command(subcommand)]
        command: ShoppingCommand,
    },
    /// Show statistics and alerts
    Dashboard,
}

#[derive(Subcommand)]
enum AnimalsCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        /// Animal type id
        #[arg(long)]
        species: Id,
        #[arg(long)]
        born: Option<NaiveDate>,
        /// Weight in kilograms, `12.5` or `12,5`
        #[arg(long, default_value = "")]
        weight: String,
        #[arg(long, default_value = "")]
        note: String,
    },
}

#[derive(Subcommand)]
enum DietsCommand {
    List {
        #[arg(long)]
        animal: Option<Id>,
    },
    Add {
        #[arg(long)]
        animal: Id,
        #[arg(long)]
        start: NaiveDate,
        /// Leave out for an open-ended diet
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand)]
enum ShoppingCommand {
    List {
        /// Show only completed (true) or active (false) lists
        #[arg(long)]
        completed: Option<bool>,
    },
    Create {
        #[arg(long)]
        title: String,
        /// Diet id, repeat for several diets
        #[arg(long = "diet")]
        diets: Vec<Id>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    Show {
        id: Id,
    },
    Check {
        list: Id,
        item: Id,
        /// Uncheck instead
        #[arg(long)]
        uncheck: bool,
    },
    Complete {
        id: Id,
        /// Complete even with unchecked items
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, api_url={:?}, log_level={:?}",
        args.config,
        args.api_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };
    config.apply_env();
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if let Some(session_file) = args.session_file {
        config.session.token_file = session_file;
    }

    let storage = Arc::new(FileStorage::open(&config.session.token_file)?);
    let mut barfik = BarfikBuilder::new(config).with_storage(storage).build()?;

    if let Err(e) = run(&mut barfik, args.command).await {
        tracing::debug!("Command failed: {}", e);
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn report(error: &BarfikError) {
    match error {
        BarfikError::Validation(errors) if errors.has_field_errors() => {
            for (field, messages) in errors.fields() {
                for message in messages {
                    eprintln!("{field}: {message}");
                }
            }
            for message in errors.general() {
                eprintln!("{message}");
            }
        }
        other => eprintln!("{}", other.user_message()),
    }
}

async fn run(barfik: &mut Barfik, command: Command) -> barfik::Result<()> {
    match command {
        Command::Login {
            email,
            password,
            remember,
        } => {
            let user = barfik.auth.login(&email, &password, remember).await?;
            println!("Zalogowano jako {}", user.display_name());
        }
        Command::Logout => {
            barfik.auth.logout().await;
            println!("Wylogowano");
        }
        Command::Whoami => {
            if barfik.auth.check_session().await {
                if let Some(user) = barfik.auth.user() {
                    println!("{} <{}>", user.display_name(), user.email);
                }
            } else {
                return Err(BarfikError::SessionExpired("not logged in".to_string()));
            }
        }
        Command::Animals { command } => animals(barfik, command).await?,
        Command::Diets { command } => diets(barfik, command).await?,
        Command::Shopping { command } => shopping_lists(barfik, command).await?,
        Command::Dashboard => dashboard(barfik).await?,
    }
    Ok(())
}

async fn animals(barfik: &Barfik, command: AnimalsCommand) -> barfik::Result<()> {
    match command {
        AnimalsCommand::List { search } => {
            let filter = AnimalFilter {
                search,
                ..AnimalFilter::default()
            };
            let animals = barfik.queries.animals(&filter).await?;
            for animal in animals.items() {
                let weight = animal
                    .weight_kg
                    .map(|w| format!("{w} kg"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>4}  {:<20} {:<12} {}",
                    animal.id, animal.name, animal.species.name, weight
                );
            }
            println!("Razem: {}", animals.count());
        }
        AnimalsCommand::Add {
            name,
            species,
            born,
            weight,
            note,
        } => {
            let form = AnimalForm {
                name,
                species_id: Some(species),
                date_of_birth: born,
                weight_kg: weight,
                note,
            };
            let data = form.validate().map_err(BarfikError::Validation)?;
            let animal = barfik.queries.create_animal(&data).await?;
            println!("Dodano zwierzę {} (id {})", animal.name, animal.id);
        }
    }
    Ok(())
}

async fn diets(barfik: &Barfik, command: DietsCommand) -> barfik::Result<()> {
    match command {
        DietsCommand::List { animal } => {
            let filter = DietFilter {
                animal_id: animal,
                ..DietFilter::default()
            };
            let diets = barfik.queries.diets(&filter).await?;
            for diet in diets.items() {
                let end = diet
                    .end_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "bezterminowo".to_string());
                println!(
                    "{:>4}  {:<20} {} - {}  {} g/dzień",
                    diet.id, diet.animal_name, diet.start_date, end, diet.total_daily_mass
                );
            }
        }
        DietsCommand::Add {
            animal,
            start,
            end,
            description,
        } => {
            let form = DietForm {
                animal_id: Some(animal),
                start_date: Some(start),
                end_date: end,
                description,
            };
            let data = form.validate().map_err(BarfikError::Validation)?;
            let diet = barfik.queries.create_diet(&data).await?;
            println!("Dodano dietę {} dla zwierzęcia {}", diet.id, diet.animal);
        }
    }
    Ok(())
}

async fn shopping_lists(barfik: &Barfik, command: ShoppingCommand) -> barfik::Result<()> {
    match command {
        ShoppingCommand::List { completed } => {
            let filter = ShoppingListFilter {
                is_completed: completed,
                page: None,
            };
            let lists = barfik.queries.shopping_lists(&filter).await?;
            for list in lists.items() {
                let progress = shopping::progress(list);
                let status = if list.is_completed { "ukończona" } else { "aktywna" };
                println!(
                    "{:>4}  {:<30} {:>3}%  {}",
                    list.id,
                    list.title,
                    progress.percent(),
                    status
                );
            }
        }
        ShoppingCommand::Create { title, diets, days } => {
            let data = ShoppingListCreate {
                title,
                diets,
                days_count: days,
            };
            let list = barfik.queries.create_shopping_list(&data).await?;
            println!(
                "Utworzono listę {} ({} pozycji)",
                list.id,
                list.items.len()
            );
        }
        ShoppingCommand::Show { id } => {
            let list = barfik.queries.shopping_list(id).await?;
            print_shopping_list(barfik, &list);
        }
        ShoppingCommand::Check {
            list,
            item,
            uncheck,
        } => {
            barfik.queries.toggle_item(list, item, !uncheck).await?;
            let updated = barfik.queries.shopping_list(list).await?;
            let progress = shopping::progress(&updated);
            println!(
                "Postęp: {}% ({}/{})",
                progress.percent(),
                progress.checked,
                progress.total
            );
            if !uncheck && shopping::completion_check(&progress) == CompletionCheck::AllChecked {
                println!("Wszystkie pozycje zaznaczone. Zakończ listę: barfik shopping complete {list}");
            }
        }
        ShoppingCommand::Complete { id, force } => {
            let list = barfik.queries.shopping_list(id).await?;
            let progress = shopping::progress(&list);
            if let CompletionCheck::Unchecked(n) = shopping::completion_check(&progress) {
                if !force {
                    eprintln!(
                        "Część pozycji nie została zaznaczona ({} z {}). Użyj --force, aby zakończyć.",
                        n, progress.total
                    );
                    return Ok(());
                }
            }
            barfik.queries.complete_shopping_list(id).await?;
            println!("Lista {id} zakończona");
        }
    }
    Ok(())
}

fn print_shopping_list(barfik: &Barfik, list: &barfik::models::ShoppingList) {
    let progress: Progress = shopping::progress(list);
    println!("{} ({} dni)", list.title, list.days_count);
    println!(
        "Postęp: {}% ({}/{})",
        progress.percent(),
        progress.checked,
        progress.total
    );
    for group in shopping::group_by_category(&list.items) {
        if barfik.ui.is_category_collapsed(&group.category) {
            println!("▶ {} ({})", group.category, group.items.len());
            continue;
        }
        println!("▼ {}", group.category);
        for item in group.items {
            let mark = if item.is_checked { "x" } else { " " };
            let unit = item
                .unit
                .as_ref()
                .map(|u| u.symbol.as_str())
                .unwrap_or("");
            println!(
                "  [{mark}] {:>4}  {} {} {}",
                item.id, item.ingredient_name, item.total_amount, unit
            );
        }
    }
}

async fn dashboard(barfik: &Barfik) -> barfik::Result<()> {
    let dashboard = barfik.queries.dashboard().await?;
    let stats = &dashboard.stats;
    println!("Zwierzęta:               {}", stats.animals_count);
    println!("Aktywne diety:           {}", stats.active_diets_count);
    println!("Kończące się diety:      {}", stats.expiring_diets_count);
    println!("Aktywne listy zakupów:   {}", stats.active_shopping_lists_count);
    println!("Ukończone listy zakupów: {}", stats.completed_shopping_lists_count);

    for animal in &dashboard.alerts.animals_without_diet {
        println!("! {} ({}) nie ma aktywnej diety", animal.name, animal.species);
    }
    for diet in &dashboard.alerts.expiring_diets {
        println!(
            "! Dieta {} kończy się {} (za {} dni)",
            diet.animal_name, diet.end_date, diet.days_left
        );
    }
    for list in &dashboard.alerts.old_shopping_lists {
        println!("! Lista \"{}\" ma {} dni", list.title, list.days_old);
    }
    Ok(())
}
