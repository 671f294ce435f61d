use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use futures::future;
use log::LevelFilter;
use lunsj::cache::CacheEvent;
use lunsj::settings::{Settings, SettingsError};
use lunsj::timeline::{daily_timeline, weekly_timeline};
use lunsj::types::{Location, NO_MENU_TEXT, WeeklyMenu};
use lunsj::utils::MenuFilter;
use lunsj::{MenuService, SharedContainer, WebScraper};

#[derive(Parser)]
#[command(name = "lunsj")]
#[command(about = "Weekly lunch menus for FB38 and N58", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "warn",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long = "data-dir",
        env = "LUNSJ_DATA_DIR",
        global = true,
        help = "Directory for caches and settings (defaults to the platform data directory)"
    )]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lunch menu, served from cache when it is less than two hours old
    Menu {
        #[arg(long, help = "Location to show (FB38 or N58), overrides the saved setting")]
        location: Option<String>,

        #[arg(long, conflicts_with = "week", help = "Only show today's menu")]
        today: bool,

        #[arg(long, help = "Show the whole week")]
        week: bool,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the widget timeline and when it should be rebuilt
    Widget {
        #[arg(long, value_parser = parse_location, help = "Location to show")]
        location: Option<Location>,

        #[arg(long, help = "Show the current day only, switching to tomorrow after lunch")]
        daily: bool,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Fetch the menus of every location so later requests hit the cache
    Prefetch,
    /// Delete every cached menu page
    ClearCache,
    /// Show or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Print the link to the payment page
    Pay {
        #[arg(long, value_parser = parse_location, help = "Location to pay at")]
        location: Option<Location>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print all settings
    Show,
    /// Change one setting, e.g. `set selectedLocation FB38`
    Set { key: String, value: String },
}

fn parse_location(s: &str) -> Result<Location, String> {
    Location::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn saved_location(settings: &Settings) -> Location {
    settings.location().unwrap_or_else(|e| {
        log::error!("{}", e);
        process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let container = match &cli.data_dir {
        Some(dir) => SharedContainer::open(dir),
        None => SharedContainer::open_default(),
    }
    .unwrap_or_else(|e| {
        log::error!("Error opening data directory: {}", e);
        process::exit(1);
    });

    let settings = container.settings().load().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable settings: {}", e);
        Settings::default()
    });

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });
    let service = MenuService::new(container.cache(), scraper);

    match cli.command {
        Commands::Menu {
            location,
            today,
            week,
            format,
        } => {
            let location_key = location.unwrap_or_else(|| settings.selected_location.clone());
            let mut filter = MenuFilter::from(&settings);
            if today {
                filter.whole_week = false;
            } else if week {
                filter.whole_week = true;
            }

            let menu = service.fetch_menu(&location_key).await.unwrap_or_else(|e| {
                eprintln!("{}", e);
                process::exit(1);
            });
            let selected = filter.select(&menu, Local::now().date_naive());

            match format {
                OutputFormat::Json => {
                    let menu: WeeklyMenu = selected.into_iter().collect();
                    serialize_json(&menu);
                }
                OutputFormat::Text => {
                    println!("┌─ {} Meny", location_key);
                    if selected.is_empty() {
                        println!("{}", NO_MENU_TEXT);
                    }
                    for (day, daily) in selected {
                        println!("── {}", day);
                        print!("{}", daily);
                    }
                    if settings.show_pay_link_on_main_view
                        && let Ok(location) = location_key.parse::<Location>()
                    {
                        println!("\nNettside: {}", location.payment_url());
                    }
                }
            }
        }

        Commands::Widget {
            location,
            daily,
            format,
        } => {
            let location = location.unwrap_or_else(|| saved_location(&settings));
            let menu = service.fetch_location(location).await.unwrap_or_else(|e| {
                log::error!("{}", e);
                WeeklyMenu::new()
            });

            let now = Local::now();
            let timeline = if daily {
                daily_timeline(&menu, &now)
            } else {
                weekly_timeline(&menu, &now)
            };

            match format {
                OutputFormat::Json => serialize_json(&timeline),
                OutputFormat::Text => {
                    for entry in &timeline.entries {
                        println!("┌─ {} {} ─ {}", entry.day_label, entry.date, location);
                        print!("{}", entry.menu);
                    }
                    println!("└─ Neste oppdatering: {}", timeline.refresh_after);
                }
            }
        }

        Commands::Prefetch => {
            let mut events = container.cache().subscribe();
            let service = &service;
            let results = future::join_all(Location::ALL.into_iter().map(|location| async move {
                (location, service.fetch_location(location).await)
            }))
            .await;

            let mut downloaded = Vec::new();
            while let Ok(event) = events.try_recv() {
                if let CacheEvent::Saved(location) = event {
                    downloaded.push(location);
                }
            }

            let mut failed = false;
            for (location, result) in results {
                match result {
                    Ok(menu) => {
                        let source = if downloaded.contains(&location) {
                            "downloaded"
                        } else {
                            "cached"
                        };
                        println!("{}: {} day(s), {}", location, menu.len(), source);
                    }
                    Err(e) => {
                        eprintln!("{}: {}", location, e);
                        failed = true;
                    }
                }
            }
            if failed {
                process::exit(1);
            }
        }

        Commands::ClearCache => {
            let removed = container.cache().clear_all();
            println!("Cleared {} cached menu(s)", removed);
        }

        Commands::Settings { action } => match action {
            SettingsAction::Show => serialize_json(&settings),
            SettingsAction::Set { key, value } => {
                if let Err(e) = container.settings().update(&key, &value) {
                    log::error!("Error updating settings: {}", e);
                    if matches!(e, SettingsError::UnknownKey(_)) {
                        log::info!("Known settings: {}", Settings::KEYS.join(", "));
                    }
                    process::exit(1);
                }
                println!("{} = {}", key, value);
            }
        },

        Commands::Pay { location } => {
            let location = location.unwrap_or_else(|| saved_location(&settings));
            println!("{}", location.payment_url());
        }
    }
}
