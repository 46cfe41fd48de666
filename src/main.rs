use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use skycast_core::error::ReqwestErrorExt;
use skycast_core::{AppError, Config, ConfigError, LocationConfig};
use skycast_dashboard::error_mapping::location_error;
use skycast_dashboard::{
    render, spawn_auto_refresh, ApplyPolicy, Dashboard, DashboardMessage, DashboardServices, DashboardView, Notice,
    Theme,
};
use skycast_weather::{
    Acquisition, City, Coordinates, FavoritesStore, FileStore, KeyValueStore, LocationSource, ProviderSettings,
    WeatherProvider,
};
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "skycast", version, about = "Current weather, 5-day forecast and favorite cities")]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Weather at your current location
    Now,
    /// Weather for a city by name
    City {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Look up matching cities
    Search { query: String },
    /// Manage favorite cities
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Interactive dashboard with auto-refresh (default)
    Dashboard,
}

#[derive(Subcommand)]
enum FavoritesAction {
    List,
    /// Resolve a city name and save the first match
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Remove by list number, "Name, CC" or an unambiguous name
    Remove {
        #[arg(required = true)]
        name: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    skycast_core::init()?;

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let (config, _) = Config::load_validated(Some(&config_path)).map_err(|e| match e.downcast::<ConfigError>() {
        Ok(config_error) => {
            let app_error = AppError::from(config_error);
            eprintln!("{} ({})", app_error.user_message(), config_path.display());
            anyhow::Error::from(app_error)
        }
        Err(other) => other,
    })?;
    let color = !cli.no_color && std::io::stdout().is_terminal();

    let provider = Arc::new(
        WeatherProvider::new(ProviderSettings {
            base_url: config.weather.api_base_url.clone(),
            api_key: config.weather.effective_api_key().to_string(),
            timeout: Duration::from_secs(config.weather.request_timeout_secs),
        })
        .map_err(|e| AppError::Network(e.into_network_error()))?,
    );
    let location = Arc::new(location_source(&config.location));
    let theme = Theme::from_dark_mode(config.ui.dark_mode);

    tracing::info!("SkyCast started (config: {})", config_path.display());

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Now => {
            let acquisition = match location.locate().await {
                Ok(coords) => provider.fetch_by_coordinates(coords.latitude, coords.longitude).await,
                Err(e) => {
                    tracing::warn!("Geolocation error: {}", e);
                    println!("{}", location_error(&e).user_message());
                    provider.fetch_by_city_name(&config.weather.default_city).await
                }
            };
            let favorites = FavoritesStore::load(FileStore::in_dir(&config.config_dir));
            print_acquisition(&acquisition, &favorites, theme, color);
        }
        Command::City { name } => {
            let acquisition = provider.fetch_by_city_name(&name.join(" ")).await;
            let favorites = FavoritesStore::load(FileStore::in_dir(&config.config_dir));
            print_acquisition(&acquisition, &favorites, theme, color);
        }
        Command::Search { query } => {
            let cities = provider.search_cities(&query).await;
            if cities.is_empty() {
                println!("No matches.");
            }
            for city in cities {
                println!("{}, {}  ({:.2}, {:.2})", city.name, city.country, city.latitude, city.longitude);
            }
        }
        Command::Favorites { action } => {
            let mut favorites = FavoritesStore::load(FileStore::in_dir(&config.config_dir));
            run_favorites(action, &mut favorites, &provider).await?;
        }
        Command::Dashboard => {
            run_dashboard(config, config_path, provider, location, color).await?;
        }
    }

    Ok(())
}

/// Fixed coordinates win over IP lookup; with neither, geolocation is unsupported.
fn location_source(config: &LocationConfig) -> LocationSource {
    if let Some((latitude, longitude)) = config.fixed() {
        return LocationSource::Fixed(Coordinates { latitude, longitude });
    }
    if config.ip_lookup {
        match LocationSource::ip(config.ip_lookup_url.clone()) {
            Ok(source) => return source,
            Err(e) => tracing::warn!("IP geolocation unavailable: {}", e),
        }
    }
    LocationSource::Unsupported
}

fn print_acquisition<S: KeyValueStore>(
    acquisition: &Acquisition,
    favorites: &FavoritesStore<S>,
    theme: Theme,
    color: bool,
) {
    let snapshot = acquisition.snapshot();
    let fallback = match acquisition {
        Acquisition::Fallback { reason, .. } => Some(*reason),
        Acquisition::Live { .. } => None,
    };
    let view = DashboardView {
        weather: Some(snapshot),
        forecast: acquisition.forecast().unwrap_or(&[]),
        favorites: favorites.list(),
        suggestions: &[],
        is_favorite: favorites.contains(&snapshot.as_city()),
        loading: false,
        last_updated: Some(Utc::now()),
        fallback,
        theme,
    };
    print!("{}", render(&view, Utc::now().timestamp(), color));
}

async fn run_favorites<S: KeyValueStore>(
    action: FavoritesAction,
    favorites: &mut FavoritesStore<S>,
    provider: &WeatherProvider,
) -> Result<()> {
    match action {
        FavoritesAction::List => {
            if favorites.is_empty() {
                println!("No favorites yet.");
            }
            for (i, city) in favorites.list().iter().enumerate() {
                println!("{}. {}, {}", i + 1, city.name, city.country);
            }
        }
        FavoritesAction::Add { name } => {
            let query = name.join(" ");
            let city = provider
                .lookup_city(&query)
                .await
                .context("City lookup failed; nothing was saved")?
                .with_context(|| format!("No city matches {:?}", query))?;
            let label = format!("{}, {}", city.name, city.country);
            if favorites.add(city).context("Failed to save favorites")? {
                println!("{} added to favorites", label);
            } else {
                println!("{} is already a favorite", label);
            }
        }
        FavoritesAction::Remove { name } => {
            let city = find_favorite(favorites.list(), &name.join(" "))?;
            favorites.remove(&city).context("Failed to save favorites")?;
            println!("{} removed from favorites", city.name);
        }
    }
    Ok(())
}

/// Resolve a `favorites remove` argument: a 1-based list number, "Name, CC",
/// or a bare name that matches exactly one favorite. Matching is exact.
fn find_favorite(favorites: &[City], query: &str) -> Result<City> {
    let query = query.trim();
    if let Some(city) = pick(favorites, query) {
        return Ok(city);
    }

    let matches: Vec<&City> = match query.split_once(',') {
        Some((name, country)) => {
            let wanted = City::new(name.trim(), country.trim(), 0.0, 0.0);
            favorites.iter().filter(|c| c.same_place(&wanted)).collect()
        }
        None => favorites.iter().filter(|c| c.name == query).collect(),
    };

    match matches.as_slice() {
        [city] => Ok((*city).clone()),
        [] => bail!("{:?} is not a favorite", query),
        _ => bail!("{:?} matches several favorites; use \"Name, CC\" or a list number", query),
    }
}

const DASHBOARD_HELP: &str = "\
Commands:
  search <city>    show weather for a city
  suggest <text>   list matching cities
  select <n>       show suggestion n
  open <n>         show favorite n
  locate           use my location
  refresh          refresh the current city
  fav              add/remove the current city from favorites
  unfav <n>        remove favorite n
  theme            toggle light/dark
  show             redraw
  quit";

async fn run_dashboard(
    mut config: Config,
    config_path: PathBuf,
    provider: Arc<WeatherProvider>,
    location: Arc<LocationSource>,
    color: bool,
) -> Result<()> {
    let (services, mut rx) = DashboardServices::new(provider, location, config.weather.default_city.clone());
    let favorites = FavoritesStore::load(FileStore::in_dir(&config.config_dir));
    let policy = if config.weather.discard_superseded {
        ApplyPolicy::LatestRequest
    } else {
        ApplyPolicy::CompletionOrder
    };
    let mut dashboard = Dashboard::new(
        services.clone(),
        favorites,
        policy,
        Theme::from_dark_mode(config.ui.dark_mode),
    );

    let cancel = CancellationToken::new();
    let timer = (config.weather.refresh_minutes > 0).then(|| {
        let period = Duration::from_secs(u64::from(config.weather.refresh_minutes) * 60);
        spawn_auto_refresh(services.sender(), period, cancel.clone())
    });

    println!("{}\n", DASHBOARD_HELP);
    dashboard.locate();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match run_command(&mut dashboard, line.trim()) {
                    Outcome::Quit => break,
                    Outcome::Redraw => redraw(&dashboard, color),
                    Outcome::ThemeChanged(theme) => {
                        config.ui.dark_mode = theme.is_dark();
                        if let Err(e) = config.save_to(&config_path) {
                            tracing::error!("Failed to save theme: {:#}", e);
                        }
                        redraw(&dashboard, color);
                    }
                    Outcome::Nothing => {}
                }
                print_notices(&mut dashboard);
            }
            Some(message) = rx.recv() => {
                let redraws = !matches!(message, DashboardMessage::RefreshTick | DashboardMessage::Notice(_));
                dashboard.apply(message);
                print_notices(&mut dashboard);
                if redraws {
                    redraw(&dashboard, color);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    cancel.cancel();
    if let Some(timer) = timer {
        let _ = timer.await;
    }
    tracing::info!("Dashboard closed");
    Ok(())
}

enum Outcome {
    Nothing,
    Redraw,
    ThemeChanged(Theme),
    Quit,
}

fn run_command<S: KeyValueStore>(dashboard: &mut Dashboard<S>, line: &str) -> Outcome {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match command {
        "" => Outcome::Nothing,
        "quit" | "exit" | "q" => Outcome::Quit,
        "help" => {
            println!("{}", DASHBOARD_HELP);
            Outcome::Nothing
        }
        "search" => {
            if !dashboard.search(arg) {
                println!("Usage: search <city>");
            }
            Outcome::Nothing
        }
        "suggest" => {
            dashboard.suggest(arg);
            Outcome::Nothing
        }
        "select" => {
            match pick(dashboard.suggestions(), arg) {
                Some(city) => dashboard.select(&city),
                None => println!("No such suggestion"),
            }
            Outcome::Nothing
        }
        "open" => {
            match pick(dashboard.favorites(), arg) {
                Some(city) => dashboard.select(&city),
                None => println!("No such favorite"),
            }
            Outcome::Nothing
        }
        "locate" => {
            dashboard.locate();
            Outcome::Nothing
        }
        "refresh" => {
            if !dashboard.refresh() {
                println!("Nothing to refresh yet");
            }
            Outcome::Nothing
        }
        "fav" => match dashboard.toggle_favorite() {
            Some(_) => Outcome::Redraw,
            None => Outcome::Nothing,
        },
        "unfav" => match pick(dashboard.favorites(), arg) {
            Some(city) => {
                dashboard.remove_favorite(&city);
                Outcome::Redraw
            }
            None => {
                println!("No such favorite");
                Outcome::Nothing
            }
        },
        "theme" => Outcome::ThemeChanged(dashboard.toggle_theme()),
        "show" => Outcome::Redraw,
        other => {
            println!("Unknown command {:?}; type help", other);
            Outcome::Nothing
        }
    }
}

/// 1-based index into `cities`.
fn pick(cities: &[City], arg: &str) -> Option<City> {
    let index = arg.parse::<usize>().ok()?.checked_sub(1)?;
    cities.get(index).cloned()
}

fn redraw<S: KeyValueStore>(dashboard: &Dashboard<S>, color: bool) {
    println!("\n{}", render(&dashboard.view(), Utc::now().timestamp(), color));
}

fn print_notices<S: KeyValueStore>(dashboard: &mut Dashboard<S>) {
    for notice in dashboard.take_notices() {
        match notice {
            Notice::Success(message) => println!("✓ {}", message),
            Notice::Error(message) => println!("! {}", message),
        }
    }
}
