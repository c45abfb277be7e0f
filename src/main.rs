mod beam;
mod canvas;
mod colors;
mod config;
mod field;
mod geocode;
mod geometry;
mod help;
mod logging;
mod mode;
mod network;
mod pulse;
mod registry;
mod settings;
mod terminal;

use chrono::Duration;
use clap::{Parser, Subcommand};
use config::{GeocodeConfig, NetworkConfig};
use geocode::{Coordinates, FileStore, GeocodeCache, Geocoder};
use settings::Settings;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tailorpulse")]
#[command(author = "TailorLead")]
#[command(version)]
#[command(about = "Terminal pulse network with a cached address geocoder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live pulse network (type to search, Enter to submit)
    #[command(alias = "viz")]
    Network {
        /// Animation speed (seconds per frame)
        #[arg(short, long, default_value = "0.016")]
        time: f32,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of particles in the field
        #[arg(short, long)]
        nodes: Option<usize>,

        /// Color scheme (0=tailor, 1=ember, 2=violet, 3=mono, 4=matrix)
        #[arg(short = 'c', long)]
        scheme: Option<u8>,
    },

    /// Resolve and cache postal addresses
    Geocode {
        #[command(subcommand)]
        action: GeocodeAction,

        /// Cache file (defaults to the user cache directory)
        #[arg(long, global = true)]
        cache: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GeocodeAction {
    /// Look up an address, from the cache when possible
    Lookup {
        address: String,
        postal_code: String,
        city: String,

        /// Answer from the cache only
        #[arg(long)]
        offline: bool,
    },

    /// Store coordinates for an address
    Set {
        address: String,
        postal_code: String,
        city: String,
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
    },

    /// Remove expired entries
    Prune,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();
    let log_dir = logging::log_dir(settings.log_dir.as_deref());

    match cli.command {
        Commands::Network { time, seed, nodes, scheme } => {
            // the alternate screen owns the terminal, log to file only
            let _guard = logging::init(&log_dir, false);
            let config = NetworkConfig::resolve(&settings, time, seed, nodes, scheme);
            network::run(config)?;
        }
        Commands::Geocode { action, cache } => {
            let _guard = logging::init(&log_dir, true);
            let offline = matches!(action, GeocodeAction::Lookup { offline: true, .. });
            let config = GeocodeConfig::resolve(&settings, cache, offline);
            run_geocode(action, &config);
        }
    }

    Ok(())
}

fn run_geocode(action: GeocodeAction, config: &GeocodeConfig) {
    let cache = GeocodeCache::with_ttl(FileStore::new(&config.cache_path), Duration::days(config.ttl_days));

    match action {
        GeocodeAction::Lookup { address, postal_code, city, .. } => {
            let geocoder = Geocoder::new(cache, config.endpoint.as_str()).offline(config.offline);
            match geocoder.lookup(&address, &postal_code, &city) {
                Some(c) => println!("{},{}", c.latitude, c.longitude),
                None => println!("not found"),
            }
        }
        GeocodeAction::Set { address, postal_code, city, latitude, longitude } => {
            cache.set(&address, &postal_code, &city, Coordinates { latitude, longitude });
            println!("{}", geocode::cache_key(&address, &postal_code, &city));
        }
        GeocodeAction::Prune => {
            let removed = cache.prune();
            println!("removed {} expired, {} remaining", removed, cache.len());
        }
    }
}
