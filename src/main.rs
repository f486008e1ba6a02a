mod config;
mod devices;
mod predict;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use crate::config::{Config, DeviceConnection};
use crate::devices::{DummyRadio, DummyRotor, Radio, RigctldRadio, Rotor, RotctldRotor};
use crate::predict::{GroundStation, Sgp4Source, TleLoader};
use crate::tracker::{
    lock, simulate_pass, CatalogError, Devices, Selector, Tracker, TrackingController,
    TransponderCatalog,
};
use crate::web::AppState;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "sat-tracker")]
#[command(about = "Doppler and rotor tracking for satellite passes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and list trackable satellites
    Check { config: String },
    /// Print the rotor commands for the next pass of a satellite
    Simulate {
        config: String,
        satellite: String,
        /// Print the steps as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track satellites and serve the control API
    Run {
        config: String,
        /// Satellite to select at start-up (NORAD id or name)
        #[arg(long)]
        satellite: Option<String>,
        /// Engage the rig immediately after selecting
        #[arg(long, requires = "satellite")]
        engage: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { config } => check(&config),
        Commands::Simulate {
            config,
            satellite,
            json,
        } => simulate(&config, &satellite, json),
        Commands::Run {
            config,
            satellite,
            engage,
        } => run(&config, satellite, engage),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct Station {
    config: Config,
    location: GroundStation,
    tles: Arc<TleLoader>,
}

fn load(path: &str) -> Result<Station, Box<dyn Error>> {
    let config = Config::from_file(path)?;
    let location = config.station.ground_station()?;
    let mut tles = TleLoader::new(config.catalog.tle_folder.clone());
    tles.load_all()?;
    Ok(Station {
        config,
        location,
        tles: Arc::new(tles),
    })
}

impl Station {
    fn selector(&self) -> Selector {
        Selector::new(
            self.tles.clone(),
            TransponderCatalog::new(self.config.catalog.transponder_folder.clone()),
            self.location,
            self.config.track_step(),
        )
    }
}

fn check(path: &str) -> CliResult {
    let station = load(path)?;
    let loc = station.location;
    println!(
        "Station {} at {:.4}, {:.4} ({}), {} m",
        station.config.station.name.as_deref().unwrap_or("(unnamed)"),
        loc.latitude_deg,
        loc.longitude_deg,
        loc.maidenhead(6),
        loc.altitude_m
    );

    let selector = station.selector();
    let mut trackable = 0;
    for sat in station.tles.satellites() {
        match selector.catalog().load(sat.info.norad_id) {
            Ok(t) => {
                trackable += 1;
                println!(
                    "  {:>6}  {:<24} {} ({}, {})",
                    sat.info.norad_id,
                    sat.info.name,
                    t.main.name,
                    t.main.mode,
                    if t.main.inverting { "inverting" } else { "non-inverting" }
                );
            }
            Err(CatalogError::NotFound(_)) => {}
            Err(e) => println!("  {:>6}  {:<24} error: {}", sat.info.norad_id, sat.info.name, e),
        }
    }
    println!(
        "{} of {} satellites have transponder data",
        trackable,
        station.tles.satellites().len()
    );
    Ok(())
}

fn simulate(path: &str, satellite: &str, json: bool) -> CliResult {
    let station = load(path)?;
    let selection = station.selector().resolve(satellite, chrono::Utc::now())?;
    let policy = station.config.controller_settings().policy;
    let steps = simulate_pass(policy, &selection.track);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "satellite": selection.satellite,
                "pass": selection.pass,
                "steps": steps,
            }))?
        );
        return Ok(());
    }

    println!(
        "{} AOS {} LOS {} max el {:.1}",
        selection.satellite.name,
        selection.pass.aos,
        selection.pass.los,
        selection.pass.max_elevation_deg
    );
    for step in steps {
        println!(
            "{}  sat {:6.1} {:5.1}  rotor {:6.1} {:5.1} {}",
            step.point.time.format("%H:%M:%S"),
            step.point.azimuth_deg,
            step.point.elevation_deg,
            step.target.azimuth_deg,
            step.target.elevation_deg,
            if step.commanded { "*" } else { "" }
        );
    }
    Ok(())
}

fn build_devices(config: &Config) -> Devices {
    let radio: Box<dyn Radio> = match &config.radio.connection {
        DeviceConnection::Dummy => Box::new(DummyRadio::new()),
        DeviceConnection::Hamlib { address } => Box::new(RigctldRadio::new(address.clone())),
    };
    let rotor = config.rotor.as_ref().map(|r| -> Box<dyn Rotor> {
        match &r.connection {
            DeviceConnection::Dummy => Box::new(DummyRotor::default()),
            DeviceConnection::Hamlib { address } => Box::new(RotctldRotor::new(address.clone())),
        }
    });
    Devices { radio, rotor }
}

fn run(path: &str, satellite: Option<String>, engage: bool) -> CliResult {
    let station = load(path)?;
    let selector = Arc::new(station.selector());
    let controller = Arc::new(Mutex::new(TrackingController::new(
        station.config.controller_settings(),
    )));

    if let Some(query) = satellite {
        let selection = selector.resolve(&query, chrono::Utc::now())?;
        let mut ctl = lock(&controller);
        ctl.select(selection);
        if engage {
            ctl.engage(true)?;
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let source = Arc::new(Sgp4Source::new(station.tles.clone(), station.location));
        let mut tracker = Tracker::new(controller.clone());
        tracker.start(
            build_devices(&station.config),
            source,
            station.config.tracking.tick,
        )?;

        let config = Arc::new(station.config);
        if let Some(web) = config.web.clone() {
            let state = AppState {
                config: config.clone(),
                controller,
                selector,
            };
            tokio::spawn(async move {
                if let Err(e) = web::run_server(web.bind, state).await {
                    log::error!("Web server failed: {}", e);
                }
            });
        }

        tokio::signal::ctrl_c().await?;
        log::info!("Shutting down");
        tracker.stop().await;
        Ok::<(), Box<dyn Error>>(())
    })
}
