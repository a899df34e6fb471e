// packages/engine/src/main.rs
//! Air Traffic Coordination Simulator
//!
//! Each actor role runs as its own process over a System V message queue, or
//! every role runs in one process with `simulate`.

use anyhow::{bail, Context, Result};
use atc_sim_engine::channel::{ChannelHandle, ChannelRegistry};
use atc_sim_engine::observability::{init_metrics, init_tracing};
use atc_sim_engine::payload::{CargoManifest, Passenger, PassengerManifest, Payload};
use atc_sim_engine::protocol::{
    fly, request_shutdown, AirportActor, Controller, ControllerConfig, FlightRecord,
    JourneyOutcome, PlaneCategory,
};
use atc_sim_engine::recording::FlightLog;
use atc_sim_engine::runway::{RunwayPool, ServiceTimes};
use atc_sim_engine::simulation::{AirportSpec, Simulation, SimulationConfig};
use atc_sim_engine::utils::config::{ChannelConfig, SimConfig};
use atc_sim_engine::utils::validation::{validate_airport_id, validate_runway_count};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "atc-sim")]
#[command(about = "Air traffic coordination simulator", version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "ATC_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the shared queue and sequence journeys until shut down
    Controller {
        /// Pause before removing the queue so other processes can read their last message
        #[arg(long, default_value = "500")]
        grace_ms: u64,
    },

    /// Serve departures and arrivals for one airport
    Airport {
        /// Airport number (1-10)
        #[arg(long)]
        id: u32,

        /// Regular runway capacities in kg, comma separated (even count)
        #[arg(long, value_delimiter = ',', required = true)]
        capacities: Vec<u32>,
    },

    /// Fly one plane from departure to arrival
    Plane {
        #[arg(long)]
        id: u32,

        #[arg(long)]
        departure: u32,

        #[arg(long)]
        arrival: u32,

        /// Passenger as LUGGAGE:BODY weights in kg, once per occupied seat
        #[arg(long = "passenger", value_parser = parse_passenger, conflicts_with_all = ["cargo_items", "cargo_average"])]
        passengers: Vec<Passenger>,

        /// Number of cargo items (1-100)
        #[arg(long, requires = "cargo_average")]
        cargo_items: Option<u32>,

        /// Average cargo item weight in kg (1-100)
        #[arg(long, requires = "cargo_items")]
        cargo_average: Option<u32>,
    },

    /// Ask the controller to stop
    Shutdown,

    /// Run every actor in this process over an in-memory channel
    Simulate {
        /// Airport as ID:CAP,CAP,... (repeatable)
        #[arg(long = "airport", value_parser = parse_airport, required = true)]
        airports: Vec<AirportSpec>,

        /// Flight as PLANE:DEPARTURE:ARRIVAL:WEIGHT (repeatable)
        #[arg(long = "flight", value_parser = parse_flight, required = true)]
        flights: Vec<FlightRecord>,

        /// Skip simulated service delays
        #[arg(long)]
        instant: bool,

        /// Fly all planes at once
        #[arg(long)]
        concurrent: bool,

        /// Print Prometheus metrics when done
        #[arg(long)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SimConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(cli.json || config.log.json)?;

    info!("atc-sim v{}", atc_sim_engine::VERSION);

    match cli.command {
        Command::Controller { grace_ms } => run_controller(&config, grace_ms).await,
        Command::Airport { id, capacities } => run_airport(&config, id, capacities).await,
        Command::Plane {
            id,
            departure,
            arrival,
            passengers,
            cargo_items,
            cargo_average,
        } => {
            let payload = match (cargo_items, cargo_average) {
                (Some(items), Some(average)) => Payload::Cargo(CargoManifest::new(items, average)?),
                _ => Payload::Passenger(PassengerManifest::new(passengers)?),
            };
            run_plane(&config, id, departure, arrival, payload).await
        }
        Command::Shutdown => {
            let channel = attach_channel(&config.channel)?;
            request_shutdown(&channel).await?;
            Ok(())
        }
        Command::Simulate {
            airports,
            flights,
            instant,
            concurrent,
            metrics,
        } => {
            let handle = init_metrics(metrics || config.metrics.enabled)?;
            let service = if instant {
                ServiceTimes::instant()
            } else {
                config.service.service_times()
            };

            let sim = Simulation::new(
                Arc::new(ChannelRegistry::new()),
                SimulationConfig {
                    channel_name: config.channel.name.clone(),
                    airports,
                    service,
                    flight_log: FlightLog::new(&config.log.flight_log_path),
                    require_even_runways: true,
                    concurrent,
                },
            )?;

            let report = sim.run(flights).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(handle) = handle {
                println!("{}", handle.render());
            }
            Ok(())
        }
    }
}

async fn run_controller(config: &SimConfig, grace_ms: u64) -> Result<()> {
    let channel = create_channel(&config.channel)?;
    let controller = Controller::with_config(
        channel,
        FlightLog::new(&config.log.flight_log_path),
        ControllerConfig {
            teardown_grace: Duration::from_millis(grace_ms),
        },
    );

    let report = controller.run().await?;
    info!(
        "Controller handled {} journeys, aborted {}",
        report.journeys.len(),
        report.aborted.len()
    );
    Ok(())
}

async fn run_airport(config: &SimConfig, id: u32, capacities: Vec<u32>) -> Result<()> {
    // Operator input is checked before touching the queue
    validate_airport_id(id)?;
    validate_runway_count(capacities.len())?;
    let pool = Arc::new(RunwayPool::new(id, &capacities)?);

    let channel = attach_channel(&config.channel)?;
    let report = AirportActor::new(pool, config.service.service_times(), channel)
        .run()
        .await?;

    info!(
        "Airport {} handled {} departures and {} arrivals",
        report.airport_id,
        report.departures.len(),
        report.arrivals.len()
    );
    Ok(())
}

async fn run_plane(
    config: &SimConfig,
    id: u32,
    departure: u32,
    arrival: u32,
    payload: Payload,
) -> Result<()> {
    let record = FlightRecord::new(id, departure, arrival, &payload)?;
    let channel = attach_channel(&config.channel)?;

    match fly(&channel, &record).await? {
        JourneyOutcome::Completed(record) => {
            println!(
                "Plane {} has successfully travelled from Airport {} to Airport {}!",
                record.plane_id, record.departure, record.arrival
            );
            Ok(())
        }
        JourneyOutcome::Aborted(record) => {
            bail!("plane {} was not flown: controller shut down", record.plane_id)
        }
    }
}

#[cfg(target_os = "linux")]
fn create_channel(config: &ChannelConfig) -> Result<ChannelHandle> {
    Ok(Arc::new(atc_sim_engine::channel::SysvChannel::create(config)?))
}

#[cfg(target_os = "linux")]
fn attach_channel(config: &ChannelConfig) -> Result<ChannelHandle> {
    Ok(Arc::new(atc_sim_engine::channel::SysvChannel::attach(config)?))
}

#[cfg(not(target_os = "linux"))]
fn create_channel(_config: &ChannelConfig) -> Result<ChannelHandle> {
    bail!("multi-process mode needs System V message queues; use `simulate`")
}

#[cfg(not(target_os = "linux"))]
fn attach_channel(_config: &ChannelConfig) -> Result<ChannelHandle> {
    bail!("multi-process mode needs System V message queues; use `simulate`")
}

fn parse_passenger(value: &str) -> std::result::Result<Passenger, String> {
    let (luggage, body) = value
        .split_once(':')
        .ok_or_else(|| format!("expected LUGGAGE:BODY, got '{}'", value))?;
    let luggage = luggage.trim().parse().map_err(|e| format!("luggage: {}", e))?;
    let body = body.trim().parse().map_err(|e| format!("body weight: {}", e))?;
    Passenger::new(luggage, body).map_err(|e| e.to_string())
}

fn parse_airport(value: &str) -> std::result::Result<AirportSpec, String> {
    let (id, capacities) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ID:CAP,CAP,..., got '{}'", value))?;
    let id = id.trim().parse().map_err(|e| format!("airport id: {}", e))?;
    let capacities = capacities
        .split(',')
        .map(|c| c.trim().parse().map_err(|e| format!("capacity '{}': {}", c, e)))
        .collect::<std::result::Result<Vec<u32>, String>>()?;
    Ok(AirportSpec::new(id, capacities))
}

fn parse_flight(value: &str) -> std::result::Result<FlightRecord, String> {
    let fields = value
        .split(':')
        .map(|f| f.trim().parse::<u32>().map_err(|e| format!("'{}': {}", f, e)))
        .collect::<std::result::Result<Vec<u32>, String>>()?;

    let &[plane_id, departure, arrival, weight] = fields.as_slice() else {
        return Err(format!("expected PLANE:DEPARTURE:ARRIVAL:WEIGHT, got '{}'", value));
    };

    let payload = Payload::Fixed {
        category: PlaneCategory::Cargo,
        weight,
        passengers: 0,
    };
    FlightRecord::new(plane_id, departure, arrival, &payload).map_err(|e| e.to_string())
}
