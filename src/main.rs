use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use slot_reservation::api::config_dto::ControllerConfigDto;
use slot_reservation::domain::reservation_system::agent::Agent;
use slot_reservation::domain::reservation_system::config::{AgentConfig, ControllerConfig};
use slot_reservation::domain::reservation_system::controller;
use slot_reservation::loader::parser::parse_json_file;
use slot_reservation::loader::request_file::load_requests;
use slot_reservation::logger;

#[derive(Debug, Parser)]
#[command(name = "slot-reservation", about = "Hourly slot reservations for one simulated day")]
struct Cli {
    /// Log level (overrides RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the controller for one simulated day.
    Controller(ControllerArgs),
    /// Submits the requests of one file to a running controller.
    Agent(AgentArgs),
}

#[derive(Debug, Args)]
struct ControllerArgs {
    /// JSON configuration file; flags given below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short = 'i', long)]
    start_hour: Option<i64>,
    #[arg(short = 'f', long)]
    end_hour: Option<i64>,
    #[arg(short = 's', long)]
    seconds_per_hour: Option<f64>,
    #[arg(short = 't', long)]
    max_capacity: Option<i64>,
    #[arg(short = 'p', long)]
    inbound_channel: Option<String>,
}

#[derive(Debug, Args)]
struct AgentArgs {
    #[arg(short = 's', long)]
    name: String,
    /// Request file, one `family,hour,party_size` per line.
    #[arg(short = 'a', long)]
    requests: PathBuf,
    #[arg(short = 'p', long)]
    inbound_channel: PathBuf,
    /// Directory the response channel is created in.
    #[arg(long, default_value = ".")]
    response_dir: PathBuf,
}

fn controller_config(args: ControllerArgs) -> anyhow::Result<ControllerConfig> {
    let mut dto = match &args.config {
        Some(path) => parse_json_file::<ControllerConfigDto>(path).with_context(|| format!("reading '{}'", path.display()))?,
        None => ControllerConfigDto {
            start_hour: args.start_hour.context("-i <START_HOUR> is required without --config")?,
            end_hour: args.end_hour.context("-f <END_HOUR> is required without --config")?,
            seconds_per_hour: args.seconds_per_hour.context("-s <SECONDS_PER_HOUR> is required without --config")?,
            max_capacity: args.max_capacity.context("-t <MAX_CAPACITY> is required without --config")?,
            inbound_channel: args.inbound_channel.clone().context("-p <INBOUND_CHANNEL> is required without --config")?,
            registry_capacity: None,
            in_flight_grace_ms: None,
            listener_grace_ms: None,
        },
    };

    if let Some(hour) = args.start_hour {
        dto.start_hour = hour;
    }
    if let Some(hour) = args.end_hour {
        dto.end_hour = hour;
    }
    if let Some(seconds) = args.seconds_per_hour {
        dto.seconds_per_hour = seconds;
    }
    if let Some(capacity) = args.max_capacity {
        dto.max_capacity = capacity;
    }
    if let Some(channel) = args.inbound_channel {
        dto.inbound_channel = channel;
    }

    Ok(ControllerConfig::try_from(dto)?)
}

async fn run_controller(args: ControllerArgs) -> anyhow::Result<()> {
    let config = controller_config(args)?;
    let report = controller::run(config).await?;

    println!("{}", report);
    Ok(())
}

async fn run_agent(args: AgentArgs) -> anyhow::Result<()> {
    let requests = load_requests(&args.requests).with_context(|| format!("loading '{}'", args.requests.display()))?;

    let mut config = AgentConfig::new(args.name, args.inbound_channel);
    config.response_dir = args.response_dir;

    let agent = Agent::connect(config).await?;
    let outcome = agent.run(requests).await?;

    for response in &outcome.responses {
        println!("{}", response);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = cli.log_level.as_deref().and_then(|value| value.parse::<LevelFilter>().ok());

    match cli.command {
        Command::Controller(args) => {
            logger::init("controller.log", level);
            run_controller(args).await
        }
        Command::Agent(args) => {
            logger::init(&format!("agent_{}.log", args.name), level);
            run_agent(args).await
        }
    }
}
