//! # Node HAL Binary
//!
//! Registers the devices listed in the ledger configuration, arms their
//! alert attributes and logs every alert event until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Run against real sysfs attributes
//! node_hal --config /etc/node/ledger.toml
//!
//! # Simulated attributes and signal lines
//! node_hal --config ledger.toml -s -v
//!
//! # Override the property tables
//! node_hal --config ledger.toml --property-file properties.json
//! ```

use clap::Parser;
use node_common::config::{ConfigLoader, IrqBackend, LogLevel, NodeConfig};
use node_common::alert::AlertCallbackData;
use node_common::consts::DEFAULT_CONFIG_PATH;
use node_common::device::DeviceObject;
use node_hal::{
    AppCallback, DriverRegistry, JsonPropertyLoader, Ledger, LedgerContext, SimulatedAttributes,
    SimulatedLines,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Node HAL - device ledger and alert dispatch
#[derive(Parser, Debug)]
#[command(name = "node_hal")]
#[command(version)]
#[command(about = "Device ledger and interrupt dispatch for the node HAL")]
#[command(long_about = None)]
struct Args {
    /// Path to the ledger configuration file (ledger.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use simulated attributes and signal lines
    #[arg(short = 's', long)]
    simulate: bool,

    /// JSON property tables (overrides `ledger.property_file`)
    #[arg(long, value_name = "FILE")]
    property_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Node HAL startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loaded = NodeConfig::load(&args.config);

    setup_tracing(&args, loaded.as_ref().map(|c| c.shared.log_level).unwrap_or_default());
    let config = loaded?;
    info!("Node HAL v{} starting...", env!("CARGO_PKG_VERSION"));
    config.validate()?;
    info!(
        "Loaded {:?}: {} module(s), {} device(s)",
        args.config,
        config.modules.len(),
        config.device_count()
    );

    let (ctx, simulated) = build_context(&args, &config)?;
    let ledger = Ledger::new(DriverRegistry::with_builtin_drivers(), ctx);

    let mut registered = Vec::new();
    for module in &config.modules {
        let reports = ledger.register(&module.module_id, &module.devices);
        let ok = reports.iter().filter(|r| r.result.is_ok()).count();
        info!(
            "Module {}: {}/{} device(s) registered",
            module.module_id,
            ok,
            reports.len()
        );
        registered.extend(reports.into_iter().filter(|r| r.result.is_ok()).map(|r| r.obj));
    }

    if let Some(attrs) = &simulated {
        seed_attributes(&ledger, attrs, &registered);
    }

    let callback = logging_callback();
    for obj in &registered {
        if let Err(e) = ledger.register_app_callback(obj, callback.clone()) {
            warn!("{}: cannot attach callback: {}", obj, e);
        }
    }

    if config.ledger.enable_alerts {
        let armed = arm_alerts(&ledger, &registered);
        info!("{} alert source(s) armed", armed);
    }
    ledger.dump();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    ledger.shutdown();
    info!("Node HAL shutdown complete");
    Ok(())
}

fn build_context(
    args: &Args,
    config: &NodeConfig,
) -> Result<(LedgerContext, Option<Arc<SimulatedAttributes>>), Box<dyn std::error::Error>> {
    let mut ctx = LedgerContext::from_settings(&config.ledger);
    let mut simulated = None;

    if args.simulate || config.ledger.irq_backend == IrqBackend::Simulated {
        info!("Simulation mode enabled");
        let attrs = Arc::new(SimulatedAttributes::new());
        ctx.attrs = attrs.clone();
        ctx.lines = Arc::new(SimulatedLines::new());
        simulated = Some(attrs);
    }

    if let Some(path) = args.property_file.as_ref().or(config.ledger.property_file.as_ref()) {
        let loader = JsonPropertyLoader::from_file(path)
            .map_err(|e| format!("property file {}: {}", path.display(), e))?;
        ctx = ctx.with_properties(Arc::new(loader));
    }
    Ok((ctx, simulated))
}

/// Create every attribute of the registered path-backed devices.
fn seed_attributes(ledger: &Ledger, attrs: &SimulatedAttributes, registered: &[DeviceObject]) {
    for dev in registered.iter().filter_map(|obj| ledger.device(obj)) {
        if let Some(base) = &dev.attr_path {
            let created = attrs.seed_device(base, dev.property_table());
            info!("{}: {} simulated attribute(s) under {:?}", dev.obj, created, base);
        }
    }
}

fn logging_callback() -> AppCallback {
    Arc::new(|obj: &DeviceObject, events: &[AlertCallbackData]| {
        for event in events {
            warn!(
                "ALERT {} property {}: {} (value {})",
                obj, event.property_index, event.alert_state, event.raw_value
            );
        }
    })
}

/// Enable IRQs for every available alert property.
fn arm_alerts(ledger: &Ledger, registered: &[DeviceObject]) -> usize {
    let mut armed = 0;
    for obj in registered {
        let Ok(props) = ledger.read_properties(obj) else {
            continue;
        };
        for (idx, prop) in props.iter().enumerate() {
            if !prop.is_alert() || !prop.is_available() {
                continue;
            }
            match ledger.enable_irq(obj, idx) {
                Ok(()) => armed += 1,
                Err(e) => warn!("{}: cannot arm property {} ({}): {}", obj, idx, prop.name, e),
            }
        }
    }
    armed
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
