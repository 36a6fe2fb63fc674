mod serial;

use std::time::Duration;

use clap::{Parser, Subcommand};
use fpsensor_core::{LedColor, LedMode, SensorEngine, SessionConfig};
use tracing::info;

use serial::SerialChannel;

#[derive(Parser)]
#[command(name = "fpsensor", about = "Drive a ZFM/R30x/R55x/FPM10A fingerprint sensor")]
struct Cli {
    /// Serial device path, e.g. /dev/ttyUSB0
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Initial baud rate to open the port at
    #[arg(long, default_value_t = 57600)]
    baud: u32,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a finger, build a template, and store it in an auto-allocated slot.
    Enroll,
    /// Wait for a finger and search the database for a match.
    Identify {
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
        #[arg(long, default_value_t = 0)]
        min_accuracy: i32,
    },
    /// Print system parameters.
    Params,
    /// Delete a template by position.
    Delete {
        position: u16,
        #[arg(long, default_value_t = 1)]
        count: u16,
    },
    /// Clear the entire template database.
    Clear,
    /// Export every stored template to a JSON file.
    Export { out: String },
    /// Set LED color/mode.
    Led {
        #[arg(value_enum)]
        mode: LedModeArg,
        #[arg(long, default_value_t = 5)]
        speed: u8,
        #[arg(long, default_value_t = 0)]
        cycles: u8,
    },
    /// Capture and save a fingerprint image as BMP.
    Snapshot { out: String },
}

#[derive(Clone, clap::ValueEnum)]
enum LedModeArg {
    Breathing,
    Flashing,
    AlwaysOn,
    AlwaysOff,
}

fn parse_u32(value: &str) -> anyhow::Result<u32> {
    if let Some(hex) = value.strip_prefix("0x") {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(value.parse()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = SessionConfig::default();
    if let Some(address) = &cli.address {
        config.address = parse_u32(address)?;
    }
    if let Some(password) = &cli.password {
        config.password = parse_u32(password)?;
    }

    let channel = SerialChannel::open(&cli.port, cli.baud)?;
    let mut engine = SensorEngine::connect(channel, config).await?;
    info!(port = %cli.port, "connected to sensor");

    match cli.command {
        Command::Enroll => run_enroll(&mut engine).await?,
        Command::Identify { timeout_secs, min_accuracy } => run_identify(&mut engine, timeout_secs, min_accuracy).await?,
        Command::Params => run_params(&mut engine).await?,
        Command::Delete { position, count } => {
            let ok = engine.delete_template(position, count).await?;
            println!("deleted: {ok}");
        }
        Command::Clear => {
            let ok = engine.clear_database().await?;
            println!("cleared: {ok}");
        }
        Command::Export { out } => run_export(&mut engine, &out).await?,
        Command::Led { mode, speed, cycles } => run_led(&mut engine, mode, speed, cycles).await?,
        Command::Snapshot { out } => run_snapshot(&mut engine, &out).await?,
    }

    Ok(())
}

async fn run_enroll<C: fpsensor_core::ByteChannel>(engine: &mut SensorEngine<C>) -> anyhow::Result<()> {
    use fpsensor_core::constants::{BUFFER1, BUFFER2};

    println!("place finger (1/2)...");
    while !engine.read_image().await? {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    engine.convert_image(BUFFER1).await?;

    println!("lift, then place the same finger again (2/2)...");
    tokio::time::sleep(Duration::from_secs(1)).await;
    while !engine.read_image().await? {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    engine.convert_image(BUFFER2).await?;

    if !engine.create_template().await? {
        anyhow::bail!("the two captures did not match the same finger");
    }

    let position = fpsensor_core::workflows::store_template_auto(engine, BUFFER1).await?;
    println!("stored template at position {position}");
    Ok(())
}

async fn run_identify<C: fpsensor_core::ByteChannel>(
    engine: &mut SensorEngine<C>,
    timeout_secs: u64,
    min_accuracy: i32,
) -> anyhow::Result<()> {
    println!("place finger...");
    let result = fpsensor_core::workflows::scan(engine, Duration::from_secs(timeout_secs), min_accuracy, || false).await?;
    if result.found {
        println!("match: position={} accuracy={}", result.position, result.accuracy);
    } else {
        println!("no match");
    }
    Ok(())
}

async fn run_params<C: fpsensor_core::ByteChannel>(engine: &mut SensorEngine<C>) -> anyhow::Result<()> {
    let params = engine.get_system_parameters().await?;
    println!("{params:#?}");
    Ok(())
}

async fn run_export<C: fpsensor_core::ByteChannel>(engine: &mut SensorEngine<C>, out: &str) -> anyhow::Result<()> {
    let records = fpsensor_core::workflows::export_database(engine).await?;
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(out, json)?;
    println!("exported {} templates to {out}", records.len());
    Ok(())
}

async fn run_led<C: fpsensor_core::ByteChannel>(
    engine: &mut SensorEngine<C>,
    mode: LedModeArg,
    speed: u8,
    cycles: u8,
) -> anyhow::Result<()> {
    let mode = match mode {
        LedModeArg::Breathing => LedMode::Breathing,
        LedModeArg::Flashing => LedMode::Flashing,
        LedModeArg::AlwaysOn => LedMode::AlwaysOn,
        LedModeArg::AlwaysOff => LedMode::AlwaysOff,
    };
    engine.led_control(LedColor::Blue, mode, speed, cycles).await?;
    Ok(())
}

async fn run_snapshot<C: fpsensor_core::ByteChannel>(engine: &mut SensorEngine<C>, out: &str) -> anyhow::Result<()> {
    println!("place finger...");
    while !engine.read_image().await? {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let raster = engine.download_image().await?;
    let buffer = image::GrayImage::from_raw(raster.width as u32, raster.height as u32, raster.pixels)
        .ok_or_else(|| anyhow::anyhow!("raster dimensions did not match pixel buffer length"))?;
    buffer.save(out)?;
    println!("saved {out}");
    Ok(())
}
