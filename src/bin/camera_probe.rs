//! camera_probe - list local cameras and check that a source delivers frames

use anyhow::{anyhow, Result};
use clap::Parser;

use ripeness_lens::{test_source, SourceConfig};

#[derive(Parser, Debug)]
#[command(name = "camera_probe", about = "List cameras and test frame sources")]
struct Args {
    /// Number of camera indices to probe, starting at 0
    #[arg(long, default_value_t = 5)]
    max_index: usize,

    /// Only test this source (camera index, /dev/videoN, file:// or stub://)
    #[arg(long)]
    source: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(uri) = args.source {
        let config = SourceConfig {
            uri: uri.clone(),
            ..SourceConfig::default()
        };
        if test_source(&config) {
            println!("{}: ok", uri);
            return Ok(());
        }
        return Err(anyhow!("{}: no frame received", uri));
    }

    list_cameras(args.max_index)
}

#[cfg(feature = "ingest-v4l2")]
fn list_cameras(max_index: usize) -> Result<()> {
    let devices = ripeness_lens::ingest::v4l2::probe_devices(max_index);
    if devices.is_empty() {
        println!("no cameras found among the first {} indices", max_index);
        return Ok(());
    }
    for device in devices {
        let fps = device
            .fps
            .map(|fps| format!("{:.1} fps", fps))
            .unwrap_or_else(|| "unknown fps".to_string());
        println!(
            "[{}] {} ({}): {}x{} @ {}, {}",
            device.index, device.path, device.name, device.width, device.height, fps, device.fourcc
        );
    }
    Ok(())
}

#[cfg(not(feature = "ingest-v4l2"))]
fn list_cameras(_max_index: usize) -> Result<()> {
    Err(anyhow!("camera listing needs the ingest-v4l2 feature"))
}
