//! Replay a JSON-lines landmark recording through the frame pipeline and
//! print the fire events as JSON.
//!
//! Usage: `gmc-replay <recording.jsonl> [--press]`
//!
//! Keys are only pressed with `--press`; otherwise the dry-run presser logs
//! what would have been sent.

use std::time::Instant;

use anyhow::Context;
use gmc_pipeline::{
    key_presser_for, load_recording, replay, FramePipeline, KeyMode, PipelineConfig,
};

use gmc_server::logging;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let mut path = None;
    let mut press = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--press" => press = true,
            _ if path.is_none() => path = Some(arg),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }
    let path = path.context("usage: gmc-replay <recording.jsonl> [--press]")?;

    let config = PipelineConfig::from_env()?;
    let mode = if press { config.key_mode } else { KeyMode::DryRun };
    let presser = key_presser_for(mode)?;
    let mut pipeline = FramePipeline::with_presser(&config, presser);

    let frames = load_recording(&path).with_context(|| format!("failed to load {path}"))?;
    let summary = replay(&mut pipeline, &frames, Instant::now());

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
