use anyhow::{Result, anyhow};
use herald::Session;
use herald::script::Script;
use log::info;
use speech::LogSink;
use std::env;
use std::fs;
use tokio::runtime::Runtime;

/// Replay a recorded event script and narrate it to the log.
///
/// Usage: `herald [--realtime] <script.json>`. By default the script runs
/// under virtual time (instant, deterministic); `--realtime` drives it
/// through the tokio host loop on the wall clock.
fn main() -> Result<()> {
    env_logger::init();

    let mut realtime = false;
    let mut path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--realtime" => realtime = true,
            _ => path = Some(arg),
        }
    }
    let path = path.ok_or_else(|| anyhow!("usage: herald [--realtime] <script.json>"))?;

    let text = fs::read_to_string(&path)?;
    let script = Script::parse(&text)?;
    info!(
        "replaying {path}: {} nodes, {} steps",
        script.document.len(),
        script.steps.len()
    );

    let mut session = Session::new(Box::new(LogSink));
    if realtime {
        let runtime = Runtime::new()?;
        runtime.block_on(herald::script::replay_realtime(&script, &mut session))?;
    } else {
        herald::script::replay(&script, &mut session)?;
    }
    Ok(())
}
