use std::fs::File;
use std::io::{self, IsTerminal, Read};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};

use wwvbrx::{load_params, ReceiverBuilder};

mod app;
mod cli;
mod store;

use cli::Args;
use store::FileStore;

fn main() {
    // clap reports usage errors and services --help/--version itself
    let args = Args::parse();
    log_setup(&args);

    if let Err(err) = wwvbdec(&args) {
        eprintln!("wwvbdec: {:#}", err);
        std::process::exit(1);
    }
}

fn wwvbdec(args: &Args) -> Result<()> {
    let mut builder = ReceiverBuilder::new();
    builder
        .with_score_threshold(args.score_threshold)
        .with_seek_detections(args.seek_detections)
        .with_sync_miss_limit(args.sync_miss_limit)
        .with_drift_trigger(args.drift_trigger)
        .with_min_discipline_ticks(args.min_discipline_ticks)
        .with_persist_after_ticks(args.persist_after_ticks);

    // load any stored oscillator trim before building the receiver
    let mut store = args.calibration.as_ref().map(FileStore::new);
    if let Some(store) = store.as_mut() {
        match load_params(store) {
            Ok(params) => {
                info!("loaded calibration: {} scaled counts", params.scaled());
                builder.with_clock_params(params);
            }
            Err(err) => {
                warn!("calibration unavailable ({}); using nominal period", err);
            }
        }
    }

    let mut rx = builder.build();

    if args.demo {
        app::run_demo(args, &mut rx, store.as_mut());
        return Ok(());
    }

    let input = open_input(args)?;
    let bits = input
        .bytes()
        .map_while(|byte| byte.ok())
        .filter_map(app::sample_from_byte);
    app::run(args, &mut rx, bits, store.as_mut());

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        return;
    }

    // an explicit RUST_LOG wins over the -v count
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
        return;
    }

    const LEVELS: [LevelFilter; 3] = [LevelFilter::Warn, LevelFilter::Info, LevelFilter::Debug];
    let level = LEVELS
        .get(args.verbose as usize)
        .copied()
        .unwrap_or(LevelFilter::Trace);

    let mut logger = pretty_env_logger::formatted_builder();
    for module in ["wwvbrx", "wwvbdec"] {
        logger.filter_module(module, level);
    }
    logger.init();
}

fn open_input(args: &Args) -> Result<Box<dyn Read>> {
    if args.input_is_stdin() {
        if io::stdin().is_terminal() {
            bail!(
                "standard input is a terminal; pipe a demodulated 60 Hz \
                 sample stream in, or try --demo for a synthesized one"
            );
        }
        info!("reading bit stream from standard input");
        Ok(Box::new(io::BufReader::new(io::stdin())))
    } else {
        info!("reading bit stream from \"{}\"", args.file);
        let file = File::open(&args.file)
            .with_context(|| format!("cannot open --file \"{}\"", args.file))?;
        Ok(Box::new(io::BufReader::new(file)))
    }
}
