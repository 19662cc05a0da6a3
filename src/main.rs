//! Levitas entry point
//!
//! Native builds run a headless batch simulation and print JSON. The browser
//! build is driven through `levitas::web`.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use levitas::sim::{MaglevModel, MaglevParams, Simulation};
    use levitas::trace::run_batch;
    use levitas::{Controls, LevitasError, Result, Revision, SimConfig};

    const USAGE: &str = "\
usage: levitas [--revision basic|gravity|actuated] [--config FILE] [--ticks N]
               [--seed N] [--gain G] [--noise A] [--no-control] [--gravity] [--trace]
       levitas maglev [--ticks N] [--trace]";

    /// Parsed command line
    #[derive(Debug)]
    struct Args {
        maglev: bool,
        revision: Option<Revision>,
        config: Option<String>,
        ticks: u64,
        seed: u64,
        controls: Controls,
        trace: bool,
    }

    impl Default for Args {
        fn default() -> Self {
            Self {
                maglev: false,
                revision: None,
                config: None,
                ticks: 1000,
                seed: 1,
                controls: Controls::default(),
                trace: false,
            }
        }
    }

    fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> std::result::Result<T, String> {
        let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
        value
            .parse()
            .map_err(|_| format!("invalid value for {}: {}", flag, value))
    }

    fn parse_args(args: impl IntoIterator<Item = String>) -> std::result::Result<Args, String> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "maglev" => parsed.maglev = true,
                "--revision" | "-r" => {
                    let name = args.next().ok_or("--revision needs a value")?;
                    parsed.revision = Some(name.parse().map_err(|e: LevitasError| e.to_string())?);
                }
                "--config" | "-c" => {
                    parsed.config = Some(args.next().ok_or("--config needs a value")?);
                }
                "--ticks" | "-n" => parsed.ticks = parse_number(&arg, args.next())?,
                "--seed" => parsed.seed = parse_number(&arg, args.next())?,
                "--gain" => parsed.controls.gain = parse_number(&arg, args.next())?,
                "--noise" => parsed.controls.noise = parse_number(&arg, args.next())?,
                "--no-control" => parsed.controls.control_enabled = false,
                "--gravity" => parsed.controls.gravity_enabled = true,
                "--trace" => parsed.trace = true,
                "--help" | "-h" => return Err(USAGE.to_string()),
                other => return Err(format!("unknown argument: {}\n{}", other, USAGE)),
            }
        }

        Ok(parsed)
    }

    fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    }

    fn run_chamber(args: &Args) -> Result<()> {
        let config = match &args.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::preset(args.revision.unwrap_or_default()),
        };
        // The config file names its own revision
        if let Some(revision) = args.revision.filter(|r| *r != config.revision) {
            log::warn!(
                "Ignoring --revision {}, config file selects {}",
                revision.as_str(),
                config.revision.as_str()
            );
        }

        let mut sim = Simulation::new(config, args.seed);
        let mut trace_error = None;
        let summary = run_batch(&mut sim, &args.controls, args.ticks, |record| {
            if args.trace && trace_error.is_none() {
                trace_error = print_json(record).err();
            }
        });
        if let Some(err) = trace_error {
            return Err(err);
        }

        match summary.failed_at {
            Some(tick) => log::warn!("Object lost at tick {}", tick),
            None => log::info!("Object held for {} ticks", summary.ticks_run),
        }
        print_json(&summary)
    }

    fn run_maglev(args: &Args) -> Result<()> {
        let mut model = MaglevModel::new(MaglevParams::default());
        let mut last = None;
        for _ in 0..args.ticks {
            let sample = model.step();
            if args.trace {
                print_json(&sample)?;
            }
            last = Some(sample);
        }
        log::info!(
            "Vertical model after {} steps: gap {:.5} m, weight {:.4} N",
            args.ticks,
            model.gap,
            model.weight()
        );
        print_json(&last)
    }

    pub fn main() -> std::process::ExitCode {
        env_logger::init();

        let args = match parse_args(std::env::args().skip(1)) {
            Ok(args) => args,
            Err(message) => {
                eprintln!("{}", message);
                return std::process::ExitCode::from(2);
            }
        };
        log::debug!("{:?}", args);

        let result = if args.maglev {
            run_maglev(&args)
        } else {
            run_chamber(&args)
        };

        match result {
            Ok(()) => std::process::ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{}", err);
                eprintln!("error: {}", err);
                std::process::ExitCode::FAILURE
            }
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is levitas::web::start, this is just to satisfy the compiler
}
