//! recruitsim CLI - stock-recruitment simulation and Bayesian estimation
//!
//! Runs either a single scenario fit or the comparative-analysis panel.

use std::process::ExitCode;

use recruitsim::panel::{render_table, run_panel, PanelConfig};
use recruitsim::prelude::*;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = match args.first().map(String::as_str) {
        Some("--panel") => panel_mode(),
        Some("--help" | "-h") | None => {
            usage();
            Ok(())
        }
        Some(path) => scenario_mode(path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn usage() {
    println!("recruitsim v{}", env!("CARGO_PKG_VERSION"));
    println!("Stock-recruitment simulation and Bayesian estimation");
    println!();
    println!("Usage:");
    println!("  recruitsim <scenario.yaml>   simulate and fit both models");
    println!("  recruitsim --panel           run the comparative error-level panel");
}

fn scenario_mode(path: &str) -> RecruitResult<()> {
    let config = ScenarioConfig::load(path)?;
    let mut rng = StockRng::new(123);
    let sim = simulate_config(&config, &mut rng)?;

    let sampler = GibbsSampler::new(EngineConfig::default());
    let mut fit_rngs = rng.partition(2);

    for spec in [
        ModelSpec::Simple(SimpleModel::prepare(&sim)?),
        ModelSpec::StateSpace(StateSpaceModel::prepare(&sim)?),
    ] {
        let rng = &mut fit_rngs[usize::from(spec.has_latent_states())];
        let sample = sampler.fit(&spec, rng)?;
        let summary = summarize(&sample)?;
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &PosteriorSummary) {
    println!("model: {}", summary.model);
    for (name, param) in [
        ("productivity", &summary.productivity),
        ("capacity", &summary.capacity),
        ("noise_sd", &summary.noise_sd),
        ("U_msy", &summary.umsy),
    ] {
        println!(
            "  {name:>13}: median {:>10.4}  sd {:>10.4}  95% CI [{:.4}, {:.4}]",
            param.median, param.sd, param.q025, param.q975
        );
    }
}

fn panel_mode() -> RecruitResult<()> {
    let rows = run_panel(&PanelConfig::default())?;
    print!("{}", render_table(&rows));
    Ok(())
}
