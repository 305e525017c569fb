//! The system's core empirical claim: sweeping process-error SD from 0.1 to
//! 0.7 on a fixed seed, the state-space model's credible intervals for
//! productivity stay at least as tight as the simple model's in a majority
//! of levels, and only the state-space model recovers a process-error
//! estimate that tracks the truth.

use recruitsim::inference::EngineConfig;
use recruitsim::panel::{run_panel, PanelCell, PanelConfig, PANEL_ERROR_LEVELS, PANEL_SEED};

fn panel_engine() -> EngineConfig {
    EngineConfig {
        chains: 2,
        warmup: 1500,
        iterations: 2500,
        keep_states: false,
    }
}

#[test]
fn state_space_intervals_majority_tighter() {
    let config = PanelConfig {
        seed: PANEL_SEED,
        error_levels: PANEL_ERROR_LEVELS.to_vec(),
        engine: panel_engine(),
    };
    let rows = run_panel(&config).unwrap();
    assert_eq!(rows.len(), 7);

    let mut tighter = 0usize;
    for row in &rows {
        let (Some(simple), Some(state_space)) =
            (row.simple.summary(), row.state_space.summary())
        else {
            panic!(
                "level {} produced a failed cell: {:?} / {:?}",
                row.process_error_sd, row.simple, row.state_space
            );
        };

        let simple_width = simple.productivity.interval_width();
        let ss_width = state_space.productivity.interval_width();
        if ss_width <= simple_width {
            tighter += 1;
        }
    }

    assert!(
        tighter >= 4,
        "state-space interval tighter at only {tighter} of 7 levels"
    );
}

#[test]
fn recovered_process_sd_tracks_truth() {
    let config = PanelConfig {
        seed: PANEL_SEED,
        error_levels: vec![0.1, 0.7],
        engine: panel_engine(),
    };
    let rows = run_panel(&config).unwrap();

    let low = match &rows[0].state_space {
        PanelCell::Fit(summary) => summary.noise_sd.median,
        PanelCell::Failed(reason) => panic!("low level failed: {reason}"),
    };
    let high = match &rows[1].state_space {
        PanelCell::Fit(summary) => summary.noise_sd.median,
        PanelCell::Failed(reason) => panic!("high level failed: {reason}"),
    };

    assert!(
        high > low,
        "recovered process SD must grow with the truth: {low} !< {high}"
    );
    assert!(high > 0.4, "at truth 0.7 the estimate {high} is implausibly low");
}
