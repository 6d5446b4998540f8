//! `reconfigure` support: coercion of the incoming [`PlannerConfig`] into a
//! form the rest of the crate can assume (sample counts ≥ 1, weights already
//! in meter units if requested) and the `extra_y_vels` string parser.

use crate::limits::PlannerConfig;

/// Apply `reconfigure`'s field-level side effects (§4.6): coerce `nx`/`ny`/
/// `ntheta` to at least 1, and if `meter_scoring` is set, scale the
/// map-derived weights by `resolution` so their units become meters.
pub fn normalize(mut cfg: PlannerConfig, resolution: f64) -> PlannerConfig {
    cfg.sampling = cfg.sampling.coerced();
    if cfg.flags.meter_scoring {
        cfg.weights = cfg.weights.scaled_by_resolution(resolution);
    }
    cfg
}

/// Parse a whitespace/comma separated list of extra lateral velocities, per
/// §4.6's `reconfigure`. Unparseable tokens are skipped rather than
/// rejected, matching `reconfigure`'s never-fails contract.
pub fn parse_extra_y_vels(s: &str) -> Vec<f64> {
    s.split([',', ' ', '\t'])
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| tok.parse::<f64>().ok())
        .collect()
}
