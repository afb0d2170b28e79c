use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

/// Upper bound on pairwise repulsion steps for one layout run.
const PAIR_STEP_BUDGET: usize = 40_000_000;
const MIN_ITERATIONS: usize = 12;
const DEFAULT_RADIUS: f32 = 9.0;
const RING_SPACING: f32 = 120.0;
const JITTER: f32 = 60.0;
const GRAVITY: f32 = 0.0012;
const COOLING: f32 = 0.965;

/// Iterations actually run for `node_count` nodes: the request, capped so the
/// quadratic repulsion pass stays within budget on large results.
pub fn iteration_budget(node_count: usize, requested: usize) -> usize {
    let pairs = node_count.saturating_mul(node_count).max(1);
    requested.min((PAIR_STEP_BUDGET / pairs).max(MIN_ITERATIONS))
}

/// Force-directed placement. Output is deterministic for the same ids and edges.
pub fn force_layout(
    node_ids: &[String],
    edges: &[(usize, usize)],
    node_radii: &[f32],
    iterations: usize,
) -> Vec<Vec2> {
    let n = node_ids.len();
    if n == 0 {
        return Vec::new();
    }

    let ring = (n as f32).sqrt() * RING_SPACING;
    let mut positions = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let angle = (index as f32 / n as f32) * TAU;
            let (jx, jy) = stable_pair(id);
            vec2(angle.cos(), angle.sin()) * ring + vec2(jx, jy) * JITTER
        })
        .collect::<Vec<_>>();

    if n == 1 {
        return vec![Vec2::ZERO];
    }

    let radius = |index: usize| node_radii.get(index).copied().unwrap_or(DEFAULT_RADIUS);
    let area = (ring * 2.4).powi(2);
    let k = (area / n as f32).sqrt().max(24.0);
    let mut temperature = (k * 5.5).max(140.0);

    for _ in 0..iteration_budget(n, iterations) {
        let mut disp = vec![Vec2::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length().max(0.5);
                let direction = delta / distance;

                let (ri, rj) = (radius(i), radius(j));
                let min_distance = (ri + rj) * 4.2;

                let mut push = (k * k * (1.0 + (ri + rj) * 0.015)) / distance;
                if distance < min_distance {
                    push += (min_distance - distance) * 2.4;
                }
                disp[i] += direction * push;
                disp[j] -= direction * push;
            }
        }

        for &(from, to) in edges {
            if from >= n || to >= n || from == to {
                continue;
            }

            let delta = positions[from] - positions[to];
            let distance = delta.length().max(0.5);
            let direction = delta / distance;

            let ideal_length = k + (radius(from) + radius(to)) * 3.5;
            let pull = (distance - ideal_length) * 0.18;
            disp[from] -= direction * pull;
            disp[to] += direction * pull;
        }

        for (position, d) in positions.iter_mut().zip(&mut disp) {
            *d -= *position * GRAVITY;
            let length = d.length();
            if length > 0.0 {
                *position += *d / length * length.min(temperature) * 0.92;
            }
        }

        temperature *= COOLING;
        if temperature < 0.55 {
            break;
        }
    }

    positions
}
