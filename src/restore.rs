use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    spot::{ImageHandle, ImageSource, SavedSpotSnapshot, Spot, SpotContent, WaitingQueue},
};

/// Snapshots further than this from a spot's center are not considered close.
pub const DEFAULT_PROXIMITY_THRESHOLD: f32 = 150.0;

/// Turns a stored image reference back into a decoded image.
pub trait ImageResolver {
    fn resolve(&self, source: &ImageSource) -> Result<ImageHandle, ResolveError>;
}

impl<F> ImageResolver for F
where
    F: Fn(&ImageSource) -> Result<ImageHandle, ResolveError>,
{
    fn resolve(&self, source: &ImageSource) -> Result<ImageHandle, ResolveError> {
        self(source)
    }
}

/// A resolver for callers that keep no decoded images. Every image comes back
/// without a handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl ImageResolver for NoImages {
    fn resolve(&self, source: &ImageSource) -> Result<ImageHandle, ResolveError> {
        Err(ResolveError::new(source, "no image resolver configured"))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to resolve image {reference:?}: {reason}")]
pub struct ResolveError {
    pub reference: String,
    pub reason: String,
}

impl ResolveError {
    pub fn new(source: &ImageSource, reason: impl Into<String>) -> Self {
        Self {
            reference: source.0.clone(),
            reason: reason.into(),
        }
    }
}

/// How the proximity pass pairs spots with snapshots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Each spot, in detection order, takes the nearest remaining snapshot.
    #[default]
    Greedy,
    /// Pairs are chosen to place as many snapshots as possible within the
    /// threshold, then to minimise the total distance.
    Optimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoreOptions {
    pub threshold: f32,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    Proximity,
    Fill,
}

/// Records that the snapshot of `original_id` now lives in `spot_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub spot_id: u32,
    pub original_id: u32,
    pub pass: MatchPass,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub placements: Vec<Placement>,
    pub waiting: WaitingQueue,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PROXIMITY_THRESHOLD,
            strategy: MatchStrategy::Greedy,
        }
    }
}

/// Copies every non-empty spot so it can survive the next detection pass.
pub fn snapshot(spots: &[Spot]) -> Vec<SavedSpotSnapshot> {
    spots.iter().filter_map(SavedSpotSnapshot::capture).collect()
}

/// Moves saved content onto freshly detected spots.
///
/// Only empty spots receive content and no rect is ever changed. First each
/// spot claims the closest snapshot whose center is within the threshold of
/// its own; then the remaining empty spots take the remaining snapshots in
/// order; whatever is still unclaimed is returned as the waiting queue.
pub fn restore(
    spots: &mut [Spot],
    saved: Vec<SavedSpotSnapshot>,
    resolver: &impl ImageResolver,
    options: &RestoreOptions,
) -> Result<RestoreOutcome> {
    if !(options.threshold >= 0.0 && options.threshold.is_finite()) {
        return Err(Error::InvalidThreshold(options.threshold));
    }

    let open = spots
        .iter()
        .enumerate()
        .filter(|(_, spot)| spot.is_empty())
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    let pairs = match options.strategy {
        MatchStrategy::Greedy => match_greedy(spots, &open, &saved, options.threshold),
        MatchStrategy::Optimal => match_optimal(spots, &open, &saved, options.threshold),
    };

    let mut pool = saved.into_iter().map(Some).collect::<Vec<_>>();
    let mut placements = Vec::new();

    for (spot_index, snapshot_index) in pairs {
        if let Some(snapshot) = pool[snapshot_index].take() {
            placements.push(apply(
                &mut spots[spot_index],
                snapshot,
                resolver,
                MatchPass::Proximity,
            ));
        }
    }

    let mut remaining = pool.into_iter().flatten();
    for &spot_index in &open {
        if !spots[spot_index].is_empty() {
            continue;
        }
        let Some(snapshot) = remaining.next() else {
            break;
        };
        placements.push(apply(&mut spots[spot_index], snapshot, resolver, MatchPass::Fill));
    }

    let waiting = remaining.collect::<WaitingQueue>();
    log::debug!(
        "restored {} snapshots onto {} spots, {} waiting",
        placements.len(),
        spots.len(),
        waiting.len()
    );

    Ok(RestoreOutcome {
        placements,
        waiting,
    })
}

fn apply(
    spot: &mut Spot,
    snapshot: SavedSpotSnapshot,
    resolver: &impl ImageResolver,
    pass: MatchPass,
) -> Placement {
    let mut content = snapshot.content;
    if let SpotContent::Image(image) = &mut content {
        match resolver.resolve(&image.source) {
            Ok(handle) => image.handle = Some(handle),
            Err(err) => {
                log::warn!(
                    "restoring spot {} without its image: {err}",
                    spot.id
                );
                image.handle = None;
            }
        }
    }
    spot.content = content;

    Placement {
        spot_id: spot.id,
        original_id: snapshot.original_id,
        pass,
    }
}

fn distance(spot: &Spot, snapshot: &SavedSpotSnapshot) -> f32 {
    spot.rect.center().distance(snapshot.center())
}

/// Returns `(spot index, snapshot index)` pairs in spot order.
fn match_greedy(
    spots: &[Spot],
    open: &[usize],
    saved: &[SavedSpotSnapshot],
    threshold: f32,
) -> Vec<(usize, usize)> {
    let mut claimed = vec![false; saved.len()];
    let mut pairs = Vec::new();

    for &spot_index in open {
        let mut nearest: Option<(usize, f32)> = None;
        for (snapshot_index, snapshot) in saved.iter().enumerate() {
            if claimed[snapshot_index] {
                continue;
            }
            let d = distance(&spots[spot_index], snapshot);
            // Strict comparison keeps the earliest snapshot on ties.
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((snapshot_index, d));
            }
        }

        if let Some((snapshot_index, d)) = nearest {
            if d < threshold {
                claimed[snapshot_index] = true;
                pairs.push((spot_index, snapshot_index));
            }
        }
    }

    pairs
}

fn match_optimal(
    spots: &[Spot],
    open: &[usize],
    saved: &[SavedSpotSnapshot],
    threshold: f32,
) -> Vec<(usize, usize)> {
    let n = open.len().max(saved.len());
    if n == 0 {
        return Vec::new();
    }

    // Any pair outside the threshold (and any padding cell) costs more than
    // every valid pair combined, so the solver first maximises valid pairs.
    let forbidden = f64::from(threshold) * (n as f64 + 1.0) + 1.0;
    let cost = (0..n)
        .map(|row| {
            (0..n)
                .map(|col| match (open.get(row), saved.get(col)) {
                    (Some(&spot_index), Some(snapshot)) => {
                        let d = distance(&spots[spot_index], snapshot);
                        if d < threshold {
                            f64::from(d)
                        } else {
                            forbidden
                        }
                    }
                    _ => forbidden,
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    hungarian(&cost)
        .into_iter()
        .enumerate()
        .filter(|&(row, col)| row < open.len() && col < saved.len() && cost[row][col] < forbidden)
        .map(|(row, col)| (open[row], col))
        .collect()
}

/// Minimum cost perfect matching on a square matrix. Returns the column
/// assigned to each row.
fn hungarian(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    // Potentials and matches are 1-based; index 0 is a sentinel.
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut row_of = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        row_of[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[col0] = true;
            let row0 = row_of[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0;

            for col in 1..=n {
                if used[col] {
                    continue;
                }
                let slack = cost[row0 - 1][col - 1] - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=n {
                if used[col] {
                    u[row_of[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if row_of[col0] == 0 {
                break;
            }
        }

        loop {
            let col1 = way[col0];
            row_of[col0] = row_of[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for col in 1..=n {
        if row_of[col] != 0 {
            assignment[row_of[col] - 1] = col - 1;
        }
    }
    assignment
}
