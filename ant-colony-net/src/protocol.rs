//! Text wire codec
//!
//! All payloads are UTF-8 text without a length prefix, using `;` between
//! fields, `,` between list entries and spaces inside item sets:
//!
//! - problem message (coordinator → worker, once):
//!   `w1,..,wN;v1,..,vN;capacity;alpha;beta;antsForThisWorker`
//! - pheromone broadcast (coordinator → worker, per round): `p1,..,pN`,
//!   replaced by the literal `end` to terminate the session
//! - round result (worker → coordinator, per round):
//!   `bestValue;bestItems;allAntValues;allAntItemSets` where item sets are
//!   a `,`-separated list of space-separated index lists
//! - handshake literal `READY`

use std::fmt::Write as _;

use ant_colony_core::outcome::RoundResult;
use ant_colony_core::problem::ItemCatalogue;

/// Worker handshake literal, sent before and after problem receipt.
pub const READY: &str = "READY";

/// Termination sentinel replacing a pheromone broadcast.
pub const END: &str = "end";

/// Malformed payload text
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Wrong number of `;`-separated fields
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    /// A token that should have been an integer
    #[error("invalid integer token {token:?}")]
    InvalidInt { token: String },
    /// A token that should have been a float
    #[error("invalid float token {token:?}")]
    InvalidFloat { token: String },
    /// A decoded list does not match the catalogue it is applied to
    #[error("expected a {expected}-entry list, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Problem parameters pushed to one worker at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemMessage {
    /// The shared item catalogue
    pub catalogue: ItemCatalogue,
    /// Pheromone influence exponent
    pub alpha: f64,
    /// Heuristic influence exponent
    pub beta: f64,
    /// This worker's share of the per-round ant batch
    pub ants_for_worker: usize,
}

/// A per-round message from the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    /// The current pheromone vector
    Pheromone(Vec<f64>),
    /// Termination sentinel
    End,
}

fn parse_u32(token: &str) -> Result<u32, WireError> {
    token.parse().map_err(|_| WireError::InvalidInt {
        token: token.to_owned(),
    })
}

fn parse_usize(token: &str) -> Result<usize, WireError> {
    token.parse().map_err(|_| WireError::InvalidInt {
        token: token.to_owned(),
    })
}

fn parse_f64(token: &str) -> Result<f64, WireError> {
    token.parse().map_err(|_| WireError::InvalidFloat {
        token: token.to_owned(),
    })
}

fn join<T: std::fmt::Display>(items: &[T], separator: char) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        let _ = write!(out, "{item}");
    }
    out
}

fn split_fields(message: &str, expected: usize) -> Result<Vec<&str>, WireError> {
    let fields: Vec<&str> = message.split(';').collect();
    if fields.len() != expected {
        return Err(WireError::FieldCount {
            expected,
            got: fields.len(),
        });
    }
    Ok(fields)
}

/// Encode the problem message for one worker.
pub fn encode_problem(message: &ProblemMessage) -> String {
    format!(
        "{};{};{};{};{};{}",
        join(&message.catalogue.weights, ','),
        join(&message.catalogue.values, ','),
        message.catalogue.capacity,
        message.alpha,
        message.beta,
        message.ants_for_worker,
    )
}

/// Decode a problem message.
pub fn decode_problem(text: &str) -> Result<ProblemMessage, WireError> {
    let fields = split_fields(text, 6)?;
    let weights = fields[0].split(',').map(parse_u32).collect::<Result<_, _>>()?;
    let values = fields[1].split(',').map(parse_u32).collect::<Result<_, _>>()?;
    Ok(ProblemMessage {
        catalogue: ItemCatalogue {
            values,
            weights,
            capacity: parse_u32(fields[2])?,
        },
        alpha: parse_f64(fields[3])?,
        beta: parse_f64(fields[4])?,
        ants_for_worker: parse_usize(fields[5])?,
    })
}

/// Encode the pheromone vector for broadcast.
pub fn encode_pheromone(pheromone: &[f64]) -> String {
    join(pheromone, ',')
}

/// Decode a per-round coordinator message, honoring the `end` sentinel.
pub fn decode_broadcast(text: &str) -> Result<Broadcast, WireError> {
    if text == END {
        return Ok(Broadcast::End);
    }
    let pheromone = text.split(',').map(parse_f64).collect::<Result<_, _>>()?;
    Ok(Broadcast::Pheromone(pheromone))
}

/// Encode one worker's round result.
pub fn encode_round_result(result: &RoundResult) -> String {
    let sets = result
        .all_item_sets
        .iter()
        .map(|set| join(set, ' '))
        .collect::<Vec<_>>();
    format!(
        "{};{};{};{}",
        result.best_value,
        join(&result.best_items, ' '),
        join(&result.all_values, ' '),
        sets.join(","),
    )
}

/// Decode one worker's round result.
///
/// Empty sub-lists are legal: an ant that chose nothing encodes as an empty
/// token between commas. A fully empty item-set field decodes as no sets.
pub fn decode_round_result(text: &str) -> Result<RoundResult, WireError> {
    let fields = split_fields(text, 4)?;
    let best_value = parse_u32(fields[0])?;
    let best_items = fields[1]
        .split_whitespace()
        .map(parse_usize)
        .collect::<Result<_, _>>()?;
    let all_values = fields[2]
        .split_whitespace()
        .map(parse_u32)
        .collect::<Result<_, _>>()?;
    let all_item_sets = if fields[3].is_empty() {
        Vec::new()
    } else {
        fields[3]
            .split(',')
            .map(|set| set.split_whitespace().map(parse_usize).collect())
            .collect::<Result<_, _>>()?
    };
    Ok(RoundResult {
        best_value,
        best_items,
        all_values,
        all_item_sets,
    })
}
