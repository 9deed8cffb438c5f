use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use engine::{Chess, FenParts, Position, Role};
use futures::future::{self, BoxFuture, FutureExt, Ready};
use serde::{Deserialize, Serialize};

/// Scores a batch of child positions. One score per child, in the order given.
///
/// The count contract is checked by the caller. An evaluator that returns the wrong number of scores
/// fails the run.
pub trait ChildEvaluator: Send + Sync + 'static {
    type Future: Future<Output = Result<Vec<f32>>> + Send + 'static;

    fn score(&self, children: Vec<Chess>) -> Self::Future;
}

/// Material balance in pawns from the point of view of the side that made the last move.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialEvaluator;

impl MaterialEvaluator {
    fn piece_value(role: Role) -> f32 {
        match role {
            Role::Pawn => 1.0,
            Role::Knight | Role::Bishop => 3.0,
            Role::Rook => 5.0,
            Role::Queen => 9.0,
            Role::King => 0.0,
        }
    }

    pub fn balance(position: &Chess) -> f32 {
        let mover = !position.turn();
        let board = position.board();

        board
            .occupied()
            .into_iter()
            .filter_map(|square| board.piece_at(square))
            .map(|piece| {
                let value = Self::piece_value(piece.role);
                if piece.color == mover {
                    value
                } else {
                    -value
                }
            })
            .sum()
    }
}

impl ChildEvaluator for MaterialEvaluator {
    type Future = Ready<Result<Vec<f32>>>;

    fn score(&self, children: Vec<Chess>) -> Self::Future {
        future::ready(Ok(children.iter().map(Self::balance).collect()))
    }
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<String>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<f32>,
}

/// Posts `{"instances": [fen, ...]}` to a prediction endpoint and reads `{"predictions": [score, ...]}`.
pub struct HttpEvaluator {
    client: reqwest::Client,
    url: String,
}

impl HttpEvaluator {
    pub fn new(url: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| anyhow!("Failed to build the evaluator http client: {}", e))?;

        Ok(Self { client, url })
    }
}

impl ChildEvaluator for HttpEvaluator {
    type Future = BoxFuture<'static, Result<Vec<f32>>>;

    fn score(&self, children: Vec<Chess>) -> Self::Future {
        let request = PredictRequest {
            instances: children
                .iter()
                .map(|child| FenParts::from_position(child).to_string())
                .collect(),
        };
        let client = self.client.clone();
        let url = self.url.clone();

        async move {
            let response = client
                .post(&url)
                .json(&request)
                .send()
                .await
                .with_context(|| format!("Failed to reach the evaluator at {}", url))?
                .error_for_status()
                .with_context(|| format!("The evaluator at {} rejected the request", url))?;

            let predictions: PredictResponse = response
                .json()
                .await
                .with_context(|| format!("Failed to read predictions from {}", url))?;

            Ok(predictions.predictions)
        }
        .boxed()
    }
}
