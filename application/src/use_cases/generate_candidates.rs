//! Candidate generation for one group
//!
//! Issues K generation calls, each over an independently shuffled ordering
//! of the group's statements so no opinion benefits from its position in
//! the prompt. Calls run concurrently under the session's admission
//! ceiling and share its cancel signal.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use plenum_domain::session::normalize::extract_statement;
use plenum_domain::DeliberationEvent;

use super::deliberate::{DeliberationError, SessionCtx};
use super::shared::{acquire_call_permit, check_cancelled, map_gateway_error};
use crate::ports::model_gateway::{ChunkObserver, CompletionRequest};

/// Empty responses are re-issued this many times before the group aborts
const MAX_ATTEMPTS_PER_CANDIDATE: u32 = 3;

/// Generate `num_candidates` statements for one group, in candidate order.
pub(crate) async fn generate_group_candidates(
    ctx: &Arc<SessionCtx>,
    events: &UnboundedSender<DeliberationEvent>,
    level: usize,
    group: usize,
    statements: &[String],
    num_candidates: usize,
    rng: &mut StdRng,
) -> Result<Vec<String>, DeliberationError> {
    let mut join_set = JoinSet::new();
    for candidate in 0..num_candidates {
        let seed = rng.gen::<u64>();
        let ctx = Arc::clone(ctx);
        let events = events.clone();
        let statements = statements.to_vec();
        join_set.spawn(async move {
            let result =
                generate_single_candidate(&ctx, &events, level, group, candidate, statements, seed)
                    .await;
            (candidate, result)
        });
    }

    let mut slots: Vec<Option<String>> = vec![None; num_candidates];
    let mut first_error: Option<DeliberationError> = None;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((candidate, Ok(statement))) => slots[candidate] = Some(statement),
            Ok((candidate, Err(error))) => {
                debug!(level, group, candidate, %error, "candidate generation failed");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            Err(join_error) => {
                warn!(level, group, "candidate task join error: {join_error}");
            }
        }
    }
    if let Some(error) = first_error {
        return Err(error);
    }

    let mut candidates = Vec::with_capacity(num_candidates);
    for (candidate, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(statement) => candidates.push(statement),
            None => {
                return Err(DeliberationError::GenerationFailed {
                    level,
                    group,
                    reason: format!("candidate {candidate} task did not complete"),
                });
            }
        }
    }
    Ok(candidates)
}

async fn generate_single_candidate(
    ctx: &Arc<SessionCtx>,
    events: &UnboundedSender<DeliberationEvent>,
    level: usize,
    group: usize,
    candidate: usize,
    statements: Vec<String>,
    seed: u64,
) -> Result<String, DeliberationError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let _ = events.send(DeliberationEvent::CandidateStart {
        level,
        group,
        candidate,
    });

    for attempt in 1..=MAX_ATTEMPTS_PER_CANDIDATE {
        check_cancelled(&ctx.cancel)?;

        let mut shuffled = statements.clone();
        shuffled.shuffle(&mut rng);
        let prompt = ctx
            .config
            .templates
            .candidate_prompt(&ctx.question, &shuffled);

        let observer: ChunkObserver = {
            let events = events.clone();
            Arc::new(move |chunk: &str| {
                let _ = events.send(DeliberationEvent::CandidateChunk {
                    level,
                    group,
                    candidate,
                    chunk: chunk.to_string(),
                });
            })
        };
        let request = CompletionRequest {
            model: ctx.config.generation.model.clone(),
            prompt,
            system: None,
            sampling: ctx.config.generation.sampling,
        };

        let permit = acquire_call_permit(&ctx.permits, &ctx.cancel).await?;
        let raw = ctx
            .generation
            .complete(request, observer, &ctx.cancel)
            .await
            .map_err(map_gateway_error)?;
        drop(permit);

        let cleaned = ctx.normalizer.apply(&raw);
        let statement = extract_statement(&cleaned, ctx.config.statement_marker.as_deref());
        if !statement.is_empty() {
            let _ = events.send(DeliberationEvent::CandidateDone {
                level,
                group,
                candidate,
                statement: statement.clone(),
            });
            return Ok(statement);
        }
        warn!(
            level,
            group, candidate, attempt, "empty candidate statement, re-issuing request"
        );
    }

    Err(DeliberationError::GenerationFailed {
        level,
        group,
        reason: format!("candidate {candidate} empty after {MAX_ATTEMPTS_PER_CANDIDATE} attempts"),
    })
}
