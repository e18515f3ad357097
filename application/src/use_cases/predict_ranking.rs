//! Ranking oracle
//!
//! Predicts how one voter would rank a candidate set: a retry driver over
//! the domain ballot-parse cascade, degrading to a uniform random ballot
//! when every attempt fails. The election never aborts on a bad voter —
//! Schulze tolerates arbitrary individual ballots.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use plenum_domain::prompt::ranking_system_prompt;
use plenum_domain::{parse_ballot, DeliberationEvent, Participant, Ranking, RankingRecord};

use super::deliberate::{DeliberationError, SessionCtx};
use super::shared::{acquire_call_permit, check_cancelled, map_gateway_error};
use crate::ports::model_gateway::{ChunkObserver, CompletionRequest};

/// Obtain a valid ballot for one voter over `candidates`.
///
/// Seeded per voter by the coordinator so fallback ballots are reproducible
/// under a fixed session seed.
pub(crate) async fn predict_voter_ranking(
    ctx: &Arc<SessionCtx>,
    events: &UnboundedSender<DeliberationEvent>,
    level: usize,
    group: usize,
    voter: &Participant,
    candidates: &Arc<Vec<String>>,
    seed: u64,
) -> Result<RankingRecord, DeliberationError> {
    let voter_position = voter.position();
    let num_candidates = candidates.len();
    let _ = events.send(DeliberationEvent::OracleStart {
        level,
        group,
        voter: voter_position,
    });

    // A one-candidate ballot is forced; skip the model round-trip
    if num_candidates == 1 {
        let _ = events.send(DeliberationEvent::OracleDone {
            level,
            group,
            voter: voter_position,
            fallback: false,
        });
        return Ok(RankingRecord {
            voter_position,
            ranking: Ranking::new(vec![0], 1).expect("single-candidate ballot is trivially valid"),
            fallback: false,
            attempts: vec!["single candidate, trivial ballot".to_string()],
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let system = ranking_system_prompt(num_candidates, &mut rng);
    let prompt = ctx.config.templates.ranking_prompt(
        &ctx.question,
        voter_position + 1,
        voter.opinion(),
        candidates,
    );
    let max_retries = ctx.config.ranking.max_retries.max(1);
    let mut attempts: Vec<String> = Vec::new();

    for attempt in 1..=max_retries {
        check_cancelled(&ctx.cancel)?;

        let observer: ChunkObserver = Arc::new(|_chunk: &str| {});
        let request = CompletionRequest {
            model: ctx.config.ranking.model.clone(),
            prompt: prompt.clone(),
            system: Some(system.clone()),
            sampling: ctx.config.ranking.sampling(),
        };

        let permit = acquire_call_permit(&ctx.permits, &ctx.cancel).await?;
        let raw = ctx
            .ranking
            .complete(request, observer, &ctx.cancel)
            .await
            .map_err(map_gateway_error)?;
        drop(permit);

        let cleaned = ctx.normalizer.apply(&raw);
        match parse_ballot(&cleaned, num_candidates) {
            Ok(parsed) => {
                if parsed.zero_based {
                    warn!(
                        voter = voter_position,
                        "model returned a zero-based ballot, accepted as-is"
                    );
                    attempts.push(format!(
                        "attempt {attempt}/{max_retries}: accepted zero-based ballot"
                    ));
                } else {
                    attempts.push(format!("attempt {attempt}/{max_retries}: valid ballot"));
                }
                let _ = events.send(DeliberationEvent::OracleDone {
                    level,
                    group,
                    voter: voter_position,
                    fallback: false,
                });
                return Ok(RankingRecord {
                    voter_position,
                    ranking: parsed.ranking,
                    fallback: false,
                    attempts,
                });
            }
            Err(error) => {
                debug!(voter = voter_position, attempt, %error, "ballot parse failed");
                attempts.push(format!("attempt {attempt}/{max_retries}: {error}"));
                let _ = events.send(DeliberationEvent::OracleAttempt {
                    level,
                    group,
                    voter: voter_position,
                    attempt,
                    error: error.to_string(),
                });
            }
        }
    }

    warn!(
        voter = voter_position,
        "all ranking attempts failed, substituting a random ballot"
    );
    attempts.push("all attempts failed, substituting random ballot".to_string());
    let ranking = Ranking::random(num_candidates, &mut rng);
    let _ = events.send(DeliberationEvent::OracleFallback {
        level,
        group,
        voter: voter_position,
    });
    let _ = events.send(DeliberationEvent::OracleDone {
        level,
        group,
        voter: voter_position,
        fallback: true,
    });
    Ok(RankingRecord {
        voter_position,
        ranking,
        fallback: true,
        attempts,
    })
}
