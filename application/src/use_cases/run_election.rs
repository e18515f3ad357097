//! One group election
//!
//! A self-contained concurrent unit: generate candidates, resolve the
//! voter population for the session's strategy, predict every voter's
//! ranking, tabulate with Schulze, and finalize the group's node. Sibling
//! groups of a level run concurrently; all their tasks share the session's
//! admission semaphore and cancel signal.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{info, warn};

use plenum_domain::{
    schulze, DeliberationEvent, GroupNode, LevelItem, Participant, Ranking, RankingRecord,
    VotingStrategy,
};

use super::deliberate::{DeliberationError, SessionCtx};
use super::generate_candidates::generate_group_candidates;
use super::predict_ranking::predict_voter_ranking;
use super::shared::check_cancelled;

/// Run one group's election to completion and return its finished node.
pub(crate) async fn run_group_election(
    ctx: Arc<SessionCtx>,
    events: UnboundedSender<DeliberationEvent>,
    level: usize,
    group_index: usize,
    items: Vec<LevelItem>,
    seed: u64,
) -> Result<GroupNode, DeliberationError> {
    check_cancelled(&ctx.cancel)?;

    let member_positions: BTreeSet<usize> = items
        .iter()
        .flat_map(|item| item.origins.iter().copied())
        .collect();
    let voters = resolve_voters(&ctx, &member_positions);
    let _ = events.send(DeliberationEvent::GroupStart {
        level,
        group: group_index,
        members: items.len(),
        voters: voters.len(),
    });

    let statements: Vec<String> = items.iter().map(|item| item.statement.clone()).collect();
    let num_candidates = ctx.config.candidates_for(items.len());
    let mut rng = StdRng::seed_from_u64(seed);

    let candidates = generate_group_candidates(
        &ctx,
        &events,
        level,
        group_index,
        &statements,
        num_candidates,
        &mut rng,
    )
    .await?;
    info!(
        level,
        group = group_index,
        candidates = candidates.len(),
        voters = voters.len(),
        "candidates ready, predicting rankings"
    );

    check_cancelled(&ctx.cancel)?;
    let records = predict_all_rankings(&ctx, &events, level, group_index, &voters, candidates.clone(), &mut rng)
        .await?;

    let ballots: Vec<Ranking> = records.iter().map(|r| r.ranking.clone()).collect();
    let tabulation = schulze(&ballots, candidates.len());
    let _ = events.send(DeliberationEvent::ElectionDone {
        level,
        group: group_index,
        winner: tabulation.winner,
        pairwise: tabulation.pairwise.clone(),
        strongest: tabulation.strongest.clone(),
    });

    let children: Vec<GroupNode> = items.into_iter().filter_map(|item| item.source).collect();
    Ok(GroupNode {
        level,
        group_index,
        member_positions,
        statements,
        candidates,
        rankings: records,
        winner: Some(tabulation.winner),
        pairwise: tabulation.pairwise,
        strongest: tabulation.strongest,
        children,
    })
}

/// Resolve who votes in this group's election.
///
/// `OwnGroupOnly` takes the original participants whose opinions
/// transitively feed the group's items; at a root fed by every leaf this
/// is the same set `AllParticipants` always uses.
fn resolve_voters(ctx: &SessionCtx, member_positions: &BTreeSet<usize>) -> Vec<Participant> {
    match ctx.config.voting_strategy {
        VotingStrategy::OwnGroupOnly => ctx
            .participants
            .iter()
            .filter(|p| member_positions.contains(&p.position()))
            .cloned()
            .collect(),
        VotingStrategy::AllParticipants => ctx.participants.clone(),
    }
}

async fn predict_all_rankings(
    ctx: &Arc<SessionCtx>,
    events: &UnboundedSender<DeliberationEvent>,
    level: usize,
    group_index: usize,
    voters: &[Participant],
    candidates: Vec<String>,
    rng: &mut StdRng,
) -> Result<Vec<RankingRecord>, DeliberationError> {
    let candidates = Arc::new(candidates);
    let mut join_set = JoinSet::new();
    for (slot, voter) in voters.iter().enumerate() {
        let seed = rng.gen::<u64>();
        let ctx = Arc::clone(ctx);
        let events = events.clone();
        let voter = voter.clone();
        let candidates = Arc::clone(&candidates);
        join_set.spawn(async move {
            let result = predict_voter_ranking(
                &ctx,
                &events,
                level,
                group_index,
                &voter,
                &candidates,
                seed,
            )
            .await;
            (slot, result)
        });
    }

    let mut slots: Vec<Option<RankingRecord>> = (0..voters.len()).map(|_| None).collect();
    let mut first_error: Option<DeliberationError> = None;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((slot, Ok(record))) => slots[slot] = Some(record),
            Ok((_, Err(error))) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            Err(join_error) => {
                warn!(level, group = group_index, "oracle task join error: {join_error}");
            }
        }
    }
    if let Some(error) = first_error {
        return Err(error);
    }

    let mut records = Vec::with_capacity(voters.len());
    for (slot, record) in slots.into_iter().enumerate() {
        match record {
            Some(record) => records.push(record),
            None => {
                return Err(DeliberationError::Internal(format!(
                    "ranking task for voter slot {slot} did not complete"
                )));
            }
        }
    }
    Ok(records)
}
