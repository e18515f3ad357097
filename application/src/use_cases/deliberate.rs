//! Deliberation coordinator
//!
//! Entry points for the engine: [`DeliberateUseCase::single_run`] runs one
//! election over all opinions, [`DeliberateUseCase::recursive`] partitions
//! large populations into groups, elects a winner per group, promotes the
//! winners as synthetic participants of the next level, and repeats until
//! one statement remains.
//!
//! The coordinator owns everything session-scoped: the id, the master RNG,
//! the admission semaphore, the cancel signal, and the event transcript.
//! Group elections at one level run concurrently; levels run in sequence,
//! and a parent level never starts before every child election has
//! finished and flushed its events.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use plenum_domain::{
    partition, DeliberationEvent, GroupNode, LevelItem, Normalizer, Participant, Question,
    SessionId,
};

use super::run_election::run_group_election;
use crate::config::EngineConfig;
use crate::ports::event_sink::EventSink;
use crate::ports::model_gateway::{GatewayError, ModelGateway};

/// Errors that abort a deliberation session
#[derive(Error, Debug)]
pub enum DeliberationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Template(#[from] plenum_domain::TemplateError),

    #[error(transparent)]
    Normalize(#[from] plenum_domain::NormalizeError),

    #[error("candidate generation failed (level {level}, group {group}): {reason}")]
    GenerationFailed {
        level: usize,
        group: usize,
        reason: String,
    },

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DeliberationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeliberationError::Cancelled)
    }
}

/// Input for both entry points
#[derive(Debug, Clone)]
pub struct DeliberateInput {
    pub question: String,
    pub opinions: Vec<String>,
}

impl DeliberateInput {
    pub fn new(question: impl Into<String>, opinions: Vec<String>) -> Self {
        Self {
            question: question.into(),
            opinions,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Completed,
    Cancelled,
}

/// Outcome of a deliberation session
#[derive(Debug)]
pub struct DeliberationResult {
    pub session_id: SessionId,
    pub kind: ResultKind,
    /// The consensus statement; `None` when cancelled
    pub winner: Option<String>,
    /// Finished election trees. One root node on completion; on
    /// cancellation, whatever subtrees completed before the signal.
    pub tree: Vec<GroupNode>,
    /// True when any voter's ballot fell back to a random permutation
    pub degraded: bool,
    /// Every event of the session, in emission order
    pub events: Vec<DeliberationEvent>,
}

/// Session-scoped state shared by every task of one deliberation
pub(crate) struct SessionCtx {
    pub generation: Arc<dyn ModelGateway>,
    pub ranking: Arc<dyn ModelGateway>,
    pub config: EngineConfig,
    pub question: String,
    /// All original participants, indexed by position
    pub participants: Vec<Participant>,
    /// Admission ceiling for concurrent model calls
    pub permits: Arc<Semaphore>,
    pub cancel: CancellationToken,
    pub normalizer: Normalizer,
}

/// Transcript writer: every event is recorded for the result and forwarded
/// to the caller's sink, in one atomic append order.
struct Recorder<'a> {
    transcript: Vec<DeliberationEvent>,
    sink: &'a dyn EventSink,
}

impl<'a> Recorder<'a> {
    fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            transcript: Vec::new(),
            sink,
        }
    }

    fn emit(&mut self, event: DeliberationEvent) {
        self.sink.emit(&event);
        self.transcript.push(event);
    }
}

enum LevelOutcome {
    Finished(Vec<GroupNode>),
    Cancelled(Vec<GroupNode>),
}

/// Use case for running a deliberation session
pub struct DeliberateUseCase {
    generation: Arc<dyn ModelGateway>,
    ranking: Arc<dyn ModelGateway>,
    config: EngineConfig,
}

impl DeliberateUseCase {
    /// One gateway serving both generation and ranking calls
    pub fn new(gateway: Arc<dyn ModelGateway>, config: EngineConfig) -> Self {
        Self {
            generation: Arc::clone(&gateway),
            ranking: gateway,
            config,
        }
    }

    /// Distinct gateways, e.g. a statement model and a reward model on
    /// different endpoints
    pub fn with_gateways(
        generation: Arc<dyn ModelGateway>,
        ranking: Arc<dyn ModelGateway>,
        config: EngineConfig,
    ) -> Self {
        Self {
            generation,
            ranking,
            config,
        }
    }

    /// Run a single election over all opinions.
    ///
    /// Requires `2 <= opinions <= max_group_size`.
    pub async fn single_run(
        &self,
        input: DeliberateInput,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<DeliberationResult, DeliberationError> {
        let participants = self.preflight(&input)?;
        if participants.len() > self.config.max_group_size {
            return Err(DeliberationError::InvalidInput(format!(
                "single run takes at most {} opinions, got {}; use the recursive entry point",
                self.config.max_group_size,
                participants.len()
            )));
        }
        self.run(input.question, participants, sink, cancel).await
    }

    /// Run the hierarchical procedure for populations of any size.
    pub async fn recursive(
        &self,
        input: DeliberateInput,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<DeliberationResult, DeliberationError> {
        let participants = self.preflight(&input)?;
        self.run(input.question, participants, sink, cancel).await
    }

    /// Validate input and configuration before any model call.
    fn preflight(&self, input: &DeliberateInput) -> Result<Vec<Participant>, DeliberationError> {
        if Question::try_new(&input.question).is_none() {
            return Err(DeliberationError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }
        if input.opinions.len() < 2 {
            return Err(DeliberationError::InvalidInput(format!(
                "at least 2 opinions required, got {}",
                input.opinions.len()
            )));
        }
        for (position, opinion) in input.opinions.iter().enumerate() {
            if opinion.trim().is_empty() {
                return Err(DeliberationError::InvalidInput(format!(
                    "opinion {position} is empty"
                )));
            }
        }
        self.config.templates.validate()?;
        Normalizer::from_names(&self.config.normalize_rules)?;

        Ok(input
            .opinions
            .iter()
            .enumerate()
            .map(|(position, opinion)| Participant::new(position, opinion.trim()))
            .collect())
    }

    async fn run(
        &self,
        question: String,
        participants: Vec<Participant>,
        sink: &dyn EventSink,
        cancel: CancellationToken,
    ) -> Result<DeliberationResult, DeliberationError> {
        let session_id = SessionId::now();
        info!(
            session = %session_id,
            participants = participants.len(),
            strategy = %self.config.voting_strategy,
            "deliberation session starting"
        );

        let ctx = Arc::new(SessionCtx {
            generation: Arc::clone(&self.generation),
            ranking: Arc::clone(&self.ranking),
            config: self.config.clone(),
            question,
            participants: participants.clone(),
            permits: Arc::new(Semaphore::new(self.config.max_in_flight.max(1))),
            cancel: cancel.clone(),
            normalizer: Normalizer::from_names(&self.config.normalize_rules)?,
        });
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut recorder = Recorder::new(sink);

        let mut items: Vec<LevelItem> = participants
            .iter()
            .map(|p| LevelItem::leaf(p.position(), p.opinion()))
            .collect();
        let mut level = 0usize;

        let final_node = loop {
            if cancel.is_cancelled() {
                let partial: Vec<GroupNode> =
                    items.into_iter().filter_map(|item| item.source).collect();
                return Ok(self.cancelled_result(session_id, partial, recorder));
            }

            let total_items = items.len();
            let groups = partition(items, self.config.max_group_size, &mut rng);
            recorder.emit(DeliberationEvent::LevelStart {
                level,
                items: total_items,
                groups: groups.len(),
            });

            match self.run_level(&ctx, &mut recorder, level, groups, &mut rng).await {
                Ok(LevelOutcome::Finished(mut nodes)) => {
                    recorder.emit(DeliberationEvent::LevelDone {
                        level,
                        winners: nodes.len(),
                    });
                    if nodes.len() == 1 {
                        break nodes.remove(0);
                    }
                    let mut promoted = Vec::with_capacity(nodes.len());
                    for node in nodes {
                        match LevelItem::promoted(node) {
                            Some(item) => promoted.push(item),
                            None => {
                                return Err(DeliberationError::Internal(
                                    "finished election has no winner".to_string(),
                                ));
                            }
                        }
                    }
                    items = promoted;
                    level += 1;
                }
                Ok(LevelOutcome::Cancelled(partial)) => {
                    return Ok(self.cancelled_result(session_id, partial, recorder));
                }
                Err(error) => {
                    recorder.emit(DeliberationEvent::Failed {
                        error: error.to_string(),
                    });
                    return Err(error);
                }
            }
        };

        let winner = match final_node.winning_statement() {
            Some(statement) => statement.to_string(),
            None => {
                return Err(DeliberationError::Internal(
                    "finished election has no winner".to_string(),
                ));
            }
        };
        recorder.emit(DeliberationEvent::Done {
            winner: winner.clone(),
        });
        let degraded = final_node.any_fallback();
        info!(session = %session_id, degraded, "deliberation session finished");

        Ok(DeliberationResult {
            session_id,
            kind: ResultKind::Completed,
            winner: Some(winner),
            tree: vec![final_node],
            degraded,
            events: recorder.transcript,
        })
    }

    fn cancelled_result(
        &self,
        session_id: SessionId,
        partial: Vec<GroupNode>,
        mut recorder: Recorder<'_>,
    ) -> DeliberationResult {
        recorder.emit(DeliberationEvent::Cancelled);
        warn!(session = %session_id, "deliberation session cancelled");
        let degraded = partial.iter().any(GroupNode::any_fallback);
        DeliberationResult {
            session_id,
            kind: ResultKind::Cancelled,
            winner: None,
            tree: partial,
            degraded,
            events: recorder.transcript,
        }
    }

    /// Run every group of one level concurrently, forwarding their events
    /// in arrival order. Returns once all groups finished and the event
    /// channel has drained.
    async fn run_level(
        &self,
        ctx: &Arc<SessionCtx>,
        recorder: &mut Recorder<'_>,
        level: usize,
        groups: Vec<Vec<LevelItem>>,
        rng: &mut StdRng,
    ) -> Result<LevelOutcome, DeliberationError> {
        let group_count = groups.len();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<DeliberationEvent>();
        let mut join_set = JoinSet::new();

        for (group_index, group_items) in groups.into_iter().enumerate() {
            let seed = rng.gen::<u64>();
            let ctx = Arc::clone(ctx);
            let events = events_tx.clone();
            join_set.spawn(run_group_election(
                ctx,
                events,
                level,
                group_index,
                group_items,
                seed,
            ));
        }
        drop(events_tx);

        let mut slots: Vec<Option<GroupNode>> = (0..group_count).map(|_| None).collect();
        let mut cancelled = false;
        let mut fatal: Option<DeliberationError> = None;

        loop {
            tokio::select! {
                biased;
                Some(event) = events_rx.recv() => {
                    recorder.emit(event);
                }
                joined = join_set.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(Ok(node)) => {
                            let idx = node.group_index;
                            slots[idx] = Some(node);
                        }
                        Ok(Err(error)) if error.is_cancelled() => {
                            cancelled = true;
                        }
                        Ok(Err(error)) => {
                            if fatal.is_none() {
                                // Stop sibling groups promptly; the session
                                // is over either way
                                ctx.cancel.cancel();
                                fatal = Some(error);
                            }
                        }
                        Err(join_error) => {
                            if fatal.is_none() {
                                ctx.cancel.cancel();
                                fatal = Some(DeliberationError::Internal(format!(
                                    "group task failed: {join_error}"
                                )));
                            }
                        }
                    }
                }
            }
        }
        // Flush chunks that raced with the last join
        while let Ok(event) = events_rx.try_recv() {
            recorder.emit(event);
        }

        if let Some(error) = fatal {
            return Err(error);
        }
        let finished: Vec<GroupNode> = slots.into_iter().flatten().collect();
        if cancelled {
            return Ok(LevelOutcome::Cancelled(finished));
        }
        if finished.len() != group_count {
            return Err(DeliberationError::Internal(
                "a group finished without a node or an error".to_string(),
            ));
        }
        Ok(LevelOutcome::Finished(finished))
    }
}
