//! Voting population strategy

use serde::{Deserialize, Serialize};

/// Who votes in an election above the leaf level.
///
/// At level 0 both strategies coincide: a group's voters are its own
/// members. The same collapse happens at the root when every leaf feeds it,
/// where `OwnGroupOnly` reduces to all participants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingStrategy {
    /// Only the original participants whose opinions transitively feed the
    /// group's items vote in its election.
    #[default]
    OwnGroupOnly,
    /// Every original participant votes in every election, ranking
    /// candidates they may not have helped produce.
    AllParticipants,
}

impl std::str::FromStr for VotingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "own_group_only" => Ok(Self::OwnGroupOnly),
            "all_participants" => Ok(Self::AllParticipants),
            other => Err(format!(
                "unknown voting strategy '{other}' (expected 'own_group_only' or 'all_participants')"
            )),
        }
    }
}

impl std::fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnGroupOnly => write!(f, "own_group_only"),
            Self::AllParticipants => write!(f, "all_participants"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_strategies() {
        assert_eq!(
            "own_group_only".parse::<VotingStrategy>().unwrap(),
            VotingStrategy::OwnGroupOnly
        );
        assert_eq!(
            "all_participants".parse::<VotingStrategy>().unwrap(),
            VotingStrategy::AllParticipants
        );
        assert!("everyone".parse::<VotingStrategy>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for strategy in [VotingStrategy::OwnGroupOnly, VotingStrategy::AllParticipants] {
            assert_eq!(strategy.to_string().parse::<VotingStrategy>(), Ok(strategy));
        }
    }
}
