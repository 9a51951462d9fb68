//! Flow networks for active time feasibility.
//!
//! A candidate set of active slots is feasible iff the time-expanded network
//!
//! ```text
//! source ──duration──▶ job ──1──▶ slot ──max_concurrency──▶ sink
//! ```
//!
//! carries the total job duration. [`FlowNetworkBuilder`] builds that network
//! for a pool, toggles slots, and decodes flow into job schedules.
//!
//! # Reference
//! Chang, Gabow & Khuller (2014), "A model for minimizing active processor time"

mod algorithms;
mod builder;
mod network;

pub use builder::{FeasibilityNetwork, FlowNetworkBuilder};
pub use network::{EdgeId, FlowNetwork};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Maximum flow algorithm used by feasibility checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMethod {
    /// Shortest augmenting paths found by BFS.
    EdmondsKarp,
    /// Augmenting paths found by DFS.
    FordFulkerson,
    /// Blocking flows on BFS level graphs.
    Dinic,
    /// FIFO push-relabel.
    #[default]
    PreflowPush,
    /// Augmenting paths along exact distance labels, with the gap heuristic.
    ShortestAugmentingPath,
}

impl FlowMethod {
    /// Snake-case name of the method.
    pub fn name(self) -> &'static str {
        match self {
            FlowMethod::EdmondsKarp => "edmonds_karp",
            FlowMethod::FordFulkerson => "ford_fulkerson",
            FlowMethod::Dinic => "dinic",
            FlowMethod::PreflowPush => "preflow_push",
            FlowMethod::ShortestAugmentingPath => "shortest_augmenting_path",
        }
    }
}

impl fmt::Display for FlowMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlowMethod {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edmonds_karp" => Ok(FlowMethod::EdmondsKarp),
            "ford_fulkerson" => Ok(FlowMethod::FordFulkerson),
            "dinic" | "dinitz" => Ok(FlowMethod::Dinic),
            "preflow_push" => Ok(FlowMethod::PreflowPush),
            "shortest_augmenting_path" => Ok(FlowMethod::ShortestAugmentingPath),
            other => Err(SchedulingError::UnknownFlowMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_method_parse() {
        assert_eq!("dinic".parse::<FlowMethod>(), Ok(FlowMethod::Dinic));
        assert_eq!("dinitz".parse::<FlowMethod>(), Ok(FlowMethod::Dinic));
        assert_eq!(
            FlowMethod::EdmondsKarp.to_string().parse::<FlowMethod>(),
            Ok(FlowMethod::EdmondsKarp)
        );
        assert_eq!(
            "shortest_augmenting_path".parse::<FlowMethod>(),
            Ok(FlowMethod::ShortestAugmentingPath)
        );
        assert_eq!(
            "simplex".parse::<FlowMethod>(),
            Err(SchedulingError::UnknownFlowMethod("simplex".into()))
        );
    }

    #[test]
    fn test_flow_method_serde() {
        assert_eq!(
            serde_json::to_string(&FlowMethod::PreflowPush).unwrap(),
            "\"preflow_push\""
        );
        let m: FlowMethod = serde_json::from_str("\"ford_fulkerson\"").unwrap();
        assert_eq!(m, FlowMethod::FordFulkerson);
        assert_eq!(FlowMethod::default(), FlowMethod::PreflowPush);
    }
}
