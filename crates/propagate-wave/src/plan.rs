use std::collections::{BTreeMap, VecDeque};

use propagate_servicemap::ServiceMap;
use propagate_types::Bundle;

use crate::scc::tarjan_scc;

/// Group bundles into waves: bundles in the same wave can dispatch
/// concurrently, later waves wait for earlier ones. Consumers that mutually
/// depend on each other (a cycle in the service map) land in the same wave
/// together rather than deadlocking the planner.
///
/// Builds a node per bundled consumer, collapses cycles via Tarjan SCC into
/// a condensation DAG, then assigns each SCC a level by longest path from
/// any root (`level = 1 + max(predecessor levels)`, 0 if it has none) —
/// generalizing a plain topological sort's level-by-level grouping to
/// tolerate cycles.
pub fn plan_waves(bundles: Vec<Bundle>, service_map: &ServiceMap) -> Vec<Vec<Bundle>> {
    if bundles.is_empty() {
        return Vec::new();
    }

    let mut consumers: Vec<String> = bundles.iter().map(|b| b.consumer_service.clone()).collect();
    consumers.sort();
    consumers.dedup();
    let index_of: BTreeMap<String, usize> = consumers
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect();

    // Edge consumer_a -> consumer_b means "b depends on a": a is the
    // producer for b's declared call, and a is itself one of the bundled
    // consumers (i.e. also being remediated this run), so b must wait.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); consumers.len()];
    for edge in &service_map.edges {
        let (Some(&producer_idx), Some(&consumer_idx)) = (
            index_of.get(edge.producer_service.as_str()),
            index_of.get(edge.consumer_service.as_str()),
        ) else {
            continue;
        };
        if producer_idx != consumer_idx && !adjacency[producer_idx].contains(&consumer_idx) {
            adjacency[producer_idx].push(consumer_idx);
        }
    }

    let sccs = tarjan_scc(&adjacency);
    let mut scc_of_node: Vec<usize> = vec![0; consumers.len()];
    for (scc_id, members) in sccs.iter().enumerate() {
        for &node in members {
            scc_of_node[node] = scc_id;
        }
    }

    let mut condensation_adjacency: Vec<Vec<usize>> = vec![Vec::new(); sccs.len()];
    let mut indegree: Vec<usize> = vec![0; sccs.len()];
    for (node, targets) in adjacency.iter().enumerate() {
        for &target in targets {
            let from = scc_of_node[node];
            let to = scc_of_node[target];
            if from != to && !condensation_adjacency[from].contains(&to) {
                condensation_adjacency[from].push(to);
                indegree[to] += 1;
            }
        }
    }

    let mut level: Vec<u32> = vec![0; sccs.len()];
    let mut queue: VecDeque<usize> = (0..sccs.len()).filter(|&i| indegree[i] == 0).collect();
    let mut remaining_indegree = indegree.clone();
    let mut processed = 0;
    while let Some(scc_id) = queue.pop_front() {
        processed += 1;
        for &next in &condensation_adjacency[scc_id] {
            level[next] = level[next].max(level[scc_id] + 1);
            remaining_indegree[next] -= 1;
            if remaining_indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    debug_assert_eq!(
        processed,
        sccs.len(),
        "condensation of an SCC graph must be acyclic"
    );

    let mut bundles_by_consumer: BTreeMap<String, Vec<Bundle>> = BTreeMap::new();
    for bundle in bundles {
        bundles_by_consumer
            .entry(bundle.consumer_service.clone())
            .or_default()
            .push(bundle);
    }

    let max_level = level.iter().copied().max().unwrap_or(0);
    let mut waves: Vec<Vec<Bundle>> = (0..=max_level).map(|_| Vec::new()).collect();
    for (consumer, node_idx) in &index_of {
        let scc_id = scc_of_node[*node_idx];
        let wave = level[scc_id] as usize;
        if let Some(bundles) = bundles_by_consumer.remove(consumer) {
            waves[wave].extend(bundles);
        }
    }

    waves.retain(|wave| !wave.is_empty());
    waves
}

#[cfg(test)]
mod tests {
    use super::*;
    use propagate_types::{ChangeSet, Confidence, Impact, Method, RemediationKind, ServiceEdge};

    fn bundle(consumer: &str) -> Bundle {
        Bundle {
            kind: RemediationKind::BreakingContractChange,
            consumer_service: consumer.to_string(),
            consumer_repo: format!("org/{consumer}"),
            producer_service: "billing".to_string(),
            change_set: ChangeSet::new("billing", "v1", "v2", vec![]),
            impacts: vec![Impact {
                consumer_service: consumer.to_string(),
                producer_service: "billing".to_string(),
                path: "/sessions".to_string(),
                method: Method::Post,
                confidence: Confidence::High,
                declared: true,
                observed_call_count: None,
            }],
            candidate_paths: vec![],
            protected_paths: vec![],
            fingerprint: format!("fp-{consumer}"),
        }
    }

    fn edge(producer: &str, consumer: &str) -> ServiceEdge {
        ServiceEdge {
            consumer_service: consumer.to_string(),
            producer_service: producer.to_string(),
            path: "/x".to_string(),
            method: Method::Get,
        }
    }

    #[test]
    fn independent_consumers_land_in_a_single_wave() {
        let waves = plan_waves(vec![bundle("a"), bundle("b")], &ServiceMap::default());
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].len(), 2);
    }

    #[test]
    fn chained_dependency_produces_ordered_waves() {
        // checkout depends on gateway depends on billing (itself producer,
        // not bundled); gateway also bundled since it consumes billing.
        let service_map = ServiceMap {
            edges: vec![edge("gateway", "checkout")],
        };
        let waves = plan_waves(vec![bundle("gateway"), bundle("checkout")], &service_map);
        assert_eq!(waves.len(), 2);
        assert_eq!(waves[0][0].consumer_service, "gateway");
        assert_eq!(waves[1][0].consumer_service, "checkout");
    }

    #[test]
    fn mutual_dependency_cycle_collapses_into_one_wave() {
        let service_map = ServiceMap {
            edges: vec![edge("a", "b"), edge("b", "a")],
        };
        let waves = plan_waves(vec![bundle("a"), bundle("b")], &service_map);
        assert_eq!(waves.len(), 1);
        assert_eq!(waves[0].len(), 2);
    }
}
