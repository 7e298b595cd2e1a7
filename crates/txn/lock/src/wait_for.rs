use page::transaction_id::TransactionId;
use std::collections::HashSet;

/// Depth-first search for a path in the wait-for graph that leads from `start` back to `start`.
///
/// `successors(t)` yields the transactions `t` currently waits for. Returns the cycle as the list
/// of transactions on it, starting with `start`, or `None` if `start` is not on a cycle.
pub fn find_cycle<F, I>(start: TransactionId, mut successors: F) -> Option<Vec<TransactionId>>
where
    F: FnMut(TransactionId) -> I,
    I: IntoIterator<Item = TransactionId>,
{
    let mut expand = |tid| successors(tid).into_iter().collect::<Vec<_>>().into_iter();

    let mut visited = HashSet::from([start]);
    let mut path = vec![start];
    let mut stack = vec![expand(start)];

    while let Some(frontier) = stack.last_mut() {
        match frontier.next() {
            Some(next) if next == start => return Some(path),
            Some(next) => {
                if visited.insert(next) {
                    path.push(next);
                    stack.push(expand(next));
                }
            }
            None => {
                stack.pop();
                path.pop();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn t(raw: u64) -> TransactionId {
        TransactionId::from_raw(raw)
    }

    fn graph(edges: &[(u64, u64)]) -> HashMap<TransactionId, Vec<TransactionId>> {
        let mut graph: HashMap<TransactionId, Vec<TransactionId>> = HashMap::new();
        for (from, to) in edges {
            graph.entry(t(*from)).or_default().push(t(*to));
        }
        graph
    }

    fn search(graph: &HashMap<TransactionId, Vec<TransactionId>>, start: u64) -> Option<Vec<u64>> {
        find_cycle(t(start), |tid| graph.get(&tid).cloned().unwrap_or_default())
            .map(|cycle| cycle.iter().map(TransactionId::as_u64).collect())
    }

    #[test]
    fn no_edges_no_cycle() {
        assert_eq!(search(&graph(&[]), 1), None);
    }

    #[test]
    fn two_party_cycle() {
        let g = graph(&[(1, 2), (2, 1)]);
        assert_eq!(search(&g, 2), Some(vec![2, 1]));
    }

    #[test]
    fn long_cycle_through_branches() {
        let g = graph(&[(1, 5), (1, 2), (2, 3), (3, 4), (4, 1), (5, 6)]);
        assert_eq!(search(&g, 1), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn cycle_not_involving_start_is_ignored() {
        // 1 waits on a cycle between 2 and 3, but is not itself on it
        let g = graph(&[(1, 2), (2, 3), (3, 2)]);
        assert_eq!(search(&g, 1), None);
    }

    #[test]
    fn chain_without_cycle() {
        let g = graph(&[(1, 2), (2, 3), (1, 3)]);
        assert_eq!(search(&g, 1), None);
    }
}
