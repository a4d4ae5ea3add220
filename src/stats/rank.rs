//! Rank utilities for the non-parametric tests.

/// Tolerance under which two observations count as tied.
const TIE_EPS: f64 = 1e-12;

/// Assign ranks (1-based) to pre-sorted `(value, group)` pairs, giving
/// every member of a tie group the average of the ranks it spans.
pub fn average_ranks(sorted: &[(f64, usize)]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let end = tie_group_end(sorted, start);
        // Ranks start+1 ..= end are tied; each member gets their average.
        let avg = (start + 1 + end) as f64 / 2.0;
        for rank in ranks.iter_mut().take(end).skip(start) {
            *rank = avg;
        }
        start = end;
    }
    ranks
}

/// Tie correction term for rank-test variances: sum of t*(t^2 - 1) over
/// every tie group of size t.
pub fn tie_correction(sorted: &[(f64, usize)]) -> f64 {
    let n = sorted.len();
    let mut correction = 0.0;
    let mut start = 0;
    while start < n {
        let end = tie_group_end(sorted, start);
        let t = (end - start) as f64;
        if t > 1.0 {
            correction += t * (t * t - 1.0);
        }
        start = end;
    }
    correction
}

// Exclusive end index of the tie group beginning at `start`.
fn tie_group_end(sorted: &[(f64, usize)], start: usize) -> usize {
    let mut end = start + 1;
    while end < sorted.len() && (sorted[end].0 - sorted[start].0).abs() < TIE_EPS {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_without_ties() {
        let sorted = vec![(1.0, 0), (2.0, 0), (3.0, 1), (4.0, 1)];
        assert_eq!(average_ranks(&sorted), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tie_correction(&sorted), 0.0);
    }

    #[test]
    fn ranks_with_ties() {
        // Values 2.0 at positions 2 and 3 share rank (2 + 3) / 2 = 2.5.
        let sorted = vec![(1.0, 0), (2.0, 0), (2.0, 1), (4.0, 1)];
        assert_eq!(average_ranks(&sorted), vec![1.0, 2.5, 2.5, 4.0]);
        // One tie group of size 2: 2 * (4 - 1) = 6.
        assert_eq!(tie_correction(&sorted), 6.0);
    }

    #[test]
    fn all_tied() {
        let sorted = vec![(5.0, 0), (5.0, 0), (5.0, 1), (5.0, 1)];
        assert_eq!(average_ranks(&sorted), vec![2.5, 2.5, 2.5, 2.5]);
        assert_eq!(tie_correction(&sorted), 4.0 * 15.0);
    }
}
