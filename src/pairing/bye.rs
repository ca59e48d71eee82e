use crate::standings::Standing;

/// Bye candidates in the order they should be tried.
///
/// Only players with the fewest byes so far are eligible, lowest-ranked first.
/// While anybody still has no bye, this is exactly "the lowest-ranked player
/// without a bye"; once everyone has one it becomes the lowest-ranked player
/// overall, and so on.
pub fn bye_candidates(ordered: &[&Standing]) -> Vec<usize> {
    let fewest = ordered.iter().map(|s| s.byes).min().unwrap_or(0);

    (0..ordered.len())
        .rev()
        .filter(|&idx| ordered[idx].byes == fewest)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(player_id: i64, byes: u32) -> Standing {
        Standing {
            byes,
            ..Standing::new(player_id)
        }
    }

    #[test]
    fn test_lowest_ranked_without_bye_comes_first() {
        let rows = [standing(1, 0), standing(2, 0), standing(3, 1)];
        let ordered: Vec<&Standing> = rows.iter().collect();

        assert_eq!(bye_candidates(&ordered), vec![1, 0]);
    }

    #[test]
    fn test_everyone_eligible_once_all_had_a_bye() {
        let rows = [standing(1, 1), standing(2, 1), standing(3, 1)];
        let ordered: Vec<&Standing> = rows.iter().collect();

        assert_eq!(bye_candidates(&ordered), vec![2, 1, 0]);
    }
}
