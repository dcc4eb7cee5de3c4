use crate::domain::model::{RuleSummary, VoteMatrix};
use std::collections::BTreeSet;

/// 每條規則的極性、覆蓋率、重疊率與衝突率
pub fn summarize_rules(matrix: &VoteMatrix) -> Vec<RuleSummary> {
    let n = matrix.num_rows();

    matrix
        .rule_names()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let mut polarity = BTreeSet::new();
            let mut covered = 0usize;
            let mut overlapped = 0usize;
            let mut conflicted = 0usize;

            for row in matrix.rows() {
                let Some(own) = row.get(j).and_then(|vote| vote.class_id()) else {
                    continue;
                };
                covered += 1;
                polarity.insert(own);

                let others = row
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != j)
                    .filter_map(|(_, vote)| vote.class_id());

                let mut overlap = false;
                let mut conflict = false;
                for other in others {
                    overlap = true;
                    if other != own {
                        conflict = true;
                        break;
                    }
                }
                overlapped += usize::from(overlap);
                conflicted += usize::from(conflict);
            }

            let fraction = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 };

            RuleSummary {
                name: name.clone(),
                polarity: polarity.into_iter().collect(),
                coverage: fraction(covered),
                overlaps: fraction(overlapped),
                conflicts: fraction(conflicted),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Vote;

    #[test]
    fn test_summary_statistics() {
        let matrix = VoteMatrix::new(
            vec!["lf_a".into(), "lf_b".into(), "lf_c".into()],
            vec![
                vec![Vote::Class(0), Vote::Class(0), Vote::Abstain],
                vec![Vote::Class(0), Vote::Class(2), Vote::Abstain],
                vec![Vote::Abstain, Vote::Abstain, Vote::Class(1)],
                vec![Vote::Class(0), Vote::Abstain, Vote::Abstain],
            ],
        )
        .unwrap();

        let summaries = summarize_rules(&matrix);

        assert_eq!(summaries[0].name, "lf_a");
        assert_eq!(summaries[0].polarity, vec![0]);
        assert_eq!(summaries[0].coverage, 0.75);
        assert_eq!(summaries[0].overlaps, 0.5);
        assert_eq!(summaries[0].conflicts, 0.25);

        assert_eq!(summaries[1].polarity, vec![0, 2]);
        assert_eq!(summaries[1].coverage, 0.5);

        assert_eq!(summaries[2].coverage, 0.25);
        assert_eq!(summaries[2].overlaps, 0.0);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = VoteMatrix::new(vec!["lf_a".into()], vec![]).unwrap();
        let summaries = summarize_rules(&matrix);
        assert_eq!(summaries[0].coverage, 0.0);
    }
}
