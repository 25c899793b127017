use canopy_core_types::{TreeType, Votes};

/// The votes cast for a single type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeVotes {
    pub tree_type: TreeType,

    /// Number of votes for that type
    pub votes: Votes,

    /// Sequence number, within the tally, of the vote which brought
    /// `votes` to its current value
    pub reached_at: Votes,
}

/// VoteCount tallies the votes cast for the type of a single tree.
///
/// Types are kept in the order in which they first received a vote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteCount {
    types: Vec<TypeVotes>,
    total: Votes,
}

impl VoteCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vote for the given type and return the new number of votes for it.
    pub fn add(&mut self, tree_type: TreeType) -> Votes {
        self.total += 1;
        let sequence = self.total;

        match self.types.iter_mut().find(|t| t.tree_type == tree_type) {
            Some(entry) => {
                entry.votes += 1;
                entry.reached_at = sequence;
                entry.votes
            }
            None => {
                self.types.push(TypeVotes {
                    tree_type,
                    votes: 1,
                    reached_at: sequence,
                });
                1
            }
        }
    }

    /// Return the number of votes for the given type, or 0 if it got none.
    pub fn get(&self, tree_type: &TreeType) -> Votes {
        self.types
            .iter()
            .find(|t| &t.tree_type == tree_type)
            .map_or(0, |t| t.votes)
    }

    /// Total number of votes, across all types.
    pub fn total(&self) -> Votes {
        self.total
    }

    /// Sum of the per-type counts, which must always equal [`Self::total`].
    pub fn counted(&self) -> Votes {
        self.types.iter().map(|t| t.votes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Per-type counts, in order of first appearance.
    pub fn types(&self) -> &[TypeVotes] {
        &self.types
    }

    /// Overwrite the total, leaving the per-type counts untouched.
    #[cfg(test)]
    pub(crate) fn force_total(&mut self, total: Votes) {
        self.total = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_appearance_order() {
        let mut count = VoteCount::new();

        assert_eq!(count.add("Maple".into()), 1);
        assert_eq!(count.add("Oak".into()), 1);
        assert_eq!(count.add("Maple".into()), 2);

        let order: Vec<_> = count.types().iter().map(|t| t.tree_type.as_str()).collect();
        assert_eq!(order, ["Maple", "Oak"]);
        assert_eq!(count.total(), 3);
        assert_eq!(count.counted(), 3);
        assert_eq!(count.get(&"Birch".into()), 0);
    }

    #[test]
    fn remembers_when_each_count_was_reached() {
        let mut count = VoteCount::new();

        count.add("Oak".into());
        count.add("Maple".into());
        count.add("Maple".into());
        count.add("Oak".into());

        let oak = &count.types()[0];
        let maple = &count.types()[1];
        assert_eq!((oak.votes, oak.reached_at), (2, 4));
        assert_eq!((maple.votes, maple.reached_at), (2, 3));
    }
}
