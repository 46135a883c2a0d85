use crate::model::{LineupResult, PlayerId, RosterEntry};

/// Role badges for one roster entry. Both may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleFlags {
    pub captain: bool,
    pub luxury_reserve: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedEntry<'a> {
    pub entry: &'a RosterEntry,
    pub roles: RoleFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedLineup<'a> {
    pub starters: Vec<AnnotatedEntry<'a>>,
    pub bench: Vec<AnnotatedEntry<'a>>,
}

impl<'a> AnnotatedLineup<'a> {
    pub fn captain_count(&self) -> usize {
        self.all().filter(|a| a.roles.captain).count()
    }

    pub fn luxury_count(&self) -> usize {
        self.all().filter(|a| a.roles.luxury_reserve).count()
    }

    fn all(&self) -> impl Iterator<Item = &AnnotatedEntry<'a>> + '_ {
        self.starters.iter().chain(self.bench.iter())
    }
}

/// Flags starters against the captain identity and every entry against the
/// luxury-reserve identity. The captain is only ever searched among the
/// starters. Containment is tested, never assumed: a reference whose id is
/// absent flags nobody, and an id found in no list flags nobody.
pub fn annotate_lineup(lineup: &LineupResult) -> AnnotatedLineup<'_> {
    let captain_id = lineup.captain.as_ref().and_then(|c| c.id);
    let luxury_id = lineup.luxury_reserve.as_ref().and_then(|l| l.id);

    let decorate = |entry: &'_ RosterEntry, starter: bool| -> RoleFlags {
        RoleFlags {
            captain: starter && same_identity(entry.id, captain_id),
            luxury_reserve: same_identity(entry.id, luxury_id),
        }
    };

    AnnotatedLineup {
        starters: lineup
            .starters
            .iter()
            .map(|entry| AnnotatedEntry {
                entry,
                roles: decorate(entry, true),
            })
            .collect(),
        bench: lineup
            .bench
            .iter()
            .map(|entry| AnnotatedEntry {
                entry,
                roles: decorate(entry, false),
            })
            .collect(),
    }
}

fn same_identity(entry: Option<PlayerId>, reference: Option<PlayerId>) -> bool {
    matches!((entry, reference), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_never_match() {
        assert!(!same_identity(None, None));
        assert!(!same_identity(Some(1), None));
        assert!(!same_identity(None, Some(1)));
        assert!(same_identity(Some(1), Some(1)));
    }
}
