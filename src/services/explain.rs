use std::collections::HashMap;

use crate::models::{Candidate, EntityAffinityMap, EntityKind, SignalKind};

/// Human-readable grounds for one recommendation
///
/// Reasons are additive metadata: they decorate an already-ranked item and
/// never influence scores or ordering.
pub fn reasons_for(
    candidate: &Candidate,
    affinity: &EntityAffinityMap,
    per_signal: &HashMap<SignalKind, f32>,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if signal_fired(per_signal, SignalKind::Content) {
        reasons.push("Shares themes with titles you rated highly".to_string());
    }
    if signal_fired(per_signal, SignalKind::Collaborative) {
        reasons.push("Popular with readers whose taste matches yours".to_string());
    }
    if signal_fired(per_signal, SignalKind::Cooccurrence) {
        reasons.push("Often rated alongside titles you liked".to_string());
    }
    if signal_fired(per_signal, SignalKind::Precomputed) {
        reasons.push("Close match to a title you liked".to_string());
    }

    for kind in EntityKind::ALL {
        if !signal_fired(per_signal, SignalKind::Affinity(kind)) {
            continue;
        }
        let matched = affinity.matched_on(kind, &candidate.entities);
        let positive = matched.iter().filter(|(_, w)| *w > 0.0).count();
        if positive > 0 {
            reasons.push(affinity_reason(kind, positive));
        }
    }

    reasons
}

fn signal_fired(per_signal: &HashMap<SignalKind, f32>, kind: SignalKind) -> bool {
    per_signal.get(&kind).copied().unwrap_or(0.0) > 0.0
}

fn affinity_reason(kind: EntityKind, count: usize) -> String {
    let noun = match kind {
        EntityKind::Tag => {
            if count == 1 {
                "tag"
            } else {
                "tags"
            }
        }
        EntityKind::Trait => {
            if count == 1 {
                "character trait"
            } else {
                "character traits"
            }
        }
        EntityKind::Staff => {
            if count == 1 {
                "staff member"
            } else {
                "staff members"
            }
        }
        EntityKind::Seiyuu => {
            if count == 1 {
                "voice actor"
            } else {
                "voice actors"
            }
        }
        EntityKind::Producer => {
            if count == 1 {
                "producer"
            } else {
                "producers"
            }
        }
    };
    format!("Features {} {} you favor", count, noun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityRef, SpoilerLevel, TagAssociation};
    use crate::services::signals::test_support;

    fn tagged_candidate(tag_ids: &[i64]) -> Candidate {
        let mut candidate = test_support::candidate(1);
        candidate.entities.tags = tag_ids
            .iter()
            .map(|&tag_id| TagAssociation {
                tag_id,
                score: 2.0,
                spoiler: SpoilerLevel::None,
                sexual: false,
            })
            .collect();
        candidate
    }

    #[test]
    fn test_no_fired_signals_no_reasons() {
        let candidate = tagged_candidate(&[1]);
        let reasons = reasons_for(&candidate, &EntityAffinityMap::default(), &HashMap::new());
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_content_signal_yields_theme_reason() {
        let candidate = tagged_candidate(&[]);
        let per_signal = HashMap::from([(SignalKind::Content, 0.8)]);
        let reasons = reasons_for(&candidate, &EntityAffinityMap::default(), &per_signal);
        assert_eq!(reasons, vec!["Shares themes with titles you rated highly"]);
    }

    #[test]
    fn test_tag_affinity_reason_counts_positive_matches() {
        let candidate = tagged_candidate(&[10, 11, 12]);
        let affinity = EntityAffinityMap::new(HashMap::from([
            (EntityRef::new(EntityKind::Tag, 10), 0.9),
            (EntityRef::new(EntityKind::Tag, 11), 0.4),
            // Disliked tag must not count toward the reason.
            (EntityRef::new(EntityKind::Tag, 12), -0.5),
        ]));
        let per_signal = HashMap::from([(SignalKind::Affinity(EntityKind::Tag), 1.3)]);

        let reasons = reasons_for(&candidate, &affinity, &per_signal);
        assert_eq!(reasons, vec!["Features 2 tags you favor"]);
    }

    #[test]
    fn test_singular_noun_for_single_match() {
        let candidate = tagged_candidate(&[10]);
        let affinity =
            EntityAffinityMap::new(HashMap::from([(EntityRef::new(EntityKind::Tag, 10), 0.9)]));
        let per_signal = HashMap::from([(SignalKind::Affinity(EntityKind::Tag), 0.9)]);

        let reasons = reasons_for(&candidate, &affinity, &per_signal);
        assert_eq!(reasons, vec!["Features 1 tag you favor"]);
    }

    #[test]
    fn test_zero_scored_signal_does_not_fire() {
        let candidate = tagged_candidate(&[]);
        let per_signal = HashMap::from([(SignalKind::Content, 0.0)]);
        let reasons = reasons_for(&candidate, &EntityAffinityMap::default(), &per_signal);
        assert!(reasons.is_empty());
    }
}
