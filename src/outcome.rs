//! Draw evaluation and result messages.
//!
//! Every attempt samples three emotes from the pool with replacement
//! and counts how many equal the first. All three matching wins. The
//! Twitch variant additionally classifies the draw against a handful of
//! curated name sets (kept for the stats site) and a subscriber-set
//! match derived from the emote-set mapping.

use crate::pool::EmotePool;
use crate::variant::Variant;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Number of emotes drawn per attempt.
pub const DRAW_LENGTH: usize = 3;

/// Smiley-style global emotes.
const BASIC_EMOTES: [&str; 14] = [
    ":)", ":(", ":D", ">(", ":z", "o_O", "B)", ":o", "<3", ":\\", ";)", ":P", ";P", "R)",
];

/// Kappa-family emotes that don't carry "kappa" in their name.
const EXTRA_KAPPA_EMOTES: [&str; 2] = ["Keepo", "MiniK"];

const CAT_EMOTES: [&str; 6] = ["BionicBunion", "Kippa", "Keepo", "RitzMitz", "mcaT", "CoolCat"];

const DOG_EMOTES: [&str; 4] = ["FrankerZ", "RalpherZ", "CorgiDerp", "OhMyDog"];

/// The three selected emotes of one attempt, ordered as drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub ids: [String; DRAW_LENGTH],
    pub names: [String; DRAW_LENGTH],
}

impl Draw {
    /// Sample three ids uniformly with replacement from the pool.
    ///
    /// Returns `None` on an empty pool.
    pub fn sample<R: Rng>(pool: &EmotePool, rng: &mut R) -> Option<Self> {
        let ids: Vec<&String> = pool.keys().collect();
        if ids.is_empty() {
            return None;
        }
        let mut selected_ids = Vec::with_capacity(DRAW_LENGTH);
        let mut selected_names = Vec::with_capacity(DRAW_LENGTH);
        for _ in 0..DRAW_LENGTH {
            let id = (*ids.as_slice().choose(rng)?).clone();
            selected_names.push(pool.get(&id)?.clone());
            selected_ids.push(id);
        }
        Some(Self {
            ids: selected_ids.try_into().ok()?,
            names: selected_names.try_into().ok()?,
        })
    }

    /// Build a draw from explicit ids, resolving names from the pool.
    ///
    /// Returns `None` when an id is not in the pool.
    pub fn from_ids(pool: &EmotePool, ids: [&str; DRAW_LENGTH]) -> Option<Self> {
        let mut selected_ids = Vec::with_capacity(DRAW_LENGTH);
        let mut selected_names = Vec::with_capacity(DRAW_LENGTH);
        for id in ids {
            selected_names.push(pool.get(id)?.clone());
            selected_ids.push(id.to_string());
        }
        Some(Self {
            ids: selected_ids.try_into().ok()?,
            names: selected_names.try_into().ok()?,
        })
    }
}

/// Twitch-only all-three category flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Categories {
    pub basic: bool,
    pub kappa: bool,
    pub cat: bool,
    pub dog: bool,
    pub subscriber: bool,
}

/// Evaluated result of a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// How many of the three draws equal the first.
    pub num_matching: u8,
    /// All three draws identical.
    pub all_matching: bool,
    /// Present for the Twitch variant only.
    pub categories: Option<Categories>,
}

/// Evaluate a draw for the given variant.
///
/// `emote_sets` is the Twitch emote-id → set-id mapping; when absent
/// the identity mapping is used (numeric ids map to themselves,
/// anything else to 0 = no set).
pub fn evaluate(
    variant: Variant,
    draw: &Draw,
    emote_sets: Option<&HashMap<String, i64>>,
) -> Outcome {
    let num_matching = draw.ids.iter().filter(|id| **id == draw.ids[0]).count() as u8;
    let all_matching = num_matching as usize == DRAW_LENGTH;

    let categories = variant.has_categories().then(|| {
        let match_set = set_id(&draw.ids[0], emote_sets);
        let mut counts = (0usize, 0usize, 0usize, 0usize, 0usize);
        for (id, name) in draw.ids.iter().zip(draw.names.iter()) {
            if BASIC_EMOTES.contains(&name.as_str()) {
                counts.0 += 1;
            }
            if is_kappa_family(name) {
                counts.1 += 1;
            }
            if CAT_EMOTES.contains(&name.as_str()) {
                counts.2 += 1;
            }
            if DOG_EMOTES.contains(&name.as_str()) {
                counts.3 += 1;
            }
            if set_id(id, emote_sets) == match_set {
                counts.4 += 1;
            }
        }
        Categories {
            basic: counts.0 == DRAW_LENGTH,
            kappa: counts.1 == DRAW_LENGTH,
            cat: counts.2 == DRAW_LENGTH,
            dog: counts.3 == DRAW_LENGTH,
            subscriber: counts.4 == DRAW_LENGTH && match_set != 0,
        }
    });

    Outcome {
        num_matching,
        all_matching,
        categories,
    }
}

fn is_kappa_family(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXTRA_KAPPA_EMOTES.contains(&name) || lower.contains("kappa") || lower.contains("klappa")
}

fn set_id(id: &str, emote_sets: Option<&HashMap<String, i64>>) -> i64 {
    match emote_sets {
        Some(sets) => sets.get(id).copied().unwrap_or(0),
        None => id.parse().unwrap_or(0),
    }
}

/// Public result line: "`user` -> `a | b | c`".
pub fn result_line(user: &str, draw: &Draw) -> String {
    format!("{} -> {}", user, draw.names.join(" | "))
}

/// Public win announcement for a full match.
pub fn win_line(user: &str, variant: Variant) -> String {
    format!("{} has won {}", user, variant.command())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: &[(&str, &str)]) -> EmotePool {
        entries
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    #[test]
    fn test_all_matching_iff_three_identical() {
        let p = pool(&[("1", "A"), ("2", "B")]);
        let win = Draw::from_ids(&p, ["1", "1", "1"]).unwrap();
        let outcome = evaluate(Variant::Ffz, &win, None);
        assert_eq!(outcome.num_matching, 3);
        assert!(outcome.all_matching);
        assert!(outcome.categories.is_none());

        let near = Draw::from_ids(&p, ["1", "1", "2"]).unwrap();
        let outcome = evaluate(Variant::Ffz, &near, None);
        assert_eq!(outcome.num_matching, 2);
        assert!(!outcome.all_matching);

        // First-draw anchoring: 1,2,2 matches only itself.
        let off = Draw::from_ids(&p, ["1", "2", "2"]).unwrap();
        assert_eq!(evaluate(Variant::Ffz, &off, None).num_matching, 1);
    }

    #[test]
    fn test_empirical_win_rate_on_two_entry_pool() {
        // P(all 3 equal) over 2 equally likely ids is 2 * (1/2)^3 = 1/4.
        let p = pool(&[("1", "A"), ("2", "B")]);
        let mut rng = rand::thread_rng();
        let mut wins = 0usize;
        let samples = 1000;
        for _ in 0..samples {
            let draw = Draw::sample(&p, &mut rng).unwrap();
            if evaluate(Variant::Bttv, &draw, None).all_matching {
                wins += 1;
            }
        }
        let rate = wins as f64 / samples as f64;
        // 5 sigma around 0.25 for n=1000.
        assert!((0.18..=0.32).contains(&rate), "win rate {}", rate);
    }

    #[test]
    fn test_sample_from_empty_pool() {
        assert!(Draw::sample(&EmotePool::new(), &mut rand::thread_rng()).is_none());
    }

    #[test]
    fn test_kappa_family_matching() {
        assert!(is_kappa_family("Kappa"));
        assert!(is_kappa_family("KappaPride"));
        assert!(is_kappa_family("SmallKappaHD"));
        assert!(is_kappa_family("Keepo"));
        assert!(is_kappa_family("MiniK"));
        assert!(is_kappa_family("Klappa"));
        assert!(!is_kappa_family("FrankerZ"));
    }

    #[test]
    fn test_twitch_categories() {
        let p = pool(&[("25", "Kappa"), ("30", "Keepo"), ("40", "FrankerZ"), ("50", ":)")]);
        let draw = Draw::from_ids(&p, ["25", "30", "25"]).unwrap();
        let categories = evaluate(Variant::Twitch, &draw, None).categories.unwrap();
        assert!(categories.kappa);
        assert!(!categories.basic);
        assert!(!categories.cat);
        assert!(!categories.dog);

        let dogs = Draw::from_ids(&p, ["40", "40", "40"]).unwrap();
        let categories = evaluate(Variant::Twitch, &dogs, None).categories.unwrap();
        assert!(categories.dog);
        assert!(!categories.kappa);

        let basics = Draw::from_ids(&p, ["50", "50", "50"]).unwrap();
        assert!(evaluate(Variant::Twitch, &basics, None).categories.unwrap().basic);
    }

    #[test]
    fn test_subscriber_match_with_mapping() {
        let p = pool(&[("1", "SubA"), ("2", "SubB"), ("3", "Other")]);
        let sets: HashMap<String, i64> =
            [("1", 7i64), ("2", 7), ("3", 9)].iter().map(|(k, v)| (k.to_string(), *v)).collect();

        let same_set = Draw::from_ids(&p, ["1", "2", "1"]).unwrap();
        let categories = evaluate(Variant::Twitch, &same_set, Some(&sets)).categories.unwrap();
        assert!(categories.subscriber);

        let mixed = Draw::from_ids(&p, ["1", "3", "1"]).unwrap();
        let categories = evaluate(Variant::Twitch, &mixed, Some(&sets)).categories.unwrap();
        assert!(!categories.subscriber);
    }

    #[test]
    fn test_subscriber_identity_fallback() {
        let p = pool(&[("7", "A"), ("8", "B")]);
        let draw = Draw::from_ids(&p, ["7", "7", "7"]).unwrap();
        let categories = evaluate(Variant::Twitch, &draw, None).categories.unwrap();
        assert!(categories.subscriber);
    }

    #[test]
    fn test_subscriber_zero_set_never_matches() {
        // Set id 0 means "no set": three identical draws in set 0 are
        // not a subscriber match.
        let p = pool(&[("x", "A")]);
        let draw = Draw::from_ids(&p, ["x", "x", "x"]).unwrap();
        let categories = evaluate(Variant::Twitch, &draw, None).categories.unwrap();
        assert!(!categories.subscriber);

        let sets: HashMap<String, i64> = [("x".to_string(), 0i64)].into_iter().collect();
        let categories = evaluate(Variant::Twitch, &draw, Some(&sets)).categories.unwrap();
        assert!(!categories.subscriber);
    }

    #[test]
    fn test_message_composition() {
        let p = pool(&[("1", "Kappa"), ("2", "Keepo")]);
        let draw = Draw::from_ids(&p, ["1", "2", "1"]).unwrap();
        assert_eq!(result_line("alice", &draw), "alice -> Kappa | Keepo | Kappa");
        assert_eq!(win_line("alice", Variant::Twitch), "alice has won !slots");
        assert_eq!(win_line("alice", Variant::Bttv), "alice has won !bttvslots");
    }
}
