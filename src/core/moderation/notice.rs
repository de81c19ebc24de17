// Mad-libs style deletion notices.
//
// Purely cosmetic: every variant mentions the author and says a QR code was
// caught. Takes the RNG as a parameter so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;

const VERBS: [&str; 6] = ["sneak", "pass", "smuggle", "throw", "drive", "slip"];
const ADJECTIVES: [&str; 4] = ["fastest", "quickest", "most skillful", "acclaimed"];
const NOUNS: [&str; 3] = ["type", "stuff", "garbage"];
const PLACES: [&str; 6] = ["land", "world", "country", "sea", "server", "internet"];
const HUNTER_VERBS: [&str; 6] = ["spott", "destroy", "snip", "sniff", "roast", "eat"];
const GREETINGS: [&str; 4] = ["Hey", "Oy", "Whoa", "Stop"];
const AFFIRMATIONS: [&str; 6] = ["like", "enjoy", "allow", "take", "upvote", "accept"];
const DIRECTIONS: [&str; 3] = ["past", "through", "under"];

const TEMPLATE_COUNT: usize = 3;

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &[&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

/// Compose a notice for a message from `author_id` that was removed.
pub fn compose_notice<R: Rng + ?Sized>(rng: &mut R, author_id: u64) -> String {
    let author = format!("<@{}>", author_id);

    match rng.gen_range(0..TEMPLATE_COUNT) {
        0 => format!(
            "{} {}! That's a QR Code! We don't {} that {} around here!",
            pick(rng, &GREETINGS),
            author,
            pick(rng, &AFFIRMATIONS),
            pick(rng, &NOUNS)
        ),
        1 => format!(
            "{} thought they could {} QR codes {} me, but no dice.",
            author,
            pick(rng, &VERBS),
            pick(rng, &DIRECTIONS)
        ),
        _ => format!(
            "{}, I'm the {} QR code {}er in the {}, and I just {}ed yours.",
            author,
            pick(rng, &ADJECTIVES),
            pick(rng, &HUNTER_VERBS),
            pick(rng, &PLACES),
            pick(rng, &HUNTER_VERBS)
        ),
    }
}
