use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Happy", "Clever", "Quiet", "Lively", "Mystic", "Brave", "Witty", "Elegant", "Cute", "Dashing",
];

const NOUNS: &[&str] = &[
    "Kitten", "Puppy", "Panda", "Tiger", "Bunny", "Fox", "Dolphin", "Eagle", "Lion", "Butterfly",
];

pub const PALETTE: &[&str] = &[
    "#00ff00", "#00ffff", "#ff0000", "#ff00ff", "#ffff00", "#0000ff", "#ff6600", "#9933ff",
    "#33ff99", "#ff3399", "#3399ff", "#ffcc00", "#00ccff", "#ff9900", "#66ff33", "#cc00ff",
    "#ff3333", "#33ffcc", "#ffcc33", "#9966ff", "#33ccff", "#ff66b3", "#66ff99", "#ff99cc",
    "#66ccff", "#ffcc66", "#99ffcc", "#cc66ff", "#ff3366", "#3366ff",
];

/// e.g. `BravePanda417`
pub fn random_user_id() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("Happy");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Panda");
    format!("{}{}{}", adjective, noun, rng.gen_range(100..1000))
}

pub fn random_color() -> String {
    PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PALETTE[0])
        .to_string()
}

/// Trim and drop control characters (newlines included).
pub fn sanitize_user_id(raw: &str) -> String {
    raw.trim().chars().filter(|c| !c.is_control()).collect()
}

/// User ID for the requested content, generating one when it is blank.
pub fn choose_user_id(requested: &str) -> String {
    let cleaned = sanitize_user_id(requested);
    if cleaned.trim().is_empty() {
        random_user_id()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_id_is_word_pair_and_three_digits() {
        for _ in 0..50 {
            let id = random_user_id();
            let adjective = ADJECTIVES.iter().find(|a| id.starts_with(*a)).expect("adjective prefix");
            let rest = &id[adjective.len()..];
            let noun = NOUNS.iter().find(|n| rest.starts_with(*n)).expect("noun");
            let digits = &rest[noun.len()..];
            assert_eq!(digits.len(), 3);
            let n: u32 = digits.parse().unwrap();
            assert!((100..1000).contains(&n));
        }
    }

    #[test]
    fn color_comes_from_palette() {
        assert_eq!(PALETTE.len(), 30);
        for _ in 0..20 {
            assert!(PALETTE.contains(&random_color().as_str()));
        }
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_user_id("  ali\r\nce\t "), "alice");
        assert_eq!(sanitize_user_id("bob smith"), "bob smith");
    }

    #[test]
    fn blank_request_generates_identity() {
        assert_eq!(choose_user_id(" alice "), "alice");
        assert!(!choose_user_id("   ").is_empty());
        assert!(!choose_user_id("\r\n").is_empty());
    }
}
