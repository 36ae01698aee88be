// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Recording name generation.
//!
//! Recordings get memorable Adjective+Noun names ("BrightWave") instead of
//! timestamps; the device has no clock worth trusting.

use rand::seq::SliceRandom;

const ADJECTIVES: [&str; 50] = [
    "Bright", "Dark", "Swift", "Deep", "Wild", "Cool", "Warm", "Bold", "Calm", "Fast", "Slow",
    "High", "Low", "Grand", "Tiny", "Pure", "Rare", "True", "Fair", "Fine", "Sharp", "Soft",
    "Hard", "Clear", "Loud", "Quiet", "Smooth", "Rough", "Gentle", "Fierce", "Brave", "Noble",
    "Keen", "Wise", "Quick", "Light", "Heavy", "Fresh", "Crisp", "Dense", "Thin", "Thick", "Wide",
    "Narrow", "Tall", "Short", "Long", "Stark", "Vivid", "Pale",
];

const NOUNS: [&str; 50] = [
    "Wave", "Storm", "Wind", "Fire", "Water", "Earth", "Stone", "Iron", "Steel", "Cloud", "Sky",
    "Sun", "Moon", "Star", "Light", "Shadow", "Peak", "Valley", "River", "Lake", "Ocean", "Sea",
    "Forest", "Tree", "Leaf", "Root", "Branch", "Bird", "Wolf", "Bear", "Eagle", "Hawk", "Raven",
    "Fox", "Lion", "Tiger", "Dragon", "Flame", "Blaze", "Spark", "Frost", "Ice", "Snow",
    "Thunder", "Rain", "Mist", "Dawn", "Dusk", "Night", "Day",
];

/// Generates random recording names.
#[derive(Default)]
pub struct NameGenerator;

impl NameGenerator {
    pub fn new() -> NameGenerator {
        NameGenerator
    }

    /// Generates a random Adjective+Noun name.
    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let adjective = ADJECTIVES
            .choose(&mut rng)
            .copied()
            .unwrap_or("Plain");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("Sound");
        format!("{}{}", adjective, noun)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names_come_from_the_word_tables() {
        let generator = NameGenerator::new();
        for _ in 0..100 {
            let name = generator.generate();
            assert!(ADJECTIVES.iter().any(|adj| name.starts_with(adj)));
            assert!(NOUNS.iter().any(|noun| name.ends_with(noun)));
            assert!(name.len() >= 6);
        }
    }
}
