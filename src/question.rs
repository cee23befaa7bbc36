//! Conversion questions and candidate answers
//!
//! A question is a conversion with a concrete input value plus seven candidate
//! outputs. Six are distractors built from the family's multiplier set, one is
//! the true converted value.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::CANDIDATE_COUNT;
use crate::units::{Conversion, ConversionTemplate};
use crate::{approx_eq, round_to_places};

/// Decimal places kept on every generated value
pub const VALUE_PLACES: u32 = 3;
/// Smallest input value a question can ask about
pub const MIN_INPUT: f64 = 0.001;

/// Largest input value for a difficulty level (step function, capped at 100)
pub fn difficulty_max(difficulty: u8) -> f64 {
    match difficulty {
        0 | 1 => 10.0,
        2 => 20.0,
        3 => 35.0,
        4 => 50.0,
        5 => 75.0,
        _ => 100.0,
    }
}

/// One answer option shown to the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub value: f64,
    pub multiplier: f64,
    /// Set on exactly one candidate per question
    pub correct: bool,
}

/// Input rendered as a fraction (e.g. 0.25 -> 1/4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    /// Decompose a value in (0, 1) using its decimal-place count, reduced
    pub fn from_decimal(value: f64) -> Option<Self> {
        if value <= 0.0 || value >= 1.0 {
            return None;
        }
        let places = decimal_places(value);
        let denominator = 10u64.pow(places);
        let numerator = (value * denominator as f64).round() as u64;
        if numerator == 0 {
            return None;
        }
        let divisor = gcd(numerator, denominator);
        Some(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Number of significant decimal places (at most [`VALUE_PLACES`])
fn decimal_places(value: f64) -> u32 {
    (0..VALUE_PLACES)
        .find(|&places| {
            let scaled = value * 10f64.powi(places as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(VALUE_PLACES)
}

/// Generation switches that come from player settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    /// Force whole-number inputs for every family
    pub no_decimals: bool,
    /// Allow metric inputs below 1 to be shown as fractions
    pub fraction_questions: bool,
}

/// A generated question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub conversion: Conversion,
    pub candidates: [Candidate; CANDIDATE_COUNT],
    pub answer_slot: usize,
    /// Present when the input should be displayed as a fraction
    pub fraction: Option<Fraction>,
}

impl Question {
    /// The true converted value
    pub fn answer(&self) -> f64 {
        self.candidates[self.answer_slot].value
    }

    pub fn is_correct(&self, value: f64) -> bool {
        approx_eq(value, self.answer())
    }

    /// Question text, e.g. `"3 ft = ? in"` or `"1/4 L = ? mL"`
    pub fn prompt(&self) -> String {
        let conversion = &self.conversion;
        let input = match self.fraction {
            Some(f) => format!("{}/{}", f.numerator, f.denominator),
            None => format_value(conversion.input),
        };
        format!(
            "{} {} = ? {}",
            input,
            conversion.from.abbreviation(),
            conversion.to.abbreviation()
        )
    }

    /// Candidate label, e.g. `"36 in"`
    pub fn candidate_label(&self, slot: usize) -> Option<String> {
        self.candidates
            .get(slot)
            .map(|c| format!("{} {}", format_value(c.value), self.conversion.to.abbreviation()))
    }
}

/// Format a value with at most three decimals and no trailing zeros
pub fn format_value(value: f64) -> String {
    let text = format!("{:.3}", round_to_places(value, VALUE_PLACES));
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Draw the input value for a question
pub fn draw_input<R: Rng + ?Sized>(
    template: &ConversionTemplate,
    difficulty: u8,
    options: &QuestionOptions,
    rng: &mut R,
) -> f64 {
    let max = difficulty_max(difficulty);
    let input = round_to_places(rng.random_range(MIN_INPUT..=max), VALUE_PLACES);
    if options.no_decimals || !template.family().allows_decimals() {
        input.ceil()
    } else {
        input
    }
}

/// Generate a question from a catalog template
pub fn generate<R: Rng + ?Sized>(
    template: &ConversionTemplate,
    difficulty: u8,
    options: &QuestionOptions,
    rng: &mut R,
) -> Question {
    let input = draw_input(template, difficulty, options, rng);
    let conversion = template.instantiate(input);
    let mut question = build_candidates(conversion, rng);

    if options.fraction_questions
        && conversion.family.is_metric()
        && input > 0.0
        && input < 1.0
        && rng.random_bool(0.5)
    {
        question.fraction = Fraction::from_decimal(input);
    }
    question
}

/// Build the seven candidates for a conversion with a fixed input
pub fn build_candidates<R: Rng + ?Sized>(conversion: Conversion, rng: &mut R) -> Question {
    let input = conversion.input;
    let truth = conversion.output();
    let true_multiplier = if input == 0.0 { 1.0 } else { truth / input };
    let answer = Candidate {
        value: truth,
        multiplier: true_multiplier,
        correct: true,
    };

    let multipliers = conversion.family.distractor_multipliers();
    let mut candidates = [Candidate {
        value: 0.0,
        multiplier: 0.0,
        correct: false,
    }; CANDIDATE_COUNT];
    for (slot, &m) in candidates.iter_mut().zip(multipliers.iter()) {
        slot.value = round_to_places(input * m, VALUE_PLACES);
        slot.multiplier = m;
    }

    // Reuse a naturally matching slot so the true value replaces its rounded twin
    let answer_slot = candidates
        .iter()
        .position(|c| approx_eq(c.value, truth))
        .unwrap_or_else(|| rng.random_range(0..CANDIDATE_COUNT));
    candidates[answer_slot] = answer;

    // Tiny inputs can round several distractors onto the answer; push them away
    for slot in 0..CANDIDATE_COUNT {
        if slot == answer_slot {
            continue;
        }
        let mut nudge = 2.0;
        while approx_eq(candidates[slot].value, truth) || duplicates(&candidates, slot) {
            let base = if truth == 0.0 { 1.0 } else { truth };
            candidates[slot].value = round_to_places(base * nudge, VALUE_PLACES) + slot as f64;
            candidates[slot].multiplier = if input == 0.0 {
                1.0
            } else {
                candidates[slot].value / input
            };
            nudge += 1.0;
        }
    }

    Question {
        conversion,
        candidates,
        answer_slot,
        fraction: None,
    }
}

/// Whether `slot` repeats the value of an earlier slot
fn duplicates(candidates: &[Candidate; CANDIDATE_COUNT], slot: usize) -> bool {
    candidates[..slot]
        .iter()
        .any(|c| approx_eq(c.value, candidates[slot].value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{CATALOG, Unit};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn correct_count(q: &Question) -> usize {
        q.candidates
            .iter()
            .filter(|c| approx_eq(c.value, q.conversion.output()))
            .count()
    }

    #[test]
    fn test_difficulty_max_is_monotonic_and_capped() {
        let mut last = 0.0;
        for d in 1..=9 {
            let max = difficulty_max(d);
            assert!(max >= last);
            last = max;
        }
        assert_eq!(difficulty_max(1), 10.0);
        assert_eq!(difficulty_max(6), 100.0);
        assert_eq!(difficulty_max(9), 100.0);
    }

    #[test]
    fn test_natural_match_is_replaced_exactly() {
        // 2 ft -> 24 in: the x12 distractor slot already equals the answer
        let conversion = ConversionTemplate::new(Unit::Foot, Unit::Inch).instantiate(2.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let q = build_candidates(conversion, &mut rng);
        assert_eq!(q.answer_slot, 2);
        assert_eq!(q.answer(), 24.0);
        assert!(q.candidates[2].correct);
        assert_eq!(q.candidates[2].multiplier, 12.0);
        assert_eq!(correct_count(&q), 1);
    }

    #[test]
    fn test_missing_answer_is_forced_into_a_slot() {
        // 24 in -> 2 ft: no distractor multiplier produces 2
        let conversion = ConversionTemplate::new(Unit::Inch, Unit::Foot).instantiate(24.0);
        let mut rng = Pcg32::seed_from_u64(7);
        let q = build_candidates(conversion, &mut rng);
        assert!(approx_eq(q.answer(), 2.0));
        assert_eq!(q.candidates.iter().filter(|c| c.correct).count(), 1);
        assert_eq!(correct_count(&q), 1);
    }

    #[test]
    fn test_zero_input_multiplier_is_one() {
        let conversion = ConversionTemplate::new(Unit::Meter, Unit::Centimeter).instantiate(0.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let q = build_candidates(conversion, &mut rng);
        assert_eq!(q.candidates[q.answer_slot].multiplier, 1.0);
        assert_eq!(correct_count(&q), 1);
    }

    #[test]
    fn test_imperial_inputs_are_whole() {
        let template = ConversionTemplate::new(Unit::Yard, Unit::Foot);
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let input = draw_input(&template, 9, &QuestionOptions::default(), &mut rng);
            assert_eq!(input.fract(), 0.0);
            assert!((1.0..=100.0).contains(&input));
        }
    }

    #[test]
    fn test_no_decimals_flag_applies_to_metric() {
        let template = ConversionTemplate::new(Unit::Meter, Unit::Centimeter);
        let options = QuestionOptions {
            no_decimals: true,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(draw_input(&template, 3, &options, &mut rng).fract(), 0.0);
        }
    }

    #[test]
    fn test_fraction_decomposition() {
        assert_eq!(
            Fraction::from_decimal(0.25),
            Some(Fraction {
                numerator: 1,
                denominator: 4
            })
        );
        assert_eq!(
            Fraction::from_decimal(0.5),
            Some(Fraction {
                numerator: 1,
                denominator: 2
            })
        );
        assert_eq!(
            Fraction::from_decimal(0.123),
            Some(Fraction {
                numerator: 123,
                denominator: 1000
            })
        );
        assert_eq!(Fraction::from_decimal(1.5), None);
        assert_eq!(Fraction::from_decimal(0.0), None);
    }

    #[test]
    fn test_prompt_and_labels() {
        let conversion = ConversionTemplate::new(Unit::Foot, Unit::Inch).instantiate(3.0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut q = build_candidates(conversion, &mut rng);
        assert_eq!(q.prompt(), "3 ft = ? in");
        assert_eq!(q.candidate_label(q.answer_slot).as_deref(), Some("36 in"));
        assert_eq!(q.candidate_label(CANDIDATE_COUNT), None);

        q.fraction = Some(Fraction {
            numerator: 1,
            denominator: 4,
        });
        assert_eq!(q.prompt(), "1/4 ft = ? in");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(1.0 / 12.0), "0.083");
        assert_eq!(format_value(0.0), "0");
    }

    proptest! {
        #[test]
        fn prop_exactly_one_correct_candidate(
            seed in any::<u64>(),
            template_idx in 0..CATALOG.len(),
            difficulty in 1u8..=9,
            no_decimals in any::<bool>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let options = QuestionOptions { no_decimals, fraction_questions: true };
            let q = generate(&CATALOG[template_idx], difficulty, &options, &mut rng);
            prop_assert_eq!(correct_count(&q), 1);
            prop_assert_eq!(q.candidates.iter().filter(|c| c.correct).count(), 1);
            prop_assert!(q.candidates[q.answer_slot].correct);
            prop_assert!(q.conversion.input >= MIN_INPUT);
            prop_assert!(q.conversion.input <= difficulty_max(difficulty));
        }
    }
}
