//! Tag-overlap similarity between a person's profile and a post.

use std::collections::HashSet;

/// Similarity of one candidate post against a person's skill set `S`
/// and interest set `I`, given the post's required-tag set `P`:
///
/// - `skill = |S ∩ P| / (√|S| · √|P|)`, 0 when either set is empty
/// - `interest = |I ∩ P| / (√|I| · √|P|)`, likewise
/// - `combined = (|S ∩ P| + |I ∩ P|) / (|S| + |I| + |P|)`, 0 when the
///   denominator is zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub skill: f64,
    pub interest: f64,
    pub combined: f64,
}

impl Similarity {
    pub fn compute(
        skills: &HashSet<&str>,
        interests: &HashSet<&str>,
        required: &HashSet<&str>,
    ) -> Self {
        let skill_overlap = skills.intersection(required).count();
        let interest_overlap = interests.intersection(required).count();

        let skill = cosine_part(skill_overlap, skills.len(), required.len());
        let interest = cosine_part(interest_overlap, interests.len(), required.len());

        let denominator = (skills.len() + interests.len() + required.len()) as f64;
        let combined = if denominator > 0.0 {
            (skill_overlap + interest_overlap) as f64 / denominator
        } else {
            0.0
        };

        Similarity {
            skill,
            interest,
            combined,
        }
    }
}

fn cosine_part(overlap: usize, a: usize, b: usize) -> f64 {
    if a * b > 0 {
        overlap as f64 / ((a as f64).sqrt() * (b as f64).sqrt())
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(items: &[&'a str]) -> HashSet<&'a str> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_reference_scenario() {
        // Skills {go, rust}; post A requires {go, python}; post B {rust}.
        let skills = set(&["go", "rust"]);
        let interests = set(&[]);

        let a = Similarity::compute(&skills, &interests, &set(&["go", "python"]));
        let b = Similarity::compute(&skills, &interests, &set(&["rust"]));

        assert!((a.skill - 0.5).abs() < 1e-9);
        assert!((b.skill - 1.0 / 2f64.sqrt()).abs() < 1e-9);
        // B must outrank A on the combined metric too.
        assert!(b.combined > a.combined);
    }

    #[test]
    fn test_empty_sets_are_zero() {
        let empty = set(&[]);
        let sim = Similarity::compute(&empty, &empty, &empty);
        assert_eq!(sim.skill, 0.0);
        assert_eq!(sim.interest, 0.0);
        assert_eq!(sim.combined, 0.0);

        let sim = Similarity::compute(&set(&["rust"]), &empty, &empty);
        assert_eq!(sim.combined, 0.0);
    }

    #[test]
    fn test_interest_contributes() {
        let sim = Similarity::compute(&set(&[]), &set(&["ml"]), &set(&["ml", "python"]));
        assert!((sim.interest - 1.0 / 2f64.sqrt()).abs() < 1e-9);
        assert!((sim.combined - 1.0 / 3.0).abs() < 1e-9);
    }
}
