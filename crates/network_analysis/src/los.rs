//! Level of service of a network under a synthesized scenario.
//!
//! The mean scenario flow is compared with the mean adjusted capacity of the
//! network's segments. Breakpoints on the volume/capacity ratio:
//!
//! | Grade | V/C         | Condition                 |
//! |-------|-------------|---------------------------|
//! | A     | < 0.35      | free flow                 |
//! | B     | 0.35 - 0.55 | stable                    |
//! | C     | 0.55 - 0.77 | stable, restricted        |
//! | D     | 0.77 - 0.93 | approaching unstable      |
//! | E     | 0.93 - 1.00 | unstable                  |
//! | F     | >= 1.00     | forced flow / breakdown   |

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
#[repr(u8)]
pub enum LosGrade {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
}

/// Exclusive upper V/C bound of each grade below `F`.
const UPPER_BOUNDS: [(f32, LosGrade); 5] = [
    (0.35, LosGrade::A),
    (0.55, LosGrade::B),
    (0.77, LosGrade::C),
    (0.93, LosGrade::D),
    (1.00, LosGrade::E),
];

impl LosGrade {
    /// Grade a volume/capacity ratio. A NaN ratio grades as `F`.
    pub fn from_vc_ratio(vc: f32) -> Self {
        UPPER_BOUNDS
            .iter()
            .find(|(upper, _)| vc < *upper)
            .map_or(LosGrade::F, |&(_, grade)| grade)
    }

    /// Lowest V/C ratio that earns this grade.
    pub fn lower_bound(self) -> f32 {
        match self {
            LosGrade::A => 0.0,
            grade => UPPER_BOUNDS[grade as usize - 1].0,
        }
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    pub fn label(self) -> &'static str {
        match self {
            LosGrade::A => "Free flow",
            LosGrade::B => "Stable flow",
            LosGrade::C => "Restricted flow",
            LosGrade::D => "Approaching unstable",
            LosGrade::E => "Unstable flow",
            LosGrade::F => "Breakdown",
        }
    }
}

/// Grade `flow` (veh/h) against `capacity` (veh/h). `None` when there is no
/// usable capacity to compare against.
pub fn grade_flow(flow: f32, capacity: Option<f32>) -> Option<LosGrade> {
    let capacity = capacity.filter(|c| *c > 0.0 && c.is_finite())?;
    Some(LosGrade::from_vc_ratio(flow.max(0.0) / capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound_grades_itself() {
        let grades = [
            LosGrade::A,
            LosGrade::B,
            LosGrade::C,
            LosGrade::D,
            LosGrade::E,
            LosGrade::F,
        ];
        for grade in grades {
            assert_eq!(LosGrade::from_vc_ratio(grade.lower_bound()), grade);
        }
        assert_eq!(LosGrade::F.lower_bound(), 1.0);
    }

    #[test]
    fn test_breakpoints() {
        assert_eq!(LosGrade::from_vc_ratio(0.0), LosGrade::A);
        assert_eq!(LosGrade::from_vc_ratio(0.349), LosGrade::A);
        assert_eq!(LosGrade::from_vc_ratio(0.35), LosGrade::B);
        assert_eq!(LosGrade::from_vc_ratio(0.55), LosGrade::C);
        assert_eq!(LosGrade::from_vc_ratio(0.77), LosGrade::D);
        assert_eq!(LosGrade::from_vc_ratio(0.93), LosGrade::E);
        assert_eq!(LosGrade::from_vc_ratio(1.0), LosGrade::F);
        assert_eq!(LosGrade::from_vc_ratio(3.0), LosGrade::F);
        assert_eq!(LosGrade::from_vc_ratio(f32::NAN), LosGrade::F);
    }

    #[test]
    fn test_letters_follow_order() {
        let letters: String = [
            LosGrade::A,
            LosGrade::B,
            LosGrade::C,
            LosGrade::D,
            LosGrade::E,
            LosGrade::F,
        ]
        .iter()
        .map(|g| g.letter())
        .collect();
        assert_eq!(letters, "ABCDEF");
        assert!(LosGrade::A < LosGrade::F);
    }

    #[test]
    fn test_grade_flow() {
        assert_eq!(grade_flow(500.0, Some(1000.0)), Some(LosGrade::B));
        assert_eq!(grade_flow(1200.0, Some(1000.0)), Some(LosGrade::F));
        assert_eq!(grade_flow(100.0, None), None);
        assert_eq!(grade_flow(100.0, Some(0.0)), None);
    }
}
