//! Vehicle-type composition that always sums to 100 %.
//!
//! A [`VehicleComposition`] is an ordered list of `(vehicle type, percent)`
//! shares. The [`CompositionNormalizer`] owns one and exposes a single
//! mutator, [`CompositionNormalizer::set_value`], which edits one share and
//! redistributes the remainder over the other types:
//!
//! 1. Clamp the new value to `[0, 100]`.
//! 2. `remaining = 100 - new_value`.
//! 3. If the other shares sum to more than zero, each becomes
//!    `round(share / others_total * remaining)`, preserving relative shares.
//! 4. Otherwise `remaining` is split evenly over the other types.
//! 5. The rounding drift is assigned to the largest other share (earliest
//!    type on ties), so the total is exactly 100 after every edit.

use std::collections::{BTreeMap, HashSet};

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Totals within this distance of 100 are accepted without rescaling.
pub const SUM_TOLERANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
// VehicleComposition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct VehicleShare {
    pub vehicle: String,
    pub percent: f32,
}

/// Accepts either `[{"vehicle": "car", "percent": 25}, ...]` (order kept) or
/// `{"car": 25, ...}` (ordered by name).
#[derive(Deserialize)]
#[serde(untagged)]
enum CompositionRepr {
    List(Vec<VehicleShare>),
    Map(BTreeMap<String, f32>),
}

impl TryFrom<CompositionRepr> for VehicleComposition {
    type Error = AnalysisError;

    fn try_from(repr: CompositionRepr) -> Result<Self, Self::Error> {
        let shares: Vec<(String, f32)> = match repr {
            CompositionRepr::List(list) => {
                list.into_iter().map(|s| (s.vehicle, s.percent)).collect()
            }
            CompositionRepr::Map(map) => map.into_iter().collect(),
        };
        VehicleComposition::new(shares)
    }
}

/// Percentages per vehicle type, summing to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(try_from = "CompositionRepr", into = "Vec<VehicleShare>")]
pub struct VehicleComposition {
    shares: Vec<VehicleShare>,
}

impl From<VehicleComposition> for Vec<VehicleShare> {
    fn from(composition: VehicleComposition) -> Self {
        composition.shares
    }
}

impl Default for VehicleComposition {
    fn default() -> Self {
        Self {
            shares: [
                ("car", 25.0),
                ("two_wheeler", 45.0),
                ("bus", 8.0),
                ("truck", 12.0),
                ("auto_rickshaw", 10.0),
            ]
            .into_iter()
            .map(|(vehicle, percent)| VehicleShare {
                vehicle: vehicle.to_string(),
                percent,
            })
            .collect(),
        }
    }
}

impl VehicleComposition {
    /// Validate and normalize a composition.
    ///
    /// Rejects empty input, blank or duplicate type names, negative or
    /// non-finite values and an all-zero total. A total other than 100 is
    /// rescaled proportionally.
    pub fn new<S: Into<String>>(
        shares: impl IntoIterator<Item = (S, f32)>,
    ) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (vehicle, percent) in shares {
            let vehicle = vehicle.into();
            if vehicle.trim().is_empty() {
                return Err(AnalysisError::InvalidComposition(
                    "vehicle type name is empty".into(),
                ));
            }
            if !seen.insert(vehicle.clone()) {
                return Err(AnalysisError::InvalidComposition(format!(
                    "duplicate vehicle type '{vehicle}'"
                )));
            }
            if !percent.is_finite() || percent < 0.0 {
                return Err(AnalysisError::InvalidComposition(format!(
                    "share of '{vehicle}' must be a non-negative number, got {percent}"
                )));
            }
            out.push(VehicleShare { vehicle, percent });
        }
        if out.is_empty() {
            return Err(AnalysisError::InvalidComposition(
                "composition has no vehicle types".into(),
            ));
        }

        let total: f32 = out.iter().map(|s| s.percent).sum();
        if total <= 0.0 {
            return Err(AnalysisError::InvalidComposition(
                "all shares are zero".into(),
            ));
        }
        if (total - 100.0).abs() > SUM_TOLERANCE {
            for share in &mut out {
                share.percent = share.percent / total * 100.0;
            }
        }
        Ok(Self { shares: out })
    }

    pub fn shares(&self) -> &[VehicleShare] {
        &self.shares
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.shares.iter().map(|s| s.vehicle.as_str())
    }

    pub fn get(&self, vehicle: &str) -> Option<f32> {
        self.shares
            .iter()
            .find(|s| s.vehicle == vehicle)
            .map(|s| s.percent)
    }

    /// Fraction (0..=1) of the given type.
    pub fn fraction(&self, vehicle: &str) -> f32 {
        self.get(vehicle).unwrap_or(0.0) / 100.0
    }

    pub fn total(&self) -> f32 {
        self.shares.iter().map(|s| s.percent).sum()
    }

    /// Whole-percent view for display. Sums to exactly 100.
    pub fn whole_percent(&self) -> Vec<(String, u32)> {
        let mut values: Vec<f32> = self.shares.iter().map(|s| s.percent.round()).collect();
        settle_remainder(&mut values, None);
        self.shares
            .iter()
            .zip(values)
            .map(|(s, v)| (s.vehicle.clone(), v.round().max(0.0) as u32))
            .collect()
    }
}

/// Move `100 - sum(values)` onto the largest values (earliest on ties),
/// never pushing a value below zero. `skip` is left untouched.
fn settle_remainder(values: &mut [f32], skip: Option<usize>) {
    let mut drift = 100.0 - values.iter().sum::<f32>();
    if drift.abs() <= f32::EPSILON * 100.0 {
        return;
    }

    let mut order: Vec<usize> = (0..values.len()).filter(|&i| Some(i) != skip).collect();
    // Stable sort keeps key order among equal values.
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    for i in order {
        let adjustment = drift.max(-values[i]);
        values[i] += adjustment;
        drift -= adjustment;
        if drift.abs() <= f32::EPSILON * 100.0 {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// CompositionNormalizer
// ---------------------------------------------------------------------------

/// Holds a composition and keeps it normalized under single-field edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionNormalizer {
    composition: VehicleComposition,
}

impl CompositionNormalizer {
    pub fn new(composition: VehicleComposition) -> Self {
        Self { composition }
    }

    pub fn composition(&self) -> &VehicleComposition {
        &self.composition
    }

    pub fn into_composition(self) -> VehicleComposition {
        self.composition
    }

    /// Set one vehicle type's share and rebalance the others.
    ///
    /// Unknown types and non-finite values are rejected with
    /// `InvalidComposition` and leave the state unchanged. Out-of-range
    /// values are clamped. A single-type composition always stays at 100.
    pub fn set_value(
        &mut self,
        vehicle: &str,
        new_value: f32,
    ) -> Result<&VehicleComposition, AnalysisError> {
        if !new_value.is_finite() {
            return Err(AnalysisError::InvalidComposition(format!(
                "share of '{vehicle}' must be finite, got {new_value}"
            )));
        }
        let Some(edited) = self
            .composition
            .shares
            .iter()
            .position(|s| s.vehicle == vehicle)
        else {
            return Err(AnalysisError::InvalidComposition(format!(
                "unknown vehicle type '{vehicle}'"
            )));
        };

        let new_value = new_value.clamp(0.0, 100.0);
        let remaining = 100.0 - new_value;
        let mut values: Vec<f32> = self.composition.shares.iter().map(|s| s.percent).collect();
        let other_count = values.len() - 1;

        if other_count == 0 {
            values[edited] = 100.0;
        } else {
            let others_total: f32 = values
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != edited)
                .map(|(_, v)| v)
                .sum();
            for (i, value) in values.iter_mut().enumerate() {
                if i == edited {
                    *value = new_value;
                } else if others_total > 0.0 {
                    *value = (*value / others_total * remaining).round();
                } else {
                    *value = (remaining / other_count as f32).round();
                }
            }
            settle_remainder(&mut values, Some(edited));
        }

        for (share, value) in self.composition.shares.iter_mut().zip(values) {
            share.percent = value;
        }
        Ok(&self.composition)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn four_way(values: [f32; 4]) -> CompositionNormalizer {
        let comp = VehicleComposition::new([
            ("car", values[0]),
            ("two_wheeler", values[1]),
            ("truck", values[2]),
            ("bus", values[3]),
        ])
        .unwrap();
        CompositionNormalizer::new(comp)
    }

    #[test]
    fn test_default_sums_to_100() {
        let comp = VehicleComposition::default();
        assert!((comp.total() - 100.0).abs() < SUM_TOLERANCE);
        assert_eq!(comp.get("two_wheeler"), Some(45.0));
    }

    #[test]
    fn test_preserves_relative_shares() {
        let mut n = four_way([40.0, 30.0, 20.0, 10.0]);
        let comp = n.set_value("car", 70.0).unwrap();
        // Others held 30:20:10 of 60; now share 30.
        assert_eq!(comp.get("car"), Some(70.0));
        assert_eq!(comp.get("two_wheeler"), Some(15.0));
        assert_eq!(comp.get("truck"), Some(10.0));
        assert_eq!(comp.get("bus"), Some(5.0));
    }

    #[test]
    fn test_zero_others_fall_back_to_even_split() {
        let mut n = four_way([100.0, 0.0, 0.0, 0.0]);
        let comp = n.set_value("car", 40.0).unwrap();
        assert_eq!(comp.get("two_wheeler"), Some(20.0));
        assert_eq!(comp.get("truck"), Some(20.0));
        assert_eq!(comp.get("bus"), Some(20.0));
    }

    #[test]
    fn test_even_split_rounding_is_settled() {
        let mut n = four_way([100.0, 0.0, 0.0, 0.0]);
        let comp = n.set_value("car", 90.0).unwrap();
        // 10 over three types: 3.33 rounds to 3 each, drift of 1 goes to the
        // earliest of the tied largest.
        assert_eq!(comp.get("two_wheeler"), Some(4.0));
        assert_eq!(comp.get("truck"), Some(3.0));
        assert_eq!(comp.get("bus"), Some(3.0));
        assert!((comp.total() - 100.0).abs() < SUM_TOLERANCE);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let mut n = four_way([25.0, 25.0, 25.0, 25.0]);
        let comp = n.set_value("truck", 140.0).unwrap();
        assert_eq!(comp.get("truck"), Some(100.0));
        assert_eq!(comp.get("car"), Some(0.0));

        let comp = n.set_value("truck", -20.0).unwrap();
        assert_eq!(comp.get("truck"), Some(0.0));
        assert!((comp.total() - 100.0).abs() < SUM_TOLERANCE);
    }

    #[test]
    fn test_rejections_keep_prior_state() {
        let mut n = four_way([40.0, 30.0, 20.0, 10.0]);
        let before = n.clone();
        assert!(matches!(
            n.set_value("tram", 10.0),
            Err(AnalysisError::InvalidComposition(_))
        ));
        assert!(matches!(
            n.set_value("car", f32::NAN),
            Err(AnalysisError::InvalidComposition(_))
        ));
        assert_eq!(n, before);
    }

    #[test]
    fn test_single_type_stays_full() {
        let mut n = CompositionNormalizer::new(VehicleComposition::new([("car", 100.0)]).unwrap());
        assert_eq!(n.set_value("car", 30.0).unwrap().get("car"), Some(100.0));
    }

    #[test]
    fn test_random_edits_always_sum_to_100() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut n = CompositionNormalizer::default();
        let keys: Vec<String> = n.composition().keys().map(str::to_string).collect();
        for _ in 0..2000 {
            let key = &keys[rng.gen_range(0..keys.len())];
            let value = rng.gen_range(-20.0..120.0_f32);
            let comp = n.set_value(key, value).unwrap();
            let total = comp.total();
            assert!((99.0..=101.0).contains(&total), "total {total}");
            assert!((total - 100.0).abs() < 1e-3, "total {total}");
            assert!(comp.shares().iter().all(|s| s.percent >= 0.0));
        }
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(VehicleComposition::new([("car", -1.0), ("bus", 101.0)]).is_err());
        assert!(VehicleComposition::new([("car", 0.0), ("bus", 0.0)]).is_err());
        assert!(VehicleComposition::new([("car", 50.0), ("car", 50.0)]).is_err());
        assert!(VehicleComposition::new([("", 100.0)]).is_err());
        assert!(VehicleComposition::new(Vec::<(String, f32)>::new()).is_err());
        assert!(VehicleComposition::new([("car", f32::INFINITY)]).is_err());
    }

    #[test]
    fn test_new_rescales_total() {
        let comp = VehicleComposition::new([("car", 1.0), ("bus", 3.0)]).unwrap();
        assert!((comp.get("car").unwrap() - 25.0).abs() < 1e-4);
        assert!((comp.get("bus").unwrap() - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_whole_percent_view() {
        let comp =
            VehicleComposition::new([("car", 33.4), ("bus", 33.3), ("truck", 33.3)]).unwrap();
        let whole = comp.whole_percent();
        let sum: u32 = whole.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 100);
        assert_eq!(whole[0], ("car".to_string(), 34));
    }

    #[test]
    fn test_json_keeps_order() {
        let comp = VehicleComposition::default();
        let json = serde_json::to_string(&comp).unwrap();
        let back: VehicleComposition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comp);
    }

    #[test]
    fn test_deserialize_list_and_map() {
        let list: VehicleComposition =
            serde_json::from_str(r#"[{"vehicle":"car","percent":60},{"vehicle":"bus","percent":40}]"#)
                .unwrap();
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["car", "bus"]);

        let map: VehicleComposition = serde_json::from_str(r#"{"car": 30, "bus": 10}"#).unwrap();
        assert!((map.get("car").unwrap() - 75.0).abs() < 1e-4);

        assert!(serde_json::from_str::<VehicleComposition>(r#"{"car": -5}"#).is_err());
    }
}
