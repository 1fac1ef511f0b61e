//! Experience and leveling.
//!
//! Completing a task grants experience by difficulty. Experience is kept per
//! level: whenever it reaches the requirement of the current level, the
//! requirement is subtracted and the level goes up, repeatedly, so one large
//! gain can jump several levels.
//!
//! ## Curves
//!
//! The canonical curve is linear: level `L` requires `base * L` experience.
//! The exponential curve `base * growth^(L-1)` is still accepted from
//! configuration for profiles created under it, but is deprecated and no
//! longer the default. Both are monotonically non-decreasing in the level.

use serde::{Deserialize, Serialize};

use crate::config::ExperienceConfig;
use crate::error::ConfigError;
use crate::profile::Profile;
use crate::task::Difficulty;

/// Experience required to finish a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExperienceCurve {
    /// `base * level`
    Linear {
        #[serde(default = "default_base")]
        base: u32,
    },
    /// `base * growth^(level - 1)`, rounded. Deprecated.
    Exponential {
        #[serde(default = "default_base")]
        base: u32,
        #[serde(default = "default_growth")]
        growth: f64,
    },
}

fn default_base() -> u32 {
    100
}
fn default_growth() -> f64 {
    1.5
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        ExperienceCurve::Linear {
            base: default_base(),
        }
    }
}

impl ExperienceCurve {
    /// Experience needed to leave `level`. Always at least 1.
    pub fn required(&self, level: u32) -> u32 {
        let level = level.max(1);
        let required = match self {
            ExperienceCurve::Linear { base } => base.saturating_mul(level),
            ExperienceCurve::Exponential { base, growth } => {
                let exponent = i32::try_from(level - 1).unwrap_or(i32::MAX);
                let value = f64::from(*base) * growth.powi(exponent);
                if value.is_finite() && value < f64::from(u32::MAX) {
                    value.round() as u32
                } else {
                    u32::MAX
                }
            }
        };
        required.max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ExperienceCurve::Linear { base } | ExperienceCurve::Exponential { base, .. }
                if *base == 0 =>
            {
                Err(ConfigError::InvalidValue {
                    key: "experience.curve.base".into(),
                    message: "base must be positive".into(),
                })
            }
            ExperienceCurve::Exponential { growth, .. } if !(growth.is_finite() && *growth >= 1.0) => {
                Err(ConfigError::InvalidValue {
                    key: "experience.curve.growth".into(),
                    message: format!("growth must be a finite number >= 1, got {growth}"),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Result of applying an experience gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    pub level: u32,
    pub exp: u32,
    pub exp_gained: u32,
    pub levels_gained: u32,
}

impl Progression {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add `gain` to `(level, exp)` and resolve every level-up it causes.
pub fn apply_gain(level: u32, exp: u32, gain: u32, curve: &ExperienceCurve) -> Progression {
    let start_level = level.max(1);
    let mut level = start_level;
    let mut pool = u64::from(exp) + u64::from(gain);

    loop {
        let required = u64::from(curve.required(level));
        if pool < required || level == u32::MAX {
            break;
        }
        pool -= required;
        level += 1;
    }

    Progression {
        level,
        // pool < required(level) <= u32::MAX unless the level is saturated
        exp: u32::try_from(pool).unwrap_or(u32::MAX),
        exp_gained: gain,
        levels_gained: level - start_level,
    }
}

/// Experience gain for completing a task of `difficulty` on `profile`.
pub fn apply_completion(
    profile: &Profile,
    difficulty: Difficulty,
    config: &ExperienceConfig,
) -> Progression {
    let gain = config.gain(difficulty);
    let progression = apply_gain(profile.level, profile.exp, gain, &config.curve);
    tracing::debug!(
        profile = %profile.id,
        %difficulty,
        gain,
        level = progression.level,
        exp = progression.exp,
        "experience applied"
    );
    progression
}

/// Bring a loaded profile back under the curve invariant.
///
/// Needed after the curve configuration changes, or for records written by
/// older clients that only resolved one level-up per completion.
pub fn normalize(profile: &Profile, curve: &ExperienceCurve) -> Profile {
    let progression = apply_gain(profile.level, profile.exp, 0, curve);
    let mut normalized = profile.clone();
    normalized.level = progression.level;
    normalized.exp = progression.exp;
    normalized
}

/// Progress toward the next level, for the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpProgress {
    pub level: u32,
    pub exp: u32,
    pub required: u32,
    /// `exp / required`, in `[0, 1)`.
    pub fraction: f64,
}

pub fn progress(profile: &Profile, curve: &ExperienceCurve) -> ExpProgress {
    let required = curve.required(profile.level);
    ExpProgress {
        level: profile.level,
        exp: profile.exp,
        required,
        fraction: f64::from(profile.exp) / f64::from(required),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::AvatarConfig;
    use proptest::prelude::*;

    fn linear() -> ExperienceCurve {
        ExperienceCurve::default()
    }

    fn profile(level: u32, exp: u32) -> Profile {
        let mut p = Profile::new(
            "uid",
            "tester",
            AvatarConfig {
                body_color: "#ff6b6b".into(),
                eyes: 0,
                mouth: 0,
            },
        );
        p.level = level;
        p.exp = exp;
        p
    }

    #[test]
    fn linear_requirements() {
        let curve = linear();
        assert_eq!(curve.required(1), 100);
        assert_eq!(curve.required(2), 200);
        assert_eq!(curve.required(10), 1000);
        assert_eq!(curve.required(0), 100);
    }

    #[test]
    fn exponential_requirements() {
        let curve = ExperienceCurve::Exponential {
            base: 100,
            growth: 1.5,
        };
        assert_eq!(curve.required(1), 100);
        assert_eq!(curve.required(2), 150);
        assert_eq!(curve.required(3), 225);
        assert_eq!(curve.required(200), u32::MAX);
    }

    #[test]
    fn gain_below_threshold_keeps_level() {
        let p = apply_gain(1, 50, 40, &linear());
        assert_eq!(p, Progression { level: 1, exp: 90, exp_gained: 40, levels_gained: 0 });
        assert!(!p.leveled_up());
    }

    #[test]
    fn exact_threshold_levels_up_with_zero_exp() {
        let p = apply_gain(1, 90, 10, &linear());
        assert_eq!((p.level, p.exp, p.levels_gained), (2, 0, 1));
    }

    #[test]
    fn large_gain_jumps_multiple_levels() {
        // L1 needs 100, L2 needs 200.
        let p = apply_gain(1, 0, 250, &linear());
        assert_eq!((p.level, p.exp), (2, 150));

        let p = apply_gain(1, 0, 350, &linear());
        assert_eq!((p.level, p.exp, p.levels_gained), (3, 50, 2));
    }

    #[test]
    fn completion_uses_configured_gain() {
        let config = ExperienceConfig::default();
        let p = apply_completion(&profile(1, 70), Difficulty::Hard, &config);
        assert_eq!((p.level, p.exp, p.exp_gained), (2, 10, 40));

        let p = apply_completion(&profile(3, 0), Difficulty::Easy, &config);
        assert_eq!((p.level, p.exp, p.exp_gained), (3, 10, 10));
    }

    #[test]
    fn normalize_resolves_overflowing_exp() {
        let fixed = normalize(&profile(1, 320), &linear());
        assert_eq!((fixed.level, fixed.exp), (3, 20));

        let fixed = normalize(&profile(0, 0), &linear());
        assert_eq!(fixed.level, 1);
    }

    #[test]
    fn progress_fraction() {
        let p = progress(&profile(2, 50), &linear());
        assert_eq!(p.required, 200);
        assert!((p.fraction - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn curve_validation() {
        assert!(linear().validate().is_ok());
        assert!(ExperienceCurve::Linear { base: 0 }.validate().is_err());
        assert!(ExperienceCurve::Exponential { base: 100, growth: 0.9 }
            .validate()
            .is_err());
        assert!(ExperienceCurve::Exponential { base: 100, growth: f64::NAN }
            .validate()
            .is_err());
    }

    fn arb_curve() -> impl Strategy<Value = ExperienceCurve> {
        prop_oneof![
            (1u32..500).prop_map(|base| ExperienceCurve::Linear { base }),
            (1u32..500, 1.0f64..2.0)
                .prop_map(|(base, growth)| ExperienceCurve::Exponential { base, growth }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn exp_stays_below_requirement(
            curve in arb_curve(),
            level in 1u32..60,
            seed in 0u32..10_000,
            gain in 0u32..100_000,
        ) {
            let exp = seed % curve.required(level);
            let p = apply_gain(level, exp, gain, &curve);
            prop_assert!(p.level >= level);
            prop_assert!(p.exp < curve.required(p.level));
        }

        #[test]
        fn experience_is_conserved(level in 1u32..40, exp in 0u32..100, gain in 0u32..50_000) {
            let curve = linear();
            let exp = exp % curve.required(level);
            let p = apply_gain(level, exp, gain, &curve);
            let spent: u64 = (level..p.level).map(|l| u64::from(curve.required(l))).sum();
            prop_assert_eq!(spent + u64::from(p.exp), u64::from(exp) + u64::from(gain));
        }

        #[test]
        fn requirement_is_monotonic(curve in arb_curve(), level in 1u32..300) {
            prop_assert!(curve.required(level + 1) >= curve.required(level));
        }
    }
}
