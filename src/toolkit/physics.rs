//! Classical mechanics formulas with typed inputs

use super::{format_number, CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STANDARD_GRAVITY: f64 = 9.81;

fn default_gravity() -> f64 {
    STANDARD_GRAVITY
}

/// A formula and its operands, tagged by `formula`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum PhysicsInput {
    /// F = ma
    #[serde(alias = "f=ma", alias = "newton_second_law")]
    Force {
        #[serde(alias = "m")]
        mass: f64,
        #[serde(alias = "a")]
        acceleration: f64,
    },
    /// KE = ½mv²
    #[serde(alias = "ke", alias = "0.5mv2")]
    KineticEnergy {
        #[serde(alias = "m")]
        mass: f64,
        #[serde(alias = "v")]
        velocity: f64,
    },
    /// PE = mgh
    #[serde(alias = "pe", alias = "mgh")]
    PotentialEnergy {
        #[serde(alias = "m")]
        mass: f64,
        #[serde(alias = "h")]
        height: f64,
        #[serde(alias = "g", default = "default_gravity")]
        gravity: f64,
    },
}

impl PhysicsInput {
    pub const FORMULAS: &'static [&'static str] = &["force", "kinetic_energy", "potential_energy"];
}

/// An evaluated formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicsResult {
    pub input: PhysicsInput,
    pub value: f64,
}

pub fn calculate(input: PhysicsInput) -> CalcResult<PhysicsResult> {
    let (mass, value) = match input {
        PhysicsInput::Force { mass, acceleration } => {
            check_finite(&[("acceleration", acceleration)])?;
            (mass, mass * acceleration)
        }
        PhysicsInput::KineticEnergy { mass, velocity } => {
            check_finite(&[("velocity", velocity)])?;
            (mass, 0.5 * mass * velocity * velocity)
        }
        PhysicsInput::PotentialEnergy {
            mass,
            height,
            gravity,
        } => {
            check_finite(&[("height", height), ("gravity", gravity)])?;
            (mass, mass * gravity * height)
        }
    };

    check_finite(&[("mass", mass)])?;
    if mass < 0.0 {
        return Err(CalcError::domain(format!("Mass cannot be negative (got {mass})")));
    }
    if !value.is_finite() {
        return Err(CalcError::domain("Result is not a finite number"));
    }

    Ok(PhysicsResult { input, value })
}

fn check_finite(values: &[(&str, f64)]) -> CalcResult<()> {
    match values.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(CalcError::domain(format!("{name} must be finite (got {v})"))),
        None => Ok(()),
    }
}

impl fmt::Display for PhysicsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = format_number;
        let value = n(self.value);
        match self.input {
            PhysicsInput::Force { mass, acceleration } => write!(
                f,
                "Force = mass × acceleration = {} kg × {} m/s² = {value} N",
                n(mass),
                n(acceleration)
            ),
            PhysicsInput::KineticEnergy { mass, velocity } => write!(
                f,
                "Kinetic Energy = ½mv² = 0.5 × {} kg × ({} m/s)² = {value} J",
                n(mass),
                n(velocity)
            ),
            PhysicsInput::PotentialEnergy {
                mass,
                height,
                gravity,
            } => write!(
                f,
                "Potential Energy = mgh = {} kg × {} m/s² × {} m = {value} J",
                n(mass),
                n(gravity),
                n(height)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::CalcErrorKind;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_force() {
        let result = calculate(PhysicsInput::Force {
            mass: 10.0,
            acceleration: 9.8,
        })
        .unwrap();
        assert!(approx(result.value, 98.0));
        assert_eq!(
            result.to_string(),
            "Force = mass × acceleration = 10 kg × 9.8 m/s² = 98 N"
        );
    }

    #[test]
    fn test_kinetic_energy() {
        let result = calculate(PhysicsInput::KineticEnergy {
            mass: 2.0,
            velocity: 3.0,
        })
        .unwrap();
        assert!(approx(result.value, 9.0));
        assert_eq!(
            result.to_string(),
            "Kinetic Energy = ½mv² = 0.5 × 2 kg × (3 m/s)² = 9 J"
        );
    }

    #[test]
    fn test_potential_energy_default_gravity() {
        let input: PhysicsInput =
            serde_json::from_value(json!({"formula": "mgh", "m": 2.0, "h": 10.0})).unwrap();
        assert_eq!(
            input,
            PhysicsInput::PotentialEnergy {
                mass: 2.0,
                height: 10.0,
                gravity: STANDARD_GRAVITY
            }
        );
        let result = calculate(input).unwrap();
        assert!(approx(result.value, 196.2));
        assert!(result.to_string().contains("× 9.81 m/s² × 10 m"));
    }

    #[test]
    fn test_formula_aliases_deserialize() {
        let input: PhysicsInput =
            serde_json::from_value(json!({"formula": "f=ma", "mass": 1.0, "a": 2.0})).unwrap();
        assert!(matches!(input, PhysicsInput::Force { .. }));

        let input: PhysicsInput =
            serde_json::from_value(json!({"formula": "ke", "m": 1.0, "v": 2.0})).unwrap();
        assert!(matches!(input, PhysicsInput::KineticEnergy { .. }));
    }

    #[test]
    fn test_missing_operand_fails_to_deserialize() {
        let result: Result<PhysicsInput, _> =
            serde_json::from_value(json!({"formula": "force", "mass": 1.0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_mass_rejected() {
        let err = calculate(PhysicsInput::Force {
            mass: -1.0,
            acceleration: 1.0,
        })
        .unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Domain);
    }

    #[test]
    fn test_non_finite_operand_rejected() {
        let err = calculate(PhysicsInput::KineticEnergy {
            mass: 1.0,
            velocity: f64::INFINITY,
        })
        .unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Domain);
        assert!(err.message.starts_with("velocity"));
    }
}
