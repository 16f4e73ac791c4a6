//! Solution chemistry: pH/pOH and molarity

use super::{format_number, CalcError, CalcResult};
use serde::Serialize;
use std::fmt;

const NEUTRAL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Acidic,
    Basic,
    Neutral,
}

impl Classification {
    fn from_ph(ph: f64) -> Self {
        if (ph - 7.0).abs() <= NEUTRAL_TOLERANCE {
            Classification::Neutral
        } else if ph < 7.0 {
            Classification::Acidic
        } else {
            Classification::Basic
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Classification::Acidic => "acidic",
            Classification::Basic => "basic",
            Classification::Neutral => "neutral",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhReport {
    pub concentration: f64,
    /// `concentration` is [H+] when true, [OH-] otherwise
    pub is_acid: bool,
    pub ph: f64,
    pub poh: f64,
    pub classification: Classification,
}

/// pH and pOH from a molar ion concentration
pub fn ph(concentration: f64, is_acid: bool) -> CalcResult<PhReport> {
    if !concentration.is_finite() || concentration <= 0.0 {
        return Err(CalcError::domain(format!(
            "Concentration must be a positive number (got {concentration})"
        )));
    }

    let log = -concentration.log10();
    let (ph, poh) = if is_acid {
        (log, 14.0 - log)
    } else {
        (14.0 - log, log)
    };

    Ok(PhReport {
        concentration,
        is_acid,
        ph,
        poh,
        classification: Classification::from_ph(ph),
    })
}

impl fmt::Display for PhReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = format_number(self.concentration);
        if self.is_acid {
            writeln!(f, "Given [H+] = {c} M")?;
            writeln!(f, "pH = -log[H+] = -log({c}) = {:.2}", self.ph)?;
            writeln!(f, "pOH = 14 - pH = {:.2}", self.poh)?;
        } else {
            writeln!(f, "Given [OH-] = {c} M")?;
            writeln!(f, "pOH = -log[OH-] = -log({c}) = {:.2}", self.poh)?;
            writeln!(f, "pH = 14 - pOH = {:.2}", self.ph)?;
        }
        write!(f, "Solution is {}", self.classification)
    }
}

// ============================================================================
// Molarity
// ============================================================================

/// Which quantity of `M = n / V` was solved for
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "solved_for", rename_all = "snake_case")]
pub enum MolarityResult {
    Moles { molarity: f64, volume_liters: f64, moles: f64 },
    Molarity { moles: f64, volume_liters: f64, molarity: f64 },
    Volume { moles: f64, molarity: f64, volume_liters: f64 },
}

/// Solve `M = n / V` given exactly two of the three quantities
pub fn molarity(
    moles: Option<f64>,
    volume_liters: Option<f64>,
    molarity: Option<f64>,
) -> CalcResult<MolarityResult> {
    for (name, value) in [
        ("solute_moles", moles),
        ("volume_liters", volume_liters),
        ("molarity", molarity),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(CalcError::domain(format!(
                    "{name} must be a non-negative number (got {v})"
                )));
            }
        }
    }

    match (moles, volume_liters, molarity) {
        (None, Some(volume_liters), Some(molarity)) => Ok(MolarityResult::Moles {
            molarity,
            volume_liters,
            moles: molarity * volume_liters,
        }),
        (Some(moles), Some(volume_liters), None) => {
            if volume_liters == 0.0 {
                return Err(CalcError::domain("Volume must be greater than zero"));
            }
            Ok(MolarityResult::Molarity {
                moles,
                volume_liters,
                molarity: moles / volume_liters,
            })
        }
        (Some(moles), None, Some(molarity)) => {
            if molarity == 0.0 {
                return Err(CalcError::domain("Molarity must be greater than zero"));
            }
            Ok(MolarityResult::Volume {
                moles,
                molarity,
                volume_liters: moles / molarity,
            })
        }
        _ => Err(CalcError::parse(
            "Provide exactly two of the three values (solute_moles, volume_liters, molarity)",
        )),
    }
}

impl fmt::Display for MolarityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MolarityResult::Moles {
                molarity,
                volume_liters,
                moles,
            } => write!(
                f,
                "Moles of solute = Molarity × Volume = {} M × {} L = {moles:.3} mol",
                format_number(molarity),
                format_number(volume_liters)
            ),
            MolarityResult::Molarity {
                moles,
                volume_liters,
                molarity,
            } => write!(
                f,
                "Molarity = Moles / Volume = {} mol / {} L = {molarity:.3} M",
                format_number(moles),
                format_number(volume_liters)
            ),
            MolarityResult::Volume {
                moles,
                molarity,
                volume_liters,
            } => write!(
                f,
                "Volume = Moles / Molarity = {} mol / {} M = {volume_liters:.3} L",
                format_number(moles),
                format_number(molarity)
            ),
        }
    }
}
