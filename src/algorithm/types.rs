//! Algorithm catalog type definitions
//!
//! Each variant carries its options as fields. The integer codes are the
//! ones analysts already write in their control files.

use crate::errors::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of user-defined algorithm slots
pub const USER_ALGORITHM_SLOTS: usize = 3;

/// Krylov subspace dimension used by the `-maxDim` catalog entries
pub const EXTENDED_KRYLOV_DIM: u32 = 50;

/// Tangent used by the full Newton-Raphson algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewtonTangent {
    /// Current tangent every iteration
    Current,

    /// Initial tangent every iteration
    Initial,

    /// Initial tangent on the first iteration, then current
    InitialThenCurrent,
}

/// Line search variant for Newton with line search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineSearch {
    /// Solver default (interpolated)
    Default,
    Bisection,
    Secant,
    RegulaFalsi,
}

/// Options shared by the accelerated Newton variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccelerationOptions {
    /// Use the initial tangent for iterations
    pub iterate_initial: bool,

    /// Use the initial tangent for increments
    pub increment_initial: bool,

    /// Maximum subspace dimension (`None` keeps the solver default)
    pub max_dim: Option<u32>,
}

/// Iteration algorithm posed to the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Algorithm {
    Linear { initial: bool, factor_once: bool },
    Newton { tangent: NewtonTangent },
    NewtonLineSearch { search: LineSearch },
    ModifiedNewton { initial: bool },
    KrylovNewton(AccelerationOptions),
    SecantNewton(AccelerationOptions),
    Bfgs,
    Broyden,
    PeriodicNewton,

    /// Caller-supplied strategy, resolved through `UserAlgorithms`
    UserDefined(usize),
}

impl Algorithm {
    /// Every code in the catalog, in ascending order
    pub const CODES: [i32; 28] = [
        0, 1, 2, 10, 11, 12, 20, 21, 22, 23, 30, 31, 40, 41, 42, 43, 44, 45, 50, 51, 52, 53, 60,
        70, 80, 90, 91, 92,
    ];

    /// Look up an algorithm by its catalog code
    pub fn from_code(code: i32) -> Result<Self> {
        use Algorithm::*;

        let krylov = |iterate_initial, increment_initial, max_dim| {
            KrylovNewton(AccelerationOptions {
                iterate_initial,
                increment_initial,
                max_dim,
            })
        };
        let secant = |iterate_initial, increment_initial| {
            SecantNewton(AccelerationOptions {
                iterate_initial,
                increment_initial,
                max_dim: None,
            })
        };

        let algorithm = match code {
            0 => Linear { initial: false, factor_once: false },
            1 => Linear { initial: true, factor_once: false },
            2 => Linear { initial: false, factor_once: true },
            10 => Newton { tangent: NewtonTangent::Current },
            11 => Newton { tangent: NewtonTangent::Initial },
            12 => Newton { tangent: NewtonTangent::InitialThenCurrent },
            20 => NewtonLineSearch { search: LineSearch::Default },
            21 => NewtonLineSearch { search: LineSearch::Bisection },
            22 => NewtonLineSearch { search: LineSearch::Secant },
            23 => NewtonLineSearch { search: LineSearch::RegulaFalsi },
            30 => ModifiedNewton { initial: false },
            31 => ModifiedNewton { initial: true },
            40 => krylov(false, false, None),
            41 => krylov(true, false, None),
            42 => krylov(false, true, None),
            43 => krylov(true, true, None),
            44 => krylov(false, false, Some(EXTENDED_KRYLOV_DIM)),
            45 => krylov(true, true, Some(EXTENDED_KRYLOV_DIM)),
            50 => secant(false, false),
            51 => secant(true, false),
            52 => secant(false, true),
            53 => secant(true, true),
            60 => Bfgs,
            70 => Broyden,
            80 => PeriodicNewton,
            90..=92 => UserDefined((code - 90) as usize),
            _ => return Err(AnalyzeError::UnknownAlgorithm { code }),
        };

        Ok(algorithm)
    }

    /// Catalog code of this algorithm
    ///
    /// Option combinations without a catalog entry map to the closest base
    /// code, so `from_code(code())` is only the identity for catalog values.
    pub fn code(&self) -> i32 {
        use Algorithm::*;

        match *self {
            Linear { initial: true, .. } => 1,
            Linear { factor_once: true, .. } => 2,
            Linear { .. } => 0,
            Newton { tangent } => match tangent {
                NewtonTangent::Current => 10,
                NewtonTangent::Initial => 11,
                NewtonTangent::InitialThenCurrent => 12,
            },
            NewtonLineSearch { search } => match search {
                LineSearch::Default => 20,
                LineSearch::Bisection => 21,
                LineSearch::Secant => 22,
                LineSearch::RegulaFalsi => 23,
            },
            ModifiedNewton { initial } => {
                if initial {
                    31
                } else {
                    30
                }
            }
            KrylovNewton(opts) => match (
                opts.iterate_initial,
                opts.increment_initial,
                opts.max_dim,
            ) {
                (true, true, Some(_)) => 45,
                (_, _, Some(_)) => 44,
                (true, true, None) => 43,
                (false, true, None) => 42,
                (true, false, None) => 41,
                (false, false, None) => 40,
            },
            SecantNewton(opts) => match (opts.iterate_initial, opts.increment_initial) {
                (true, true) => 53,
                (false, true) => 52,
                (true, false) => 51,
                (false, false) => 50,
            },
            Bfgs => 60,
            Broyden => 70,
            PeriodicNewton => 80,
            UserDefined(slot) => 90 + slot as i32,
        }
    }

    /// Check if this algorithm is resolved through a user hook
    pub fn is_user_defined(&self) -> bool {
        matches!(self, Algorithm::UserDefined(_))
    }

    /// Solver command name without options
    pub fn name(&self) -> &'static str {
        use Algorithm::*;

        match self {
            Linear { .. } => "Linear",
            Newton { .. } => "Newton",
            NewtonLineSearch { .. } => "NewtonLineSearch",
            ModifiedNewton { .. } => "ModifiedNewton",
            KrylovNewton(_) => "KrylovNewton",
            SecantNewton(_) => "SecantNewton",
            Bfgs => "BFGS",
            Broyden => "Broyden",
            PeriodicNewton => "PeriodicNewton",
            UserDefined(_) => "UserDefined",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::KrylovNewton(AccelerationOptions::default())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Algorithm::*;

        write!(f, "{}", self.name())?;
        match *self {
            Linear { initial, factor_once } => {
                if initial {
                    write!(f, " -initial")?;
                }
                if factor_once {
                    write!(f, " -factorOnce")?;
                }
            }
            Newton { tangent } => match tangent {
                NewtonTangent::Current => {}
                NewtonTangent::Initial => write!(f, " -initial")?,
                NewtonTangent::InitialThenCurrent => write!(f, " -initialThenCurrent")?,
            },
            NewtonLineSearch { search } => match search {
                LineSearch::Default => {}
                LineSearch::Bisection => write!(f, " -type Bisection")?,
                LineSearch::Secant => write!(f, " -type Secant")?,
                LineSearch::RegulaFalsi => write!(f, " -type RegulaFalsi")?,
            },
            ModifiedNewton { initial } => {
                if initial {
                    write!(f, " -initial")?;
                }
            }
            KrylovNewton(opts) | SecantNewton(opts) => {
                if opts.iterate_initial {
                    write!(f, " -iterate initial")?;
                }
                if opts.increment_initial {
                    write!(f, " -increment initial")?;
                }
                if let Some(dim) = opts.max_dim {
                    write!(f, " -maxDim {}", dim)?;
                }
            }
            UserDefined(slot) => write!(f, "{}", slot)?,
            Bfgs | Broyden | PeriodicNewton => {}
        }
        Ok(())
    }
}

impl TryFrom<i32> for Algorithm {
    type Error = AnalyzeError;

    fn try_from(code: i32) -> Result<Self> {
        Algorithm::from_code(code)
    }
}

impl From<Algorithm> for i32 {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_codes_round_trip() {
        for code in Algorithm::CODES {
            let algorithm = Algorithm::from_code(code).unwrap();
            assert_eq!(algorithm.code(), code, "code {} did not round trip", code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        for code in [3, 13, 24, 46, 54, 61, 93, -5] {
            assert!(matches!(
                Algorithm::from_code(code),
                Err(AnalyzeError::UnknownAlgorithm { .. })
            ));
        }
    }

    #[test]
    fn test_default_is_krylov() {
        assert_eq!(Algorithm::default().code(), 40);
    }

    #[test]
    fn test_display_command_form() {
        assert_eq!(
            Algorithm::from_code(43).unwrap().to_string(),
            "KrylovNewton -iterate initial -increment initial"
        );
        assert_eq!(Algorithm::from_code(44).unwrap().to_string(), "KrylovNewton -maxDim 50");
        assert_eq!(Algorithm::from_code(22).unwrap().to_string(), "NewtonLineSearch -type Secant");
        assert_eq!(Algorithm::from_code(60).unwrap().to_string(), "BFGS");
        assert_eq!(Algorithm::from_code(91).unwrap().to_string(), "UserDefined1");
    }

    #[test]
    fn test_user_defined_slots() {
        assert_eq!(Algorithm::from_code(90).unwrap(), Algorithm::UserDefined(0));
        assert_eq!(Algorithm::from_code(92).unwrap(), Algorithm::UserDefined(2));
        assert!(Algorithm::from_code(92).unwrap().is_user_defined());
    }

    #[test]
    fn test_serde_uses_codes() {
        let algorithms = vec![Algorithm::from_code(40).unwrap(), Algorithm::Bfgs];
        let json = serde_json::to_string(&algorithms).unwrap();
        assert_eq!(json, "[40,60]");

        let parsed: Vec<Algorithm> = serde_json::from_str("[10, 31]").unwrap();
        assert_eq!(parsed[0], Algorithm::Newton { tangent: NewtonTangent::Current });
        assert_eq!(parsed[1], Algorithm::ModifiedNewton { initial: true });

        assert!(serde_json::from_str::<Vec<Algorithm>>("[7]").is_err());
    }
}
