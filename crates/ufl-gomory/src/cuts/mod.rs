//! Gomory cut generation.
//!
//! A generator turns one reconstructed tableau row into a [`RawCut`] over the
//! nonbasic structural and slack columns. [`CutContext::finish`] then
//! projects it onto the structural variables, scales it to integers when
//! possible and measures how far the current point violates it.

mod gfc;
mod gmi;

pub use gfc::FractionalGomory;
pub use gmi::MixedIntegerGomory;

use std::collections::BTreeMap;
use std::fmt;

use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, Zero};

use crate::ledger::RowLedger;
use crate::rational::{self, Rational};
use crate::relaxation::Sense;
use crate::tableau::ExactRow;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutKind {
    Gfc,
    Gmi,
}

impl CutKind {
    pub fn label(&self) -> &'static str {
        match self {
            CutKind::Gfc => "gfc",
            CutKind::Gmi => "gmi",
        }
    }
}

impl fmt::Display for CutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutKind::Gfc => write!(f, "GFC"),
            CutKind::Gmi => write!(f, "GMI"),
        }
    }
}

/// `Σ terms ≥ rhs` over structural and slack columns, as derived from a
/// tableau row
#[derive(Debug, Clone, PartialEq)]
pub struct RawCut {
    pub terms: Vec<(usize, Rational)>,
    pub rhs: Rational,
}

/// A valid inequality `Σ coefficients[j]·x_j ≥ rhs` over the structural
/// variables
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub name: String,
    pub kind: CutKind,
    pub iteration: usize,
    /// Tableau row the cut was derived from
    pub source_row: usize,
    /// Nonzero coefficients only
    pub coefficients: BTreeMap<usize, Rational>,
    pub rhs: Rational,
    /// Euclidean distance by which the point it was generated at violates it
    pub violation: f64,
    /// All coefficients and the rhs are integers, so the cut's slack is an
    /// integer variable too
    pub integral: bool,
}

impl Cut {
    pub fn sense(&self) -> Sense {
        Sense::Ge
    }

    pub fn coefficients_f64(&self) -> Vec<(usize, f64)> {
        self.coefficients.iter().map(|(&j, q)| (j, rational::to_f64(q))).collect()
    }

    pub fn rhs_f64(&self) -> f64 {
        rational::to_f64(&self.rhs)
    }

    pub fn lhs(&self, point: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|(&j, q)| rational::to_f64(q) * point.get(j).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn is_satisfied_by(&self, point: &[f64], tolerance: f64) -> bool {
        self.lhs(point) >= self.rhs_f64() - tolerance
    }
}

/// One cut-derivation rule
pub trait CutGenerator {
    fn kind(&self) -> CutKind;

    /// Derive a cut from `row`, or `None` if the rule does not apply to it.
    ///
    /// `integer_columns[j]` tells whether column `j` (structural or slack)
    /// is required to be integral.
    fn derive(&self, row: &ExactRow, integer_columns: &[bool]) -> Option<RawCut>;
}

/// Everything needed to turn a [`RawCut`] into a [`Cut`] in one round
#[derive(Debug, Clone, Copy)]
pub struct CutContext<'a> {
    pub ledger: &'a RowLedger,
    pub num_structural: usize,
    /// Structural part of the current relaxation optimum
    pub point: &'a [f64],
    pub iteration: usize,
    pub max_scale: i128,
    pub tolerance: f64,
}

impl CutContext<'_> {
    /// Run `generator` on `row` and finish the result
    pub fn generate(&self, generator: &dyn CutGenerator, row: &ExactRow) -> Option<Cut> {
        let integer_columns = self.ledger.column_integrality(self.num_structural);
        let raw = generator.derive(row, &integer_columns)?;
        self.finish(generator.kind(), row.row, raw)
    }

    /// Project, scale and measure `raw`. Returns `None` when the projection
    /// overflows, leaves nothing, or the current point is not violated.
    pub fn finish(&self, kind: CutKind, source_row: usize, raw: RawCut) -> Option<Cut> {
        let (coefficients, rhs) = project(&raw, self.ledger, self.num_structural)?;
        if coefficients.is_empty() {
            return None;
        }
        let (coefficients, rhs, integral) = match scale_to_integers(&coefficients, &rhs, self.max_scale) {
            Some((coefficients, rhs)) => (coefficients, rhs, true),
            None => (coefficients, rhs, false),
        };
        let violation = efficacy(&coefficients, &rhs, self.point)?;
        if violation <= self.tolerance {
            return None;
        }
        Some(Cut {
            name: format!("{}_{}_{}", kind.label(), self.iteration, source_row),
            kind,
            iteration: self.iteration,
            source_row,
            coefficients,
            rhs,
            violation,
            integral,
        })
    }
}

/// Substitute every slack column by its row definition.
///
/// For a `≤` row `a·x ≤ b` the slack is `b - a·x`; for a `≥` row it is
/// `a·x - b`. Fails on overflow or when a slack belongs to a row that was
/// not reconstructed exactly.
pub fn project(
    raw: &RawCut,
    ledger: &RowLedger,
    num_structural: usize,
) -> Option<(BTreeMap<usize, Rational>, Rational)> {
    let mut coefficients: BTreeMap<usize, Rational> = BTreeMap::new();
    let mut rhs = raw.rhs;

    for &(j, g) in &raw.terms {
        if j < num_structural {
            accumulate(&mut coefficients, j, &g)?;
            continue;
        }
        let row = ledger.row(j - num_structural)?;
        if !row.exact {
            return None;
        }
        let sign = match row.sense {
            Sense::Le => -Rational::from_integer(1),
            Sense::Ge => Rational::from_integer(1),
        };
        let weight = g.checked_mul(&sign)?;
        for (k, a) in &row.terms {
            accumulate(&mut coefficients, *k, &weight.checked_mul(a)?)?;
        }
        rhs = rhs.checked_add(&weight.checked_mul(&row.rhs)?)?;
    }

    coefficients.retain(|_, q| !q.is_zero());
    Some((coefficients, rhs))
}

fn accumulate(coefficients: &mut BTreeMap<usize, Rational>, column: usize, value: &Rational) -> Option<()> {
    let slot = coefficients.entry(column).or_insert_with(Rational::zero);
    *slot = slot.checked_add(value)?;
    Some(())
}

/// Multiply through by the lcm of the denominators, divide by the gcd of the
/// resulting coefficients and round the rhs up. `None` if the lcm exceeds
/// `max_scale` or the arithmetic overflows.
///
/// Rounding up is only valid because every structural variable is integral.
pub fn scale_to_integers(
    coefficients: &BTreeMap<usize, Rational>,
    rhs: &Rational,
    max_scale: i128,
) -> Option<(BTreeMap<usize, Rational>, Rational)> {
    let lcm = rational::common_denominator(coefficients.values(), max_scale)?;
    let mut scaled = BTreeMap::new();
    for (&j, q) in coefficients {
        scaled.insert(j, rational::scale(q, lcm)?);
    }
    let mut scaled_rhs = rational::scale(rhs, lcm)?;

    let gcd = rational::common_divisor(scaled.values());
    if gcd > 1 {
        let divisor = Rational::from_integer(gcd);
        for q in scaled.values_mut() {
            *q /= divisor;
        }
        scaled_rhs /= divisor;
    }
    Some((scaled, scaled_rhs.ceil()))
}

/// `(rhs - α·x) / ‖α‖`, the distance from `point` to the cut hyperplane on
/// the violated side. `None` for an all-zero `α`.
pub fn efficacy(coefficients: &BTreeMap<usize, Rational>, rhs: &Rational, point: &[f64]) -> Option<f64> {
    let mut lhs = 0.0;
    let mut norm = 0.0;
    for (&j, q) in coefficients {
        let a = rational::to_f64(q);
        lhs += a * point.get(j).copied().unwrap_or(0.0);
        norm += a * a;
    }
    if norm <= 0.0 {
        return None;
    }
    Some((rational::to_f64(rhs) - lhs) / norm.sqrt())
}

/// Fractional part of `q`, `None` if `q` is integral
pub(crate) fn proper_fraction(q: &Rational) -> Option<Rational> {
    let f = rational::fractional_part(q);
    if f.is_zero() { None } else { Some(f) }
}

/// `value · numerator / denominator`, `None` on overflow or a zero denominator
pub(crate) fn ratio_times(value: &Rational, numerator: &Rational, denominator: &Rational) -> Option<Rational> {
    value.checked_mul(numerator)?.checked_div(denominator)
}

pub(crate) fn one_minus(q: &Rational) -> Option<Rational> {
    Rational::from_integer(1).checked_sub(q)
}
