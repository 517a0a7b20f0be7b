//! Interval linear expressions and constraints over octagon variables.
//!
//! Expressions keep interval coefficients so non-deterministic constants
//! (`X := X + [1, 2]`) and approximated coefficients flow through the
//! same code path as exact scalars. The transfer functions classify each
//! expression into its octagonal shape first: only unit unary and unit
//! binary shapes can be represented exactly by the matrix.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Add, Neg};

/// Closed interval of doubles, possibly unbounded on either side.
///
/// An interval with `inf > sup` is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower end of the interval.
    pub inf: f64,
    /// Upper end of the interval.
    pub sup: f64,
}

fn scale_end(a: f64, b: f64) -> f64 {
    // The convention 0 · ±∞ = 0 keeps zero coefficients harmless.
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

impl Interval {
    /// Builds the interval `[inf, sup]`.
    #[must_use]
    pub fn new(inf: f64, sup: f64) -> Self {
        Self { inf, sup }
    }

    /// The whole real line.
    #[must_use]
    pub fn top() -> Self {
        Self { inf: f64::NEG_INFINITY, sup: f64::INFINITY }
    }

    /// The empty interval.
    #[must_use]
    pub fn bottom() -> Self {
        Self { inf: f64::INFINITY, sup: f64::NEG_INFINITY }
    }

    /// The interval holding exactly `value`.
    #[must_use]
    pub fn singleton(value: f64) -> Self {
        Self { inf: value, sup: value }
    }

    /// Whether the interval holds no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inf > self.sup
    }

    /// Whether the interval is the whole real line.
    #[must_use]
    pub fn is_top(&self) -> bool {
        self.inf == f64::NEG_INFINITY && self.sup == f64::INFINITY
    }

    /// Whether the interval holds exactly one value.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.inf == self.sup
    }

    /// Whether every value of `other` lies inside this interval.
    #[must_use]
    pub fn contains(&self, other: &Interval) -> bool {
        other.is_empty() || (self.inf <= other.inf && other.sup <= self.sup)
    }

    /// Sound product with another interval, used to scale a variable
    /// range by an interval coefficient.
    #[must_use]
    pub fn scaled(self, coefficient: Interval) -> Self {
        if self.is_empty() || coefficient.is_empty() {
            return Self::bottom();
        }
        let candidates = [
            scale_end(self.inf, coefficient.inf),
            scale_end(self.inf, coefficient.sup),
            scale_end(self.sup, coefficient.inf),
            scale_end(self.sup, coefficient.sup),
        ];
        let mut inf = candidates[0];
        let mut sup = candidates[0];
        for candidate in &candidates[1..] {
            inf = inf.min(*candidate);
            sup = sup.max(*candidate);
        }
        Self { inf, sup }
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::bottom();
        }
        // −∞ + ∞ cannot arise: both ends widen towards their own side.
        Interval { inf: self.inf + rhs.inf, sup: self.sup + rhs.sup }
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        Interval { inf: -self.sup, sup: -self.inf }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_singleton() {
            write!(f, "{}", self.inf)
        } else {
            write!(f, "[{}, {}]", self.inf, self.sup)
        }
    }
}

/// Interval linear expression `c₀ + Σ cᵢ·Xᵢ`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinExpr {
    constant: Interval,
    terms: Vec<(usize, Interval)>,
}

impl Default for LinExpr {
    fn default() -> Self {
        Self::zero()
    }
}

impl LinExpr {
    /// The expression holding only the given constant.
    #[must_use]
    pub fn from_constant(constant: Interval) -> Self {
        Self { constant, terms: Vec::new() }
    }

    /// The zero expression.
    #[must_use]
    pub fn zero() -> Self {
        Self::from_constant(Interval::singleton(0.0))
    }

    /// Adds `coefficient · X_variable` to the expression.
    #[must_use]
    pub fn plus_term(self, variable: usize, coefficient: f64) -> Self {
        self.plus_interval_term(variable, Interval::singleton(coefficient))
    }

    /// Adds `coefficient · X_variable` with an interval coefficient.
    #[must_use]
    pub fn plus_interval_term(mut self, variable: usize, coefficient: Interval) -> Self {
        match self.terms.binary_search_by_key(&variable, |&(v, _)| v) {
            Ok(position) => {
                let merged = self.terms[position].1 + coefficient;
                self.terms[position].1 = merged;
            }
            Err(position) => self.terms.insert(position, (variable, coefficient)),
        }
        self
    }

    /// Adds an interval to the constant of the expression.
    #[must_use]
    pub fn plus_constant(mut self, constant: Interval) -> Self {
        self.constant = self.constant + constant;
        self
    }

    /// The constant of the expression.
    #[must_use]
    pub fn constant(&self) -> Interval {
        self.constant
    }

    /// The terms of the expression, sorted by variable index.
    #[must_use]
    pub fn terms(&self) -> &[(usize, Interval)] {
        &self.terms
    }

    /// The expression with every coefficient and the constant negated.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            constant: -self.constant,
            terms: self.terms.iter().map(|&(variable, coefficient)| (variable, -coefficient)).collect(),
        }
    }

    /// Sound interval evaluation given a range for every variable.
    pub fn evaluate(&self, mut range_of: impl FnMut(usize) -> Interval) -> Interval {
        let mut accumulated = self.constant;
        for &(variable, coefficient) in &self.terms {
            accumulated = accumulated + range_of(variable).scaled(coefficient);
        }
        accumulated
    }
}

impl fmt::Display for LinExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for &(variable, coefficient) in &self.terms {
            if coefficient == Interval::singleton(1.0) {
                if first {
                    write!(f, "x{variable}")?;
                } else {
                    write!(f, " + x{variable}")?;
                }
            } else if coefficient == Interval::singleton(-1.0) {
                if first {
                    write!(f, "-x{variable}")?;
                } else {
                    write!(f, " - x{variable}")?;
                }
            } else if first {
                write!(f, "{coefficient}·x{variable}")?;
            } else {
                write!(f, " + {coefficient}·x{variable}")?;
            }
            first = false;
        }
        let constant = self.constant;
        if first {
            write!(f, "{constant}")
        } else if constant.is_singleton() && constant.inf < 0.0 {
            write!(f, " - {}", -constant.inf)
        } else if constant == Interval::singleton(0.0) {
            Ok(())
        } else {
            write!(f, " + {constant}")
        }
    }
}

/// Comparison kind of a linear constraint `e ⋈ 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `e = 0`.
    Eq,
    /// `e ≥ 0`.
    SupEq,
    /// `e > 0`.
    Sup,
    /// `e ≡ 0` modulo some constant; handled conservatively.
    EqMod,
    /// `e ≠ 0`; handled conservatively.
    DisEq,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Eq => write!(f, "= 0"),
            ConstraintKind::SupEq => write!(f, ">= 0"),
            ConstraintKind::Sup => write!(f, "> 0"),
            ConstraintKind::EqMod => write!(f, "= 0 mod"),
            ConstraintKind::DisEq => write!(f, "!= 0"),
        }
    }
}

/// Linear constraint `e ⋈ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinCons {
    expr: LinExpr,
    kind: ConstraintKind,
}

impl LinCons {
    /// Builds the constraint `expr ⋈ 0` for the given comparison.
    #[must_use]
    pub fn new(expr: LinExpr, kind: ConstraintKind) -> Self {
        Self { expr, kind }
    }

    /// Builds the constraint `expr ≥ 0`.
    #[must_use]
    pub fn sup_eq(expr: LinExpr) -> Self {
        Self::new(expr, ConstraintKind::SupEq)
    }

    /// Builds the constraint `expr = 0`.
    #[must_use]
    pub fn eq(expr: LinExpr) -> Self {
        Self::new(expr, ConstraintKind::Eq)
    }

    /// Builds the constraint `expr > 0`.
    #[must_use]
    pub fn sup(expr: LinExpr) -> Self {
        Self::new(expr, ConstraintKind::Sup)
    }

    /// The trivially unsatisfiable constraint `−1 ≥ 0`.
    #[must_use]
    pub fn unsat() -> Self {
        Self::sup_eq(LinExpr::from_constant(Interval::singleton(-1.0)))
    }

    /// The expression of the constraint.
    #[must_use]
    pub fn expr(&self) -> &LinExpr {
        &self.expr
    }

    /// The comparison kind of the constraint.
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }
}

impl fmt::Display for LinCons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.kind)
    }
}

/// Octagonal shape of a normalised linear expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OctagonalShape {
    /// Some coefficient interval is empty.
    Empty,
    /// No variable occurs; the expression is its constant.
    Zero,
    /// Exactly one variable, with coefficient `+1` (`positive`) or `−1`.
    Unary {
        /// The variable.
        i: usize,
        /// Whether the coefficient is `+1`.
        positive: bool,
    },
    /// Exactly two variables, each with coefficient `±1`.
    Binary {
        /// The first variable.
        i: usize,
        /// Whether the first coefficient is `+1`.
        positive_i: bool,
        /// The second variable.
        j: usize,
        /// Whether the second coefficient is `+1`.
        positive_j: bool,
    },
    /// Anything else; not representable exactly.
    Other,
}

/// Classifies an expression and stages its constant `[−a, b]` into the
/// scratch buffer as `tmp[0] = a`, `tmp[1] = b`.
pub(crate) fn octagonal_shape(expr: &LinExpr, dim: usize, tmp: &mut [f64]) -> OctagonalShape {
    let constant = expr.constant();
    tmp[0] = -constant.inf;
    tmp[1] = constant.sup;
    if constant.is_empty() {
        return OctagonalShape::Empty;
    }
    let mut units: [(usize, bool); 2] = [(0, false); 2];
    let mut count = 0usize;
    let mut other = false;
    for &(variable, coefficient) in expr.terms() {
        debug_assert!(variable < dim, "term variable out of range");
        if coefficient.is_empty() {
            return OctagonalShape::Empty;
        }
        if !coefficient.is_singleton() {
            other = true;
            continue;
        }
        if coefficient.inf == 0.0 {
            continue;
        }
        if coefficient.inf != 1.0 && coefficient.inf != -1.0 {
            other = true;
            continue;
        }
        if count < 2 {
            units[count] = (variable, coefficient.inf == 1.0);
        }
        count += 1;
    }
    if other || count > 2 {
        return OctagonalShape::Other;
    }
    match count {
        0 => OctagonalShape::Zero,
        1 => OctagonalShape::Unary { i: units[0].0, positive: units[0].1 },
        _ => OctagonalShape::Binary {
            i: units[0].0,
            positive_i: units[0].1,
            j: units[1].0,
            positive_j: units[1].1,
        },
    }
}

/// The literal standing for `+X_i` when `positive`, `−X_i` otherwise.
pub(crate) fn unit_literal(i: usize, positive: bool) -> usize {
    if positive { 2 * i } else { 2 * i + 1 }
}
