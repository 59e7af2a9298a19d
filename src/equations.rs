use crate::{
    fraction::{ArithmeticError, Fraction},
    parse::{self, ParseError},
    solve::{self, Solution, SolveError, SolveOptions},
};
use smol_str::SmolStr;
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
    iter::{Extend, FromIterator},
    ops::{Add, AddAssign, Index, IndexMut},
    str::FromStr,
};

static ZERO: Fraction = Fraction::ZERO;

/// A linear equation, `a*x + b*y + ... = c`.
///
/// Each variable only ever appears once, and terms are kept in alphabetical
/// order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Equation {
    variable_terms: BTreeMap<SmolStr, Fraction>,
    constant_term: Fraction,
}

impl Equation {
    /// Create a new [`Equation`] from its `(variable, coefficient)` pairs and
    /// the constant on the right-hand side.
    ///
    /// Coefficients for a variable that is mentioned more than once are
    /// summed, and the result is simplified.
    pub fn new<I, S, F, C>(terms: I, constant: C) -> Self
    where
        I: IntoIterator<Item = (S, F)>,
        S: Into<SmolStr>,
        F: Into<Fraction>,
        C: Into<Fraction>,
    {
        let mut equation = Equation {
            variable_terms: BTreeMap::new(),
            constant_term: constant.into(),
        };

        for (name, coefficient) in terms {
            let name: SmolStr = name.into();
            let coefficient: Fraction = coefficient.into();
            equation[name.as_str()] += coefficient;
        }

        equation.simplify();
        equation
    }

    pub fn builder() -> EquationBuilder { EquationBuilder::default() }

    /// Get the coefficient for a variable, returning zero if it isn't
    /// mentioned.
    pub fn coefficient(&self, name: &str) -> Fraction { self[name] }

    pub fn set_coefficient<S: Into<SmolStr>>(
        &mut self,
        name: S,
        coefficient: Fraction,
    ) {
        self.variable_terms.insert(name.into(), coefficient);
    }

    pub fn constant(&self) -> Fraction { self.constant_term }

    pub fn set_constant(&mut self, constant: Fraction) {
        self.constant_term = constant;
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, Fraction)> + '_ {
        self.variable_terms
            .iter()
            .map(|(name, coefficient)| (name.as_str(), *coefficient))
    }

    pub fn variables(&self) -> impl Iterator<Item = &SmolStr> + '_ {
        self.variable_terms.keys()
    }

    /// The number of variable terms.
    pub fn len(&self) -> usize { self.variable_terms.len() }

    pub fn is_empty(&self) -> bool { self.variable_terms.is_empty() }

    /// Put the equation into its canonical form.
    ///
    /// Terms with a zero coefficient are removed. If only one variable is
    /// left, the equation is solved for it in place (i.e. `2x = 4` becomes
    /// `x = 2`).
    ///
    /// # Panics
    ///
    /// If the canonical form can't be represented. See
    /// [`Equation::try_simplify()`].
    pub fn simplify(&mut self) {
        if let Err(e) = self.try_simplify() {
            panic!("{}", e);
        }
    }

    pub fn simplified(&self) -> Equation {
        let mut copy = self.clone();
        copy.simplify();
        copy
    }

    /// The fallible version of [`Equation::simplify()`].
    ///
    /// The equation is left untouched when this fails.
    pub fn try_simplify(&mut self) -> Result<(), ArithmeticError> {
        let mut constant_term = self.constant_term.try_simplify()?;
        let mut variable_terms = BTreeMap::new();

        for (name, coefficient) in &self.variable_terms {
            let coefficient = coefficient.try_simplify()?;

            if !coefficient.is_zero() {
                variable_terms.insert(name.clone(), coefficient);
            }
        }

        if variable_terms.len() == 1 {
            if let Some(coefficient) = variable_terms.values_mut().next() {
                constant_term = constant_term.checked_div(*coefficient)?;
                *coefficient = Fraction::ONE;
            }
        }

        self.variable_terms = variable_terms;
        self.constant_term = constant_term;

        Ok(())
    }

    /// Add two equations together term by term.
    ///
    /// Both equations need to mention the same set of variables.
    pub fn try_add(
        &self,
        other: &Equation,
    ) -> Result<Equation, MismatchedVariables> {
        if !self.variable_terms.keys().eq(other.variable_terms.keys()) {
            return Err(MismatchedVariables {
                left: self.variables().cloned().collect(),
                right: other.variables().cloned().collect(),
            });
        }

        let mut sum = self.clone();

        for (name, coefficient) in &other.variable_terms {
            sum[name.as_str()] += *coefficient;
        }
        sum.constant_term += other.constant_term;
        sum.simplify();

        Ok(sum)
    }

    /// Evaluate the left-hand side using some `fn(name) -> Option<value>`
    /// lookup. Variables without a value count as zero.
    pub fn evaluate<F>(
        &self,
        lookup_variable_value: F,
    ) -> Result<Fraction, ArithmeticError>
    where
        F: Fn(&str) -> Option<Fraction>,
    {
        let mut total = Fraction::ZERO;

        for (name, coefficient) in self.terms() {
            let value = lookup_variable_value(name).unwrap_or(Fraction::ZERO);
            total = total.checked_add(coefficient.checked_mul(value)?)?;
        }

        Ok(total)
    }

    /// Check whether substituting the [`Solution`]'s values makes both sides
    /// equal.
    pub fn is_satisfied_by(
        &self,
        solution: &Solution,
    ) -> Result<bool, ArithmeticError> {
        let left = self.evaluate(|name| solution.get(name))?;
        Ok(left == self.constant_term)
    }
}

impl<'a> Index<&'a str> for Equation {
    type Output = Fraction;

    fn index(&self, name: &'a str) -> &Fraction {
        self.variable_terms.get(name).unwrap_or(&ZERO)
    }
}

impl<'a> IndexMut<&'a str> for Equation {
    fn index_mut(&mut self, name: &'a str) -> &mut Fraction {
        self.variable_terms.entry(SmolStr::new(name)).or_default()
    }
}

impl Add for Equation {
    type Output = Equation;

    fn add(self, rhs: Equation) -> Equation {
        match self.try_add(&rhs) {
            Ok(sum) => sum,
            Err(e) => panic!("{}", e),
        }
    }
}

impl AddAssign for Equation {
    fn add_assign(&mut self, rhs: Equation) {
        match self.try_add(&rhs) {
            Ok(sum) => *self = sum,
            Err(e) => panic!("{}", e),
        }
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut simplified = self.clone();
        if simplified.try_simplify().is_err() {
            // fall back to the terms as written, minus the zeroes
            simplified.variable_terms.retain(|_, c| !c.is_zero());
        }

        if simplified.is_empty() {
            write!(f, "0")?;
        }

        for (i, (name, coefficient)) in simplified.terms().enumerate() {
            // a fraction's Display is always in range, even when its
            // absolute value isn't
            let text = coefficient.to_string();
            let magnitude = text.trim_start_matches('-');
            let is_unit = magnitude == "1";

            if i > 0 {
                let sign = if coefficient.is_negative() { " - " } else { " + " };
                write!(f, "{}", sign)?;

                if is_unit {
                    write!(f, "{}", name)?;
                } else {
                    write!(f, "{}{}", magnitude, name)?;
                }
            } else if is_unit {
                let sign = if coefficient.is_negative() { "-" } else { "" };
                write!(f, "{}{}", sign, name)?;
            } else {
                write!(f, "{}{}", text, name)?;
            }
        }

        write!(f, " = {}", simplified.constant_term)
    }
}

impl FromStr for Equation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse::parse_equation(s) }
}

/// A builder for assembling an [`Equation`] one term at a time.
///
/// ```rust
/// # use exact_solve::Equation;
/// let equation = Equation::builder()
///     .term("x", 1)
///     .term("y", 2)
///     .term("z", 4)
///     .equals(3);
///
/// assert_eq!(equation.to_string(), "x + 2y + 4z = 3");
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EquationBuilder {
    terms: Vec<(SmolStr, Fraction)>,
}

impl EquationBuilder {
    pub fn term<S, F>(mut self, name: S, coefficient: F) -> Self
    where
        S: Into<SmolStr>,
        F: Into<Fraction>,
    {
        self.terms.push((name.into(), coefficient.into()));
        self
    }

    /// Finish the equation by setting its right-hand side.
    pub fn equals<C: Into<Fraction>>(self, constant: C) -> Equation {
        Equation::new(self.terms, constant)
    }
}

/// Equations can only be added when they mention the same variables.
#[derive(Debug, Clone, PartialEq)]
pub struct MismatchedVariables {
    pub left: Vec<SmolStr>,
    pub right: Vec<SmolStr>,
}

impl Display for MismatchedVariables {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to add equations over different variables ({} vs {})",
            self.left.join(", "),
            self.right.join(", ")
        )
    }
}

impl Error for MismatchedVariables {}

/// A builder for constructing a system of equations and solving them.
///
/// Equations are simplified as they are added.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EquationSystem {
    pub(crate) equations: Vec<Equation>,
}

impl EquationSystem {
    pub fn new() -> Self { EquationSystem::default() }

    pub fn with(mut self, equation: Equation) -> Self {
        self.push(equation);
        self
    }

    pub fn push(&mut self, mut equation: Equation) {
        equation.simplify();
        self.equations.push(equation);
    }

    pub fn from_equations<E, S>(equations: E) -> Result<Self, ParseError>
    where
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut system = EquationSystem::new();

        for equation in equations {
            let mut equation: Equation = equation.as_ref().parse()?;
            equation.try_simplify()?;
            system.equations.push(equation);
        }

        Ok(system)
    }

    pub fn equations(&self) -> &[Equation] { &self.equations }

    pub fn len(&self) -> usize { self.equations.len() }

    pub fn is_empty(&self) -> bool { self.equations.is_empty() }

    /// Every variable mentioned by the system, in alphabetical order.
    pub fn unknowns(&self) -> Vec<SmolStr> {
        let mut unknowns: Vec<_> = self
            .equations
            .iter()
            .flat_map(|eq| eq.variables())
            .cloned()
            .collect();
        unknowns.sort();
        unknowns.dedup();

        unknowns
    }

    pub fn num_unknowns(&self) -> usize { self.unknowns().len() }

    pub fn solve(&self) -> Result<Solution, SolveError> {
        self.solve_with(&SolveOptions::default())
    }

    pub fn solve_with(
        &self,
        options: &SolveOptions,
    ) -> Result<Solution, SolveError> {
        let unknowns = self.unknowns();
        solve::solve(&self.equations, &unknowns, options)
    }
}

impl Display for EquationSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, equation) in self.equations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", equation)?;
        }

        Ok(())
    }
}

impl From<Vec<Equation>> for EquationSystem {
    fn from(equations: Vec<Equation>) -> Self {
        equations.into_iter().collect()
    }
}

impl Extend<Equation> for EquationSystem {
    fn extend<T: IntoIterator<Item = Equation>>(&mut self, iter: T) {
        for equation in iter {
            self.push(equation);
        }
    }
}

impl FromIterator<Equation> for EquationSystem {
    fn from_iter<T: IntoIterator<Item = Equation>>(iter: T) -> Self {
        let mut system = EquationSystem::new();
        system.extend(iter);
        system
    }
}

impl<'a> IntoIterator for &'a EquationSystem {
    type IntoIter = <&'a [Equation] as IntoIterator>::IntoIter;
    type Item = &'a Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.iter() }
}

impl IntoIterator for EquationSystem {
    type IntoIter = <Vec<Equation> as IntoIterator>::IntoIter;
    type Item = Equation;

    fn into_iter(self) -> Self::IntoIter { self.equations.into_iter() }
}
