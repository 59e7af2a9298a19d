use crate::{
    fraction::{ArithmeticError, Fraction},
    Equation,
};
use nalgebra::DMatrix as Matrix;
use smol_str::SmolStr;
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
    ops::Index,
};

/// What to do with variables that no equation manages to pin down.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FreeVariables {
    /// Fail with [`SolveError::SeveralUnknowns`] when a row is left with
    /// more than one unknown, or [`SolveError::FreeVariables`] when a
    /// variable never gets a value.
    Reject,
    /// Set them to `0` and list them in [`Solution::free_variables()`].
    ///
    /// When a row is left with several unknowns, its leading variable is
    /// solved for and the rest are assumed to be zero.
    AssumeZero,
}

impl Default for FreeVariables {
    fn default() -> Self { FreeVariables::Reject }
}

/// Knobs for tweaking how a system is solved.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SolveOptions {
    pub free_variables: FreeVariables,
    /// Fail when a row reduces to `0 = c` for some non-zero `c`, instead of
    /// skipping it.
    pub check_consistency: bool,
}

impl SolveOptions {
    pub fn new() -> Self { SolveOptions::default() }

    pub fn free_variables(self, free_variables: FreeVariables) -> Self {
        SolveOptions {
            free_variables,
            ..self
        }
    }

    pub fn check_consistency(self, check_consistency: bool) -> Self {
        SolveOptions {
            check_consistency,
            ..self
        }
    }
}

/// Solve a set of linear equations exactly using Gaussian elimination.
///
/// The equations are turned into an augmented matrix, `[A | b]`, with one
/// row per equation and one column per unknown (in the same order as
/// `unknowns`) plus a final column for the constant terms.
///
/// The matrix is put into row echelon form using partial pivoting, then we
/// walk back up from the last row. Every row should contain at most one
/// variable we don't know yet once the already-solved ones are substituted
/// in, so it gives us that variable's value.
///
/// See also:
///
/// - https://en.wikipedia.org/wiki/Gaussian_elimination#Pseudocode
pub(crate) fn solve(
    equations: &[Equation],
    unknowns: &[SmolStr],
    options: &SolveOptions,
) -> Result<Solution, SolveError> {
    if unknowns.len() > equations.len() {
        return Err(SolveError::Underspecified {
            equations: equations.len(),
            unknowns: unknowns.len(),
        });
    }

    tracing::debug!(
        equations = equations.len(),
        unknowns = unknowns.len(),
        "Solving a system of equations"
    );

    let mut matrix = augmented_matrix(equations, unknowns);
    triangularize(&mut matrix, unknowns.len())?;
    let substituted = back_substitute(&mut matrix, unknowns, options)?;

    let solution = Solution::collate(unknowns, &substituted, options)?;
    tracing::debug!(solution = %solution, "Solved");

    Ok(solution)
}

/// Build the `rows x (unknowns + 1)` augmented matrix for a set of equations.
fn augmented_matrix(
    equations: &[Equation],
    unknowns: &[SmolStr],
) -> Matrix<Fraction> {
    Matrix::from_fn(equations.len(), unknowns.len() + 1, |row, column| {
        let equation = &equations[row];

        match unknowns.get(column) {
            Some(name) => equation.coefficient(name).simplified(),
            None => equation.constant().simplified(),
        }
    })
}

/// Put the first `unknowns` columns of the matrix into row echelon form.
fn triangularize(
    matrix: &mut Matrix<Fraction>,
    unknowns: usize,
) -> Result<(), ArithmeticError> {
    let rows = matrix.nrows();
    let columns = matrix.ncols();

    let (mut h, mut k) = (0, 0);

    while h < rows && k < unknowns {
        let magnitudes = (h..rows)
            .map(|row| matrix[(row, k)].checked_abs())
            .collect::<Result<Vec<_>, _>>()?;
        let pivot = match argmax(0..magnitudes.len(), |&i| magnitudes[i]) {
            Some(offset) => h + offset,
            None => break,
        };

        if matrix[(pivot, k)].is_zero() {
            tracing::trace!(column = k, "No pivot, skipping the column");
            k += 1;
            continue;
        }

        tracing::trace!(row = pivot, column = k, "Found a pivot");

        if pivot != h {
            matrix.swap_rows(h, pivot);
        }

        let pivot_value = matrix[(h, k)];

        for row in h + 1..rows {
            if matrix[(row, k)].is_zero() {
                continue;
            }

            let factor = matrix[(row, k)].checked_div(pivot_value)?;
            matrix[(row, k)] = Fraction::ZERO;

            for column in k + 1..columns {
                let scaled = matrix[(h, column)].checked_mul(factor)?;
                matrix[(row, column)] =
                    matrix[(row, column)].checked_sub(scaled)?;
            }
        }

        h += 1;
        k += 1;
    }

    Ok(())
}

/// The outcome of back-substitution, indexed by column.
#[derive(Debug, Clone, PartialEq)]
struct Substituted {
    /// Unknowns which were never isolated are left as `None`.
    values: Vec<Option<Fraction>>,
    /// Columns that were set to zero so the rest of their row could be
    /// solved.
    assumed_zero: Vec<usize>,
}

/// Walk up a triangularized matrix, solving for one unknown per row.
fn back_substitute(
    matrix: &mut Matrix<Fraction>,
    unknowns: &[SmolStr],
    options: &SolveOptions,
) -> Result<Substituted, SolveError> {
    let constant = unknowns.len();
    let mut values: Vec<Option<Fraction>> = vec![None; unknowns.len()];
    let mut assumed_zero = Vec::new();

    for row in (0..matrix.nrows()).rev() {
        let mut remaining = Vec::new();

        for column in 0..constant {
            let coefficient = matrix[(row, column)];

            if coefficient.is_zero() {
                continue;
            }

            match values[column] {
                Some(value) => {
                    let contribution = coefficient.checked_mul(value)?;
                    matrix[(row, constant)] =
                        matrix[(row, constant)].checked_sub(contribution)?;
                    matrix[(row, column)] = Fraction::ZERO;
                },
                None => remaining.push(column),
            }
        }

        if remaining.len() > 1
            && options.free_variables == FreeVariables::AssumeZero
        {
            // row echelon form puts the pivot first
            for column in remaining.drain(1..) {
                values[column] = Some(Fraction::ZERO);
                matrix[(row, column)] = Fraction::ZERO;
                assumed_zero.push(column);

                tracing::trace!(
                    row,
                    variable = %unknowns[column],
                    "Assuming a free variable is zero"
                );
            }
        }

        match *remaining.as_slice() {
            [] => {
                let leftover = matrix[(row, constant)];

                if options.check_consistency && !leftover.is_zero() {
                    return Err(SolveError::Inconsistent {
                        row,
                        constant: leftover,
                    });
                }
            },
            [column] => {
                let value = matrix[(row, constant)]
                    .checked_div(matrix[(row, column)])?;
                matrix[(row, constant)] = value;
                values[column] = Some(value);

                tracing::trace!(
                    row,
                    variable = %unknowns[column],
                    value = %value,
                    "Back-substituted"
                );
            },
            _ => {
                return Err(SolveError::SeveralUnknowns {
                    row,
                    unknowns: remaining
                        .iter()
                        .map(|&column| unknowns[column].clone())
                        .collect(),
                });
            },
        }
    }

    Ok(Substituted {
        values,
        assumed_zero,
    })
}

/// Find the item with the largest key, preferring the first one when there
/// are ties.
pub(crate) fn argmax<I, K, F>(items: I, mut key: F) -> Option<I::Item>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: PartialOrd,
{
    let mut best: Option<(I::Item, K)> = None;

    for item in items {
        let score = key(&item);
        let is_better = match &best {
            Some((_, best_score)) => score > *best_score,
            None => true,
        };

        if is_better {
            best = Some((item, score));
        }
    }

    best.map(|(item, _)| item)
}

/// The value found for each variable in a system of equations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Solution {
    known_values: BTreeMap<SmolStr, Fraction>,
    free_variables: Vec<SmolStr>,
}

impl Solution {
    fn collate(
        unknowns: &[SmolStr],
        substituted: &Substituted,
        options: &SolveOptions,
    ) -> Result<Self, SolveError> {
        let Substituted {
            values,
            assumed_zero,
        } = substituted;

        let never_isolated: Vec<SmolStr> = unknowns
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.clone())
            .collect();

        if !never_isolated.is_empty()
            && options.free_variables == FreeVariables::Reject
        {
            return Err(SolveError::FreeVariables {
                names: never_isolated,
            });
        }

        let free_variables: Vec<SmolStr> = unknowns
            .iter()
            .enumerate()
            .filter(|(column, _)| {
                values[*column].is_none() || assumed_zero.contains(column)
            })
            .map(|(_, name)| name.clone())
            .collect();

        if !free_variables.is_empty() {
            tracing::debug!(
                free_variables = ?free_variables,
                "Assuming unconstrained variables are zero"
            );
        }

        let known_values = unknowns
            .iter()
            .cloned()
            .zip(values.iter().map(|value| value.unwrap_or(Fraction::ZERO)))
            .collect();

        Ok(Solution {
            known_values,
            free_variables,
        })
    }

    pub fn get(&self, name: &str) -> Option<Fraction> {
        self.known_values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Fraction)> + '_ {
        self.known_values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize { self.known_values.len() }

    pub fn is_empty(&self) -> bool { self.known_values.is_empty() }

    /// Variables that no equation pinned down. They are reported as `0`.
    pub fn free_variables(&self) -> &[SmolStr] { &self.free_variables }

    pub fn is_free(&self, name: &str) -> bool {
        self.free_variables.iter().any(|free| free.as_str() == name)
    }
}

impl<'a> Index<&'a str> for Solution {
    type Output = Fraction;

    fn index(&self, name: &'a str) -> &Fraction { &self.known_values[name] }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} = {}", name, value)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// There are more unknowns than equations.
    Underspecified { equations: usize, unknowns: usize },
    /// A row still had several unknown variables during back-substitution.
    SeveralUnknowns { row: usize, unknowns: Vec<SmolStr> },
    /// Some variables never got a value while using
    /// [`FreeVariables::Reject`].
    FreeVariables { names: Vec<SmolStr> },
    /// A row reduced to `0 = constant`.
    Inconsistent { row: usize, constant: Fraction },
    Arithmetic(ArithmeticError),
}

impl From<ArithmeticError> for SolveError {
    fn from(e: ArithmeticError) -> Self { SolveError::Arithmetic(e) }
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Underspecified {
                equations,
                unknowns,
            } => write!(
                f,
                "The system is underspecified ({} unknowns but only {} equations)",
                unknowns, equations
            ),
            SolveError::SeveralUnknowns { row, unknowns } => write!(
                f,
                "Row {} still has several unknown variables ({})",
                row,
                unknowns.join(", ")
            ),
            SolveError::FreeVariables { names } => {
                write!(f, "Unable to determine {}", names.join(", "))
            },
            SolveError::Inconsistent { row, constant } => {
                write!(f, "Row {} reduces to 0 = {}", row, constant)
            },
            SolveError::Arithmetic(_) => write!(f, "Arithmetic failed"),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SolveError::Arithmetic(inner) => Some(inner),
            _ => None,
        }
    }
}
