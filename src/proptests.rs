//! Property-based tests for the exact arithmetic and the solver.

use crate::{
    Equation, EquationSystem, FreeVariables, Fraction, SolveError, SolveOptions,
};
use proptest::prelude::*;

fn small_int() -> impl Strategy<Value = i64> { -1000i64..1000i64 }

fn non_zero_int() -> impl Strategy<Value = i64> {
    prop_oneof![(-1000i64..=-1i64), (1i64..=1000i64)]
}

/// Integers near either end of the `i64` range, skipping `i64::MIN` (which
/// has no reciprocal).
fn wide_int() -> impl Strategy<Value = i64> {
    prop_oneof![
        non_zero_int(),
        (i64::MAX / 4)..i64::MAX,
        (i64::MIN + 1)..(i64::MIN / 4),
    ]
}

fn system_of_three(coefficients: &[i64], constants: &[i64]) -> EquationSystem {
    let names = ["x", "y", "z"];

    coefficients
        .chunks(3)
        .zip(constants)
        .map(|(row, &constant)| {
            Equation::new(names.iter().copied().zip(row.iter().copied()), constant)
        })
        .collect()
}

fn fraction() -> impl Strategy<Value = Fraction> {
    (small_int(), non_zero_int())
        .prop_map(|(numerator, denominator)| Fraction::new(numerator, denominator))
}

fn non_zero_fraction() -> impl Strategy<Value = Fraction> {
    (non_zero_int(), non_zero_int())
        .prop_map(|(numerator, denominator)| Fraction::new(numerator, denominator))
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

proptest! {
    #[test]
    fn simplify_gives_the_canonical_form(a in small_int(), d in non_zero_int()) {
        let got = Fraction::new(a, d).simplified();

        prop_assert!(got.denominator() > 0);
        prop_assert_eq!(gcd(got.numerator(), got.denominator()), 1);
        if a == 0 {
            prop_assert_eq!(got.denominator(), 1);
        }
    }

    #[test]
    fn division_undoes_multiplication(x in fraction(), y in non_zero_fraction()) {
        prop_assert_eq!((x / y) * y, x);
    }

    #[test]
    fn additive_inverse(x in fraction()) {
        prop_assert_eq!(x + (-x), Fraction::ZERO);
        prop_assert_eq!(x - x, Fraction::ZERO);
    }

    #[test]
    fn addition_commutes(x in fraction(), y in fraction()) {
        prop_assert_eq!(x + y, y + x);
    }

    #[test]
    fn multiplication_distributes(x in fraction(), y in fraction(), z in fraction()) {
        prop_assert_eq!(x * (y + z), x * y + x * z);
    }

    #[test]
    fn integer_and_fraction_division_agree(x in fraction(), n in non_zero_int()) {
        prop_assert_eq!(x / n, x / Fraction::from_integer(n));
        prop_assert_eq!(x * n, x * Fraction::from_integer(n));
    }

    #[test]
    fn integer_and_fraction_paths_agree_near_overflow(
        numerator in wide_int(),
        denominator in wide_int(),
        n in wide_int()
    ) {
        let x = Fraction::new(numerator, denominator);
        let as_fraction = Fraction::from_integer(n);

        prop_assert_eq!(x.checked_div_int(n), x.checked_div(as_fraction));
        prop_assert_eq!(x.checked_mul_int(n), x.checked_mul(as_fraction));
    }

    #[test]
    fn ordering_matches_floating_point(x in fraction(), y in fraction()) {
        let as_float = |f: Fraction| {
            let f = f.simplified();
            f.numerator() as f64 / f.denominator() as f64
        };

        if x < y {
            prop_assert!(as_float(x) < as_float(y));
        } else if x > y {
            prop_assert!(as_float(x) > as_float(y));
        } else {
            prop_assert_eq!(x.simplified().numerator(), y.simplified().numerator());
        }
    }

    #[test]
    fn display_round_trips_through_parsing(x in fraction()) {
        let text = x.to_string();

        prop_assert_eq!(text.parse::<Fraction>().unwrap(), x);
        prop_assert_eq!(Fraction::parse_strict(&text).unwrap(), x);
    }

    #[test]
    fn equation_display_round_trips(
        a in fraction(),
        b in fraction(),
        constant in fraction()
    ) {
        let equation = Equation::new(vec![("a", a), ("b", b)], constant);

        let got: Equation = equation.to_string().parse().unwrap();

        prop_assert_eq!(got, equation);
    }

    #[test]
    fn solutions_satisfy_every_equation(
        coefficients in proptest::collection::vec(small_int(), 9),
        constants in proptest::collection::vec(small_int(), 3)
    ) {
        let system = system_of_three(&coefficients, &constants);
        let options = SolveOptions::new().check_consistency(true);

        match system.solve_with(&options) {
            Ok(solution) => {
                for equation in &system {
                    prop_assert!(equation.is_satisfied_by(&solution).unwrap());
                }
            },
            // singular systems are allowed to fail
            Err(SolveError::SeveralUnknowns { .. })
            | Err(SolveError::Underspecified { .. })
            | Err(SolveError::Inconsistent { .. }) => {},
            Err(other) => prop_assert!(false, "Unexpected error: {}", other),
        }
    }

    #[test]
    fn assuming_free_variables_are_zero_still_satisfies_the_system(
        coefficients in proptest::collection::vec(-3i64..3i64, 9),
        constants in proptest::collection::vec(small_int(), 3)
    ) {
        let system = system_of_three(&coefficients, &constants);
        let options = SolveOptions::new()
            .check_consistency(true)
            .free_variables(FreeVariables::AssumeZero);

        match system.solve_with(&options) {
            Ok(solution) => {
                for equation in &system {
                    prop_assert!(equation.is_satisfied_by(&solution).unwrap());
                }
            },
            Err(SolveError::Underspecified { .. })
            | Err(SolveError::Inconsistent { .. }) => {},
            Err(other) => prop_assert!(false, "Unexpected error: {}", other),
        }
    }
}
