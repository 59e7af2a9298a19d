use exact_solve::{Equation, EquationSystem};
use std::io::{BufRead, BufReader};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let system = if std::env::args().any(|arg| arg == "--demo") {
        demo_system()
    } else {
        read_system()?
    };

    println!("{}", system);
    println!();

    let unknowns: Vec<_> =
        system.unknowns().iter().map(ToString::to_string).collect();
    println!("Solving for {}", unknowns.join(", "));

    let solution = system.solve()?;

    println!("Found:");

    for (name, value) in solution.iter() {
        println!("  {} = {}", name, value);
    }

    Ok(())
}

/// Read one equation per line from stdin, skipping blank lines and `#`
/// comments.
fn read_system() -> Result<EquationSystem, std::io::Error> {
    let mut system = EquationSystem::new();
    let stdin = std::io::stdin();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse() {
            Ok(equation) => system.push(equation),
            Err(e) => eprintln!("Unable to parse \"{}\": {}", line, e),
        }
    }

    Ok(system)
}

fn demo_system() -> EquationSystem {
    let equation = |x: i64, y: i64, z: i64, constant: i64| {
        Equation::builder()
            .term("x", x)
            .term("y", y)
            .term("z", z)
            .equals(constant)
    };

    EquationSystem::new()
        .with(equation(1, 2, 4, 3))
        .with(equation(3, -1, 3, 4))
        .with(equation(5, 2, 4, 18))
}
