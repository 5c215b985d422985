//! Dense-vs-sparse formulation benchmark over a ladder of instance sizes.
//! Writes one CSV row per (size, mode) with build/solve times and counts,
//! and checks that both formulations agree on the optimal coverage.

#[cfg(not(feature = "highs"))]
pub fn main() {
    println!("benchmarks need an engine backend -- enable the 'highs' crate feature");
}

#[cfg(feature = "highs")]
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::time::Instant;

    use coverloc_planner::extsolvers::highs::HighsSolver;
    use coverloc_planner::milp::{build_formulation, FormulationMode};
    use coverloc_planner::solve::{solve_formulation, SolveStatus};
    use coverloc_structs::generator::{generate, GenParams};
    use coverloc_structs::index::IndexedInstance;

    env_logger::init();

    let sizes = [(200usize, 3usize, 10usize), (500, 5, 20), (1000, 8, 30), (2000, 10, 40)];
    let out_path = "benchmark.csv";
    let mut out = csv::Writer::from_path(out_path)?;
    out.write_record([
        "households",
        "existing",
        "candidates",
        "mode",
        "variables",
        "constraints",
        "build_seconds",
        "solve_seconds",
        "nodes",
        "objective",
    ])?;

    for (households, existing, candidates) in sizes {
        let instance = generate(&GenParams {
            seed: 42,
            households,
            existing,
            candidates,
            ..GenParams::default()
        });
        let indexed = IndexedInstance::from_instance(&instance)?;

        let mut objectives = Vec::new();
        for mode in [FormulationMode::Dense, FormulationMode::SparseLazy] {
            let build_start = Instant::now();
            let mut model = build_formulation::<HighsSolver>(&indexed, mode);
            let build_seconds = build_start.elapsed().as_secs_f64();
            let num_vars = model.num_vars();
            let num_constraints = model.num_constraints();

            let (summary, _) = solve_formulation(&mut model, Some(600.0));
            assert!(
                summary.status == SolveStatus::Optimal,
                "expected optimal solve, got {}",
                summary.status
            );
            let objective = summary.objective.unwrap_or(f64::NAN);
            objectives.push(objective);

            out.write_record([
                households.to_string(),
                existing.to_string(),
                candidates.to_string(),
                format!("{mode:?}"),
                num_vars.to_string(),
                num_constraints.to_string(),
                format!("{build_seconds:.4}"),
                format!("{:.4}", summary.solve_time.as_secs_f64()),
                summary.nodes.map_or_else(String::new, |n| n.to_string()),
                format!("{objective:.1}"),
            ])?;
            println!(
                "n={households} sites={} {mode:?}: {num_constraints} rows, obj {objective:.0}, {:.2}s solve",
                existing + candidates,
                summary.solve_time.as_secs_f64()
            );
        }

        assert!(
            (objectives[0] - objectives[1]).abs() < 1e-6,
            "dense and sparse disagree at n={households}: {objectives:?}"
        );
    }

    out.flush()?;
    println!("results written to {out_path}");
    Ok(())
}
