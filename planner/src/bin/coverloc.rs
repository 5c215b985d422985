//! Generate-or-load an instance, build the sparse/lazy formulation, solve
//! it with HiGHS and print a report.

#[cfg(not(feature = "highs"))]
pub fn main() {
    println!("coverloc needs an engine backend -- enable the 'highs' crate feature");
}

#[cfg(feature = "highs")]
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::Path;

    use coverloc_planner::extsolvers::highs::HighsSolver;
    use coverloc_planner::milp::{build_formulation, FormulationMode};
    use coverloc_planner::solve::{solve_formulation, SolveStatus};
    use coverloc_structs::generator::{generate, GenParams};
    use coverloc_structs::index::IndexedInstance;
    use coverloc_structs::instance::Instance;

    fn thousands(n: u64) -> String {
        let digits = n.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (k, c) in digits.chars().enumerate() {
            if k > 0 && (digits.len() - k) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }

    env_logger::init();

    println!("{}", "=".repeat(60));
    println!("HEALTHCARE ACCESS OPTIMIZATION");
    println!("{}", "=".repeat(60));
    println!();

    let data_path = Path::new("large_data.json");
    let instance = if data_path.exists() {
        println!("[1/3] Loading existing dataset...");
        Instance::load(data_path)?
    } else {
        println!("[1/3] Generating dataset...");
        let instance = generate(&GenParams::default());
        instance.save(data_path)?;
        println!("      Dataset saved to {}", data_path.display());
        instance
    };

    println!("      Households: {}", thousands(instance.households.len() as u64));
    println!("      Existing hospitals: {}", instance.existing_hospitals.len());
    println!("      Potential sites: {}", instance.candidate_hospitals.len());
    println!("      Max new hospitals: {}", instance.max_new_hospitals);
    println!();

    println!("[2/3] Building optimization model...");
    let indexed = IndexedInstance::from_instance(&instance)?;
    let mut model = build_formulation::<HighsSolver>(&indexed, FormulationMode::SparseLazy);
    println!("      Variables: {}", thousands(model.num_vars() as u64));
    println!("      Constraints: {}", thousands(model.num_constraints() as u64));
    println!();

    println!("[3/3] Solving...");
    println!("{}", "-".repeat(60));
    let (summary, _solution) = solve_formulation(&mut model, None);
    println!("{}", "-".repeat(60));
    println!();

    println!("RESULTS");
    println!("{}", "=".repeat(60));
    match (&summary.status, summary.objective) {
        (SolveStatus::Optimal, Some(objective)) => {
            println!("Status: Optimal");
            println!("Objective: {} (people covered)", thousands(objective.round() as u64));
            println!("Solve time: {:.2} seconds", summary.solve_time.as_secs_f64());
            if let Some(nodes) = summary.nodes {
                println!("Nodes explored: {}", thousands(nodes));
            }
        }
        (status, _) => {
            println!("Status: {status}");
            println!("Solve time: {:.2} seconds", summary.solve_time.as_secs_f64());
        }
    }
    println!();

    Ok(())
}
