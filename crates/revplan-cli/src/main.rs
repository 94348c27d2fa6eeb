use clap::{Parser, Subcommand};
use std::path::PathBuf;

use revplan_model::{AllocationReport, ModelError, ProblemModel, Reformulation};
use revplan_solver::{SolutionStatus, Solver};

#[derive(Parser)]
#[command(name = "revplan")]
#[command(about = "Revenue allocation planning with quantity discounts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and output the optimal allocation
    Solve {
        /// The JSON problem file
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show binding constraints and shadow prices
        #[arg(short, long)]
        report: bool,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

/// On-disk problem document; the optional activity labels are presentation
/// only and never reach the model
#[derive(serde::Deserialize)]
struct ProblemDocument {
    #[serde(default)]
    activities: Option<Vec<String>>,
    consumption: Vec<Vec<f64>>,
    capacity: Vec<f64>,
    price: Vec<f64>,
    discount_price: Vec<f64>,
    breakpoint: Vec<f64>,
}

impl ProblemDocument {
    fn build_model(&self) -> Result<ProblemModel, ModelError> {
        ProblemModel::new(
            self.consumption.clone(),
            self.capacity.clone(),
            self.price.clone(),
            self.discount_price.clone(),
            self.breakpoint.clone(),
        )
    }

    fn activity_label(&self, j: usize) -> String {
        self.activities
            .as_ref()
            .and_then(|names| names.get(j).cloned())
            .unwrap_or_else(|| format!("activity {}", j + 1))
    }
}

fn load_document(file: &PathBuf) -> ProblemDocument {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error parsing {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            format,
            report,
        } => {
            let doc = load_document(&file);
            let model = match doc.build_model() {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Invalid problem: {}", e);
                    std::process::exit(1);
                }
            };

            let reformulation = Reformulation::new(&model);
            let solution = Solver::new().solve(reformulation.problem());

            match solution.status {
                SolutionStatus::Optimal => {
                    let allocation =
                        match AllocationReport::from_solution(&model, &reformulation, &solution) {
                            Ok(a) => a,
                            Err(e) => {
                                eprintln!("Evaluation error: {}", e);
                                std::process::exit(1);
                            }
                        };

                    if format == "json" {
                        match serde_json::to_string_pretty(&allocation) {
                            Ok(json) => println!("{}", json),
                            Err(e) => {
                                eprintln!("Error serializing report: {}", e);
                                std::process::exit(1);
                            }
                        }
                        return;
                    }

                    println!("Status: OPTIMAL");
                    println!("Total revenue: {:.2}", allocation.total_revenue);
                    println!();
                    println!("Allocation:");
                    for (j, figures) in allocation.activities.iter().enumerate() {
                        let avg = match figures.average_price {
                            Some(price) => format!("{:.4}", price),
                            None => "n/a".to_string(),
                        };
                        println!(
                            "  {:20} {:10.2} {:12.2} {:>10}",
                            doc.activity_label(j),
                            figures.level,
                            figures.revenue,
                            avg
                        );
                    }

                    if report {
                        println!();
                        println!("Analysis:");
                        println!();

                        if !solution.analysis.binding_constraints.is_empty() {
                            println!("Binding constraints:");
                            for name in &solution.analysis.binding_constraints {
                                println!("  - {}", name);
                            }
                            println!();
                        }

                        println!("Shadow prices:");
                        for sp in &solution.analysis.shadow_prices {
                            if sp.value.abs() > 0.001 {
                                println!("  {:30} {:10.4}", sp.constraint, sp.value);
                            }
                        }
                    }
                }
                SolutionStatus::Infeasible => {
                    println!("Status: INFEASIBLE");
                    println!("No allocation satisfies all resource capacities.");
                    std::process::exit(1);
                }
                SolutionStatus::Unbounded => {
                    println!("Status: UNBOUNDED");
                    println!("Revenue can grow without limit; check the consumption data.");
                    std::process::exit(1);
                }
                SolutionStatus::IterationLimitExceeded => {
                    println!("Status: ITERATION LIMIT EXCEEDED");
                    println!("The solver did not converge within its pivot budget.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let doc = load_document(&file);
            match doc.build_model() {
                Ok(model) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} activities", model.num_activities());
                    println!("  {} resources", model.num_resources());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
