/// CLI tool for running parametric FEA studies
use parametric_fea::cantilever::CantileverSession;
use parametric_fea::study::{Strategy, StudyConfig, StudyRunner};
use std::env;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "generate" => generate_config(&args[2..]),
        "show" => show_study(&args[2..]),
        "run" => run_study(&args[2..]),
        _ => {
            println!("Unknown command: {}", command);
            print_usage();
        }
    }
}

fn print_usage() {
    println!("\nParametric FEA study runner\n");
    println!("Usage: cargo run --release --bin study_runner <command> [options]\n");
    println!("Commands:");
    println!("  generate    Write a sample study configuration file");
    println!("  show        List the variables and strategy of a study");
    println!("  run         Run a study against the built-in cantilever model\n");
    println!("Examples:");
    println!("  cargo run --release --bin study_runner generate cantilever.toml genetic");
    println!("  cargo run --release --bin study_runner show cantilever.toml");
    println!("  cargo run --release --bin study_runner run cantilever.toml\n");
}

fn generate_config(args: &[String]) {
    if args.is_empty() {
        println!("Error: please specify an output file name");
        println!("Usage: cargo run --bin study_runner generate <output_file.toml> [grid|genetic]");
        return;
    }

    let output_file = &args[0];
    let strategy = match args.get(1).map(String::as_str) {
        Some("genetic") => Strategy::Genetic,
        Some("grid") | None => Strategy::Grid,
        Some(other) => {
            println!("Error: unknown strategy '{}', expected grid or genetic", other);
            return;
        }
    };

    let config = StudyConfig::sample(
        "Cantilever Study".to_string(),
        "cantilever.fcstd".to_string(),
        strategy,
    );

    match config.to_file(output_file) {
        Ok(()) => {
            println!("✓ Study configuration generated: {}", output_file);
            println!("  {} variables, strategy {:?}", config.variables.len(), strategy);
        }
        Err(e) => println!("Error generating config: {}", e),
    }
}

fn show_study(args: &[String]) {
    if args.is_empty() {
        println!("Error: please specify a study configuration file");
        println!("Usage: cargo run --bin study_runner show <config_file.toml>");
        return;
    }

    match StudyConfig::from_file(&args[0]) {
        Ok(config) => {
            println!("\nStudy: {}", config.study_name);
            println!("Model: {}", config.model_path);
            println!("Strategy: {:?}", config.strategy);
            if config.strategy == Strategy::Genetic {
                println!(
                    "  population {}, generations {}, seed {}",
                    config.genetic.population_size, config.genetic.generations, config.genetic.seed
                );
            }
            println!("Variables:");
            for variable in &config.variables {
                println!(
                    "  {}.{}  [{} .. {}]  steps {}",
                    variable.object_name,
                    variable.constraint_name,
                    variable.min,
                    variable.max,
                    variable.steps
                );
            }
            println!("Outputs:");
            for output in &config.outputs {
                println!("  {:?}({})", output.reduction, output.field);
            }
            println!();
        }
        Err(e) => println!("Error loading config: {}", e),
    }
}

fn run_study(args: &[String]) {
    if args.is_empty() {
        println!("Error: please specify a study configuration file");
        println!("Usage: cargo run --bin study_runner run <config_file.toml>");
        return;
    }

    match StudyConfig::from_file(&args[0]) {
        Ok(config) => {
            let output_dir = format!("study_results/{}", config.study_name.replace(' ', "_"));
            let mut session = CantileverSession::open(&config.model_path);
            let runner = StudyRunner::new(config, output_dir);

            match runner.run(&mut session) {
                Ok(_) => println!("\n✓ Study '{}' completed\n", runner.config().study_name),
                Err(e) => println!("Error running study: {}\n", e),
            }
        }
        Err(e) => println!("Error loading config: {}", e),
    }
}
