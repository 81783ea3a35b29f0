mod basic;
mod graphics;

struct Example {
    name: &'static str,
    run: fn(&[String]) -> anyhow::Result<()>,
}

const EXAMPLES: &[Example] = &[
    Example {
        name: "basic",
        run: basic::run,
    },
    Example {
        name: "graphics",
        run: graphics::run,
    },
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let example_name = std::env::args().nth(1).unwrap_or_else(|| {
        println!("Usage: cargo run <example_name> [colors...]");
        println!("Available examples:");
        for example in EXAMPLES {
            println!("  - {}", example.name);
        }
        std::process::exit(1);
    });

    let example = EXAMPLES
        .iter()
        .find(|example| example.name == example_name)
        .unwrap_or_else(|| {
            println!("Example '{}' not found", example_name);
            std::process::exit(1);
        });

    let args = std::env::args().skip(2).collect::<Vec<_>>();

    log::info!("Running example: {}", example.name);
    if let Err(err) = (example.run)(&args) {
        log::error!("Example '{}' failed: {err:#}", example.name);
        std::process::exit(1);
    }
}
