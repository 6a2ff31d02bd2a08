use clap::Args;
use serde::Serialize;
use shadowbox_core::{Combo, ComboMode, Config, Difficulty};

#[derive(Args)]
pub struct ComboArgs {
    /// easy, medium or hard (defaults to the configured difficulty)
    #[arg(long)]
    tier: Option<Difficulty>,
    /// How many combos to print
    #[arg(long, default_value = "5")]
    count: usize,
    /// library or procedural (defaults to the configured mode)
    #[arg(long)]
    mode: Option<ComboMode>,
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ComboLine {
    display: String,
    spoken: String,
    combo: Combo,
}

pub fn run(args: ComboArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let tier = args.tier.unwrap_or(config.workout.difficulty);
    let mode = args.mode.unwrap_or(config.workout.combo_mode);
    let mut generator = mode.generator(args.seed);

    let lines: Vec<ComboLine> = (0..args.count)
        .map(|_| {
            let combo = generator.next_combo(tier);
            ComboLine {
                display: combo.display_text(),
                spoken: combo.spoken_text(),
                combo,
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in &lines {
            println!("{}", line.display);
        }
    }
    Ok(())
}
