use colored::Colorize;
use vanille_core::session::DEFAULT_MODEL;
use vanille_interaction::supported_models::{SUPPORTED_MODELS, SYSTEM_MESSAGE_PROBABILITIES};

pub fn run() {
    println!("{}", "Supported models".bright_magenta().bold());
    for model in SUPPORTED_MODELS {
        if *model == DEFAULT_MODEL {
            println!("  {} {}", model.bright_cyan(), "(default)".bright_black());
        } else {
            println!("  {}", model);
        }
    }

    let presets: Vec<String> = SYSTEM_MESSAGE_PROBABILITIES
        .iter()
        .map(|p| p.to_string())
        .collect();
    println!();
    println!(
        "{} {}",
        "System message probabilities:".bright_magenta().bold(),
        presets.join(", ")
    );
}
