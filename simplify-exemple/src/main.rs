use std::env;
use std::io::{self, Read};

use simplify_core::config::Settings;
use simplify_core::presenter::{display, Presenter, OUTPUT_LABEL};
use simplify_core::SimplificationRequest;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Settings come from $SIMPLIFY_CONFIG if set, built-in defaults otherwise.
    // The model is downloaded on the first simplification if it is missing
    let settings = Settings::load(None)?;
    let transformer = settings.transformer();

    // Text to simplify: command line arguments, or stdin when there are none
    let args: Vec<String> = env::args().skip(1).collect();
    let text = if args.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        args.join(" ")
    };

    // Every knob starts at its default:
    // length 0.95, levenshtein 0.75, word rank 0.75, vocabulary 10000
    let mut request = SimplificationRequest::new(text);

    // Knobs are validated before anything reaches the simplifier
    request.vocab_size = 40000;
    match transformer.transform(&request) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Rejected: {e}"),
    }
    request.vocab_size = 10000;

    request.length_ratio = 1.2;
    match request.validate() {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Rejected: {e}"),
    }
    request.length_ratio = 0.8;

    // The presenter memoises on the full request, so rendering the same
    // request twice only runs the simplifier once
    let mut presenter = Presenter::new(&transformer);
    let lines = presenter.render(&request)?.to_vec();
    presenter.render(&request)?;

    println!("### {OUTPUT_LABEL}");
    println!("{}", display(&lines));

    let (hits, misses) = presenter.cache().stats();
    println!("cache: {hits} hit(s), {misses} miss(es)");

    Ok(())
}
