extern crate env_logger;
extern crate rand;
extern crate serde_json;
extern crate wordgen;
use std::env;
use std::fs;
use std::process;
use wordgen::Config;

// usage: wordgen [config.json] [count]
fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.get(0) {
        Some(path) => load(path).unwrap_or_else(|e| fail(&e)),
        None => Config::toki_pona(),
    };
    let count = match args.get(1) {
        Some(n) => n
            .parse()
            .unwrap_or_else(|_| fail(&format!("not a word count: {}", n))),
        None => 10,
    };
    let grammar = match config.compile() {
        Ok(Some(g)) => g,
        Ok(None) => fail("no root rule is set"),
        Err(e) => fail(&e.to_string()),
    };
    let diagnostics = grammar.diagnostics();
    if let Some(cycle) = diagnostics.cycle {
        let mut path = cycle.clone();
        path.push(cycle[0].clone());
        fail(&format!("rules refer to each other in a cycle: {}", path.join(" -> ")));
    }
    eprintln!("{}", grammar);
    eprintln!("{} combinations", diagnostics.combinations);
    let batch = grammar.generate_batch(count, &mut rand::thread_rng());
    for w in &batch.words {
        println!("{}", w);
    }
    if let Some(e) = batch.error {
        fail(&e.to_string());
    }
}

fn load(path: &str) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path, e))
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(1)
}
