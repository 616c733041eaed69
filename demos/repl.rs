use promptcomplete::{
    Corpus, CorpusSource, EngineConfig, JsonFileCorpus, JsonFileStore, MemoryCorpus, PromptEngine,
    Scope,
};
use std::{
    env,
    io::{self, Write},
};

const MODEL_FILE: &str = "ngrams.json";

fn main() -> io::Result<()> {
    env_logger::init();

    let config = match env::var("PROMPTCOMPLETE_CONFIG") {
        Ok(path) => EngineConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("Ignoring config {}: {}", path, e);
            EngineConfig::default()
        }),
        Err(_) => EngineConfig::default(),
    };

    let initial = match env::args().nth(1) {
        Some(path) => JsonFileCorpus::new(&path).get().unwrap_or_else(|e| {
            eprintln!("Could not read prompts from {}: {}", path, e);
            Corpus::default()
        }),
        None => Corpus::default_prompts(),
    };

    let engine = PromptEngine::new(config);
    let mut prompts = MemoryCorpus::new(initial);
    engine.attach(&mut prompts);

    let store = JsonFileStore::new(MODEL_FILE);
    engine.initialize(&store);

    println!(
        "Prompt completion REPL - {} prompts\n:add <text>, :train <text>, :q to quit",
        prompts.corpus().len()
    );
    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break; // EOF
        }
        let line = input.trim_end_matches(['\n', '\r']);
        if line.trim() == ":q" {
            break;
        }

        if let Some(text) = line.strip_prefix(":add ") {
            match prompts.add_prompt(Scope::Local, text) {
                Some(id) => println!("  added {}", id),
                None => println!("  nothing to add"),
            }
            continue;
        }
        if let Some(text) = line.strip_prefix(":train ") {
            engine.train(text);
            engine.persist(&store);
            continue;
        }

        for prompt in engine.search(line) {
            println!("  [{:?}] {}", prompt.scope, prompt.text);
        }
        for prediction in engine.predict(line) {
            println!("  ~ {} ({:.3})", prediction.text, prediction.probability);
        }
    }

    engine.persist(&store);
    Ok(())
}
