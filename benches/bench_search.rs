use criterion::{Criterion, criterion_group, criterion_main};
use promptcomplete::{Corpus, Prompt, PromptEngine, Scope};

fn bench_search(c: &mut Criterion) {
    let verbs = ["explain", "summarize", "review", "rewrite", "translate", "debug"];
    let objects = ["this code", "the error", "my essay", "the approach", "this function"];
    let tails = ["in simple terms", "step by step", "briefly", "with examples"];

    let mut corpus = Corpus::default();
    for verb in verbs {
        for object in objects {
            for tail in tails {
                let scope = if tail.len() % 2 == 0 { Scope::Global } else { Scope::Local };
                let id = format!("{}{}", scope.id_prefix(), corpus.len() + 1);
                let prompt = Prompt::new(id, format!("{} {} {}", verb, object, tail), scope);
                match scope {
                    Scope::Global => corpus.global.push(prompt),
                    Scope::Local => corpus.local.push(prompt),
                }
            }
        }
    }

    let engine = PromptEngine::default();
    engine.rebuild(&corpus);

    c.bench_function("search_prefix", |b| {
        b.iter(|| {
            let _ = engine.search("review the");
        })
    });

    c.bench_function("search_fuzzy_fallback", |b| {
        b.iter(|| {
            let _ = engine.search("sumarize this cdoe");
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
