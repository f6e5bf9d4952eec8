use std::io::Write;

use gramma::{Definition, Engine};
use miette::{miette, IntoDiagnostic, Report, WrapErr};

fn main() -> miette::Result<()> {
    pretty_env_logger::init();

    miette::set_panic_hook();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        return Err(miette!("usage: gramma <grammar.json> [input]"));
    };
    let definition = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("can't read grammar from '{path}'"))?;
    let definition: Definition = serde_json::from_str(&definition)
        .into_diagnostic()
        .wrap_err_with(|| format!("'{path}' is not a grammar definition"))?;

    let engine = Engine::new(definition);
    engine.compile()?;

    if let Some(input) = args.next() {
        let source = std::fs::read_to_string(&input)
            .into_diagnostic()
            .wrap_err_with(|| format!("can't read input from '{input}'"))?;
        return parse(&engine, &source);
    }

    loop {
        print!(">>> ");
        std::io::stdout().flush().into_diagnostic()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).into_diagnostic()? == 0 {
            return Ok(());
        }

        if let Err(report) = parse(&engine, &line) {
            println!("{report:?}");
        }
    }
}

/// Print parse tree of `source` as JSON
fn parse(engine: &Engine, source: &str) -> miette::Result<()> {
    let tree = engine
        .parse_tree(source)
        .map_err(|err| Report::new(err).with_source_code(source.to_string()))?;
    println!("{}", serde_json::to_string_pretty(&tree).into_diagnostic()?);
    Ok(())
}
